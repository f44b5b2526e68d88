//! One-shot user messages carried across a redirect in a cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;

/// Pending messages, oldest first. A missing or tampered cookie reads as
/// no messages.
pub fn read(req: &HttpRequest, cookie_name: &str) -> Vec<String> {
    req.cookie(cookie_name)
        .and_then(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

pub fn encode(messages: &[String]) -> String {
    let json = serde_json::to_vec(messages).unwrap_or_default();
    BASE64_URL_SAFE_NO_PAD.encode(json)
}

pub fn decode(value: &str) -> Option<Vec<String>> {
    let bytes = BASE64_URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn store_cookie(cookie_name: &str, messages: &[String]) -> Cookie<'static> {
    Cookie::build(cookie_name.to_string(), encode(messages))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn removal_cookie(cookie_name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build(cookie_name.to_string(), "")
        .path("/")
        .finish();
    cookie.make_removal();
    cookie
}
