pub mod assets;
pub mod flash;
pub mod page;

use crate::application::{ForecastOutcome, ForecastRejection, ForecastUseCase};
use actix_web::http::header::{self, ContentType};
use actix_web::{
    dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use chrono::Local;
use page::IndexView;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub forecast: Arc<ForecastUseCase>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub charts_dir: PathBuf,
    pub maps_dir: PathBuf,
    pub flash_cookie: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastForm {
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub superchargers: String,
}

/// JSON clients may send the count as a number or as the raw form text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SuperchargersValue {
    Number(f64),
    Text(String),
}

impl SuperchargersValue {
    fn as_input(&self) -> String {
        match self {
            SuperchargersValue::Number(value) => value.to_string(),
            SuperchargersValue::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub county: String,
    #[serde(default)]
    pub superchargers: Option<SuperchargersValue>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub counties: usize,
}

fn html_response(
    data: &HttpState,
    req: &HttpRequest,
    flashes: &[String],
    outcome: Option<&ForecastOutcome>,
) -> HttpResponse {
    let body = page::render_index(&IndexView { flashes, outcome });
    let mut response = HttpResponse::Ok();
    response.content_type(ContentType::html());
    if req.cookie(&data.flash_cookie).is_some() {
        response.cookie(flash::removal_cookie(&data.flash_cookie));
    }
    response.body(body)
}

#[get("/")]
async fn index(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    let flashes = flash::read(&req, &data.flash_cookie);
    html_response(&data, &req, &flashes, None)
}

#[post("/")]
async fn submit(
    data: web::Data<HttpState>,
    req: HttpRequest,
    form: Option<web::Form<ForecastForm>>,
) -> impl Responder {
    // A body that is not a urlencoded form reads as empty fields.
    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let mut flashes = flash::read(&req, &data.flash_cookie);

    match data
        .forecast
        .execute(&form.county, &form.superchargers)
        .await
    {
        Ok(outcome) => {
            add_log(
                &data.logs,
                "INFO",
                "Forecast",
                &format!("Rendered forecast for {}", outcome.county),
            );
            for warning in &outcome.warnings {
                add_log(&data.logs, "WARN", "Images", warning);
            }
            flashes.extend(outcome.warnings.iter().cloned());
            html_response(&data, &req, &flashes, Some(&outcome))
        }
        Err(rejection) => {
            add_log(&data.logs, "WARN", "Forecast", &rejection.to_string());
            flashes.push(rejection.to_string());
            HttpResponse::SeeOther()
                .insert_header((header::LOCATION, "/"))
                .cookie(flash::store_cookie(&data.flash_cookie, &flashes))
                .finish()
        }
    }
}

async fn serve_image(dir: &Path, filename: &str) -> HttpResponse {
    match assets::read_asset(dir, filename).await {
        Some((bytes, content_type)) => HttpResponse::Ok().content_type(content_type).body(bytes),
        None => HttpResponse::NotFound().finish(),
    }
}

#[get("/chart/{filename:.*}")]
async fn chart(data: web::Data<HttpState>, filename: web::Path<String>) -> impl Responder {
    serve_image(&data.charts_dir, &filename).await
}

#[get("/map/{filename:.*}")]
async fn map(data: web::Data<HttpState>, filename: web::Path<String>) -> impl Responder {
    serve_image(&data.maps_dir, &filename).await
}

#[post("/forecast")]
async fn api_forecast(
    data: web::Data<HttpState>,
    req: web::Json<ForecastRequest>,
) -> impl Responder {
    let superchargers = req
        .superchargers
        .as_ref()
        .map(SuperchargersValue::as_input)
        .unwrap_or_default();

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Forecast requested (county={} superchargers={})",
            req.county, superchargers
        ),
    );

    match data.forecast.execute(&req.county, &superchargers).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(rejection) => {
            add_log(
                &data.logs,
                "WARN",
                "HttpApi",
                &format!("Forecast rejected: {}", rejection),
            );
            let body = ErrorResponse {
                error: rejection.to_string(),
            };
            match rejection {
                ForecastRejection::CountyNotFound(_) => HttpResponse::NotFound().json(body),
                ForecastRejection::EvaluationFailed(_) => {
                    HttpResponse::UnprocessableEntity().json(body)
                }
                ForecastRejection::EmptyCounty | ForecastRejection::InvalidSuperchargers(_) => {
                    HttpResponse::BadRequest().json(body)
                }
            }
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(|e| e.into_inner());
    HttpResponse::Ok().json(&*logs)
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        counties: data.forecast.table().len(),
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(submit)
        .service(chart)
        .service(map)
        .service(health)
        .service(web::scope("/api").service(api_forecast).service(get_logs));
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        "DEBUG" => tracing::debug!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|e| e.into_inner());
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

pub fn start_server(state: HttpState, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((host, port))?
        .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::CountyTable;
    use crate::domain::county::{FormulaRow, SuperchargerRow};
    use actix_web::http::StatusCode;
    use actix_web::test;

    const FLASH: &str = "test_flash";

    fn state(images: &Path) -> HttpState {
        let table = CountyTable::new(vec![
            FormulaRow::new(
                "Los Angeles".to_string(),
                Some("y = 2*x + 1".to_string()),
                Some("y = x / 100".to_string()),
            ),
            FormulaRow::new(
                "Broken".to_string(),
                Some("y = 1/0".to_string()),
                Some("y = x".to_string()),
            ),
        ])
        .with_superchargers(vec![SuperchargerRow::new("Los Angeles", 12.0)]);

        let charts_dir = images.join("charts");
        let maps_dir = images.join("maps");
        std::fs::create_dir_all(&charts_dir).unwrap();
        std::fs::create_dir_all(&maps_dir).unwrap();
        std::fs::write(charts_dir.join("los_angeles_chart.png"), b"\x89PNG").unwrap();

        HttpState {
            forecast: Arc::new(ForecastUseCase::new(
                Arc::new(table),
                charts_dir.clone(),
                maps_dir.clone(),
            )),
            logs: Arc::new(Mutex::new(Vec::new())),
            charts_dir,
            maps_dir,
            flash_cookie: FLASH.to_string(),
        }
    }

    macro_rules! app {
        ($dir:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(state($dir)))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_index_renders_form() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<form method=\"post\" action=\"/\">"));
    }

    #[actix_web::test]
    async fn test_submit_renders_result() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::post()
            .uri("/")
            .set_form([("county", "  los angeles "), ("superchargers", "10")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<h2>Los Angeles</h2>"));
        assert!(body.contains("<dd>21.00</dd>"));
        assert!(body.contains("<dd>0.1000</dd>"));
        assert!(body.contains("src=\"/chart/los_angeles_chart.png\""));
        assert!(body.contains("No map image found for county: Los Angeles"));
    }

    #[actix_web::test]
    async fn test_submit_uses_known_supercharger_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::post()
            .uri("/")
            .set_form([("county", "Los Angeles"), ("superchargers", "")])
            .to_request();
        let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(body.contains("Current superchargers: 12"));
        assert!(body.contains("<dd>25.00</dd>"));
    }

    #[actix_web::test]
    async fn test_rejection_redirects_with_flash() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::post()
            .uri("/")
            .set_form([("county", "Atlantis"), ("superchargers", "3")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

        let cookie = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == FLASH)
            .unwrap()
            .into_owned();
        assert_eq!(
            flash::decode(cookie.value()),
            Some(vec!["County 'Atlantis' not found in Excel file.".to_string()])
        );

        let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
        let resp = test::call_service(&app, req).await;
        let cleared = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == FLASH)
            .unwrap()
            .into_owned();
        assert_eq!(cleared.value(), "");
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<li>County &#x27;Atlantis&#x27; not found in Excel file.</li>"));
    }

    #[actix_web::test]
    async fn test_rejection_messages() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let cases = [
            (("", "3"), "Please enter a county name."),
            (("Los Angeles", "ten"), "Superchargers must be a valid number."),
            (("Broken", "1"), "Could not evaluate formulas for this county."),
        ];
        for ((county, superchargers), expected) in cases {
            let req = test::TestRequest::post()
                .uri("/")
                .set_form([("county", county), ("superchargers", superchargers)])
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            let cookie = resp
                .response()
                .cookies()
                .find(|cookie| cookie.name() == FLASH)
                .unwrap()
                .into_owned();
            assert_eq!(flash::decode(cookie.value()), Some(vec![expected.to_string()]));
        }
    }

    #[actix_web::test]
    async fn test_submit_without_form_body_asks_for_county() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::post().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let cookie = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == FLASH)
            .unwrap()
            .into_owned();
        assert_eq!(
            flash::decode(cookie.value()),
            Some(vec!["Please enter a county name.".to_string()])
        );
    }

    #[actix_web::test]
    async fn test_serves_chart_and_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::get()
            .uri("/chart/los_angeles_chart.png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );

        let req = test::TestRequest::get()
            .uri("/chart/../maps/secret.png")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/map/missing.png").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_api_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::post()
            .uri("/api/forecast")
            .set_json(serde_json::json!({ "county": "los angeles", "superchargers": 2 }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["county"], "Los Angeles");
        assert_eq!(body["result"]["ev_y"], 5.0);
        assert_eq!(body["supercharger_count"], 12.0);

        let req = test::TestRequest::post()
            .uri("/api/forecast")
            .set_json(serde_json::json!({ "county": "Nowhere", "superchargers": "2" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "County 'Nowhere' not found in Excel file.");

        let req = test::TestRequest::post()
            .uri("/api/forecast")
            .set_json(serde_json::json!({ "county": "Broken", "superchargers": 1 }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[actix_web::test]
    async fn test_logs_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::post()
            .uri("/")
            .set_form([("county", ""), ("superchargers", "")])
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, "WARN");
        assert_eq!(logs[0].message, "Please enter a county name.");

        let req = test::TestRequest::get().uri("/health").to_request();
        let health_body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health_body["status"], "ok");
        assert_eq!(health_body["counties"], 2);
    }

    #[actix_web::test]
    async fn test_log_buffer_is_capped() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
