use std::path::{Component, Path, PathBuf};

/// Join `filename` under `dir`, refusing anything that could leave it.
pub fn resolve_asset(dir: &Path, filename: &str) -> Option<PathBuf> {
    let relative = Path::new(filename);
    if filename.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(dir.join(relative))
}

pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Bytes and content type of a regular file under `dir`.
pub async fn read_asset(dir: &Path, filename: &str) -> Option<(Vec<u8>, &'static str)> {
    let path = resolve_asset(dir, filename)?;
    let metadata = tokio::fs::metadata(&path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    let bytes = tokio::fs::read(&path).await.ok()?;
    Some((bytes, content_type(&path)))
}
