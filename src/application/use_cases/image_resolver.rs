use std::path::Path;

use tracing::debug;

/// Filename token for a county: lowercase, spaces replaced by underscores.
pub fn county_image_token(county_name: &str) -> String {
    county_name.replace(' ', "_").to_lowercase()
}

/// Find the first `.png` in `directory` whose lowercased name contains the
/// county token.
///
/// Entries are visited in directory iteration order, which the filesystem
/// decides. A missing or unreadable directory resolves to `None`.
pub async fn find_image_for_county(directory: &Path, county_name: &str) -> Option<String> {
    let target = county_image_token(county_name);

    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(err) => {
            debug!(error = %err, dir = %directory.display(), "Image directory not readable");
            return None;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                debug!(error = %err, dir = %directory.display(), "Image directory scan stopped");
                return None;
            }
        };

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let lowered = name.to_lowercase();
        if !lowered.ends_with(".png") || !lowered.contains(&target) {
            continue;
        }
        if entry.file_type().await.map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }
        return Some(name);
    }
}
