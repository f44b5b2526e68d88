use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::ForecastUseCase;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::spreadsheet::load_county_table;
use crate::interfaces::http::{self, HttpState};

pub async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.log_filter);

    let supercharger_path = config.supercharger_path();
    let table = load_county_table(&config.formula_path(), supercharger_path.as_deref())
        .map_err(|err| {
            error!(error = %err, path = %config.formula_path, "Failed to load county formulas");
            err
        })?;

    let logs = Arc::new(Mutex::new(Vec::new()));
    let county_count = table.len();
    let forecast = Arc::new(ForecastUseCase::new(
        Arc::new(table),
        config.charts_dir(),
        config.maps_dir(),
    ));

    let state = HttpState {
        forecast,
        logs: logs.clone(),
        charts_dir: config.charts_dir(),
        maps_dir: config.maps_dir(),
        flash_cookie: config.flash_cookie.clone(),
    };

    let server = http::start_server(state, &config.host, config.port).map_err(|err| {
        error!(error = %err, host = %config.host, port = config.port, "Failed to bind HTTP server");
        err
    })?;

    http::add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "Loaded {} counties, serving on http://{}:{}",
            county_count, config.host, config.port
        ),
    );
    info!(charts = %config.charts_dir, maps = %config.maps_dir, "Image directories");

    server.await?;
    Ok(())
}
