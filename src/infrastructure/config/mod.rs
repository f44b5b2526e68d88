use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

pub const ENV_PREFIX: &str = "COUNTY_FORECAST_";
pub const CONFIG_PATH_ENV: &str = "COUNTY_FORECAST_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "county_forecast.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// Formula sheet (xlsx, xls, ods or csv).
    #[validate(length(min = 1))]
    pub formula_path: String,
    /// Optional table of current supercharger counts per county.
    #[serde(default)]
    pub supercharger_path: Option<String>,
    #[validate(length(min = 1))]
    pub charts_dir: String,
    #[validate(length(min = 1))]
    pub maps_dir: String,
    pub log_filter: String,
    #[validate(length(min = 1))]
    pub flash_cookie: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            formula_path: "static/data/County-level formula_cleaned.xlsx".to_string(),
            supercharger_path: None,
            charts_dir: "static/charts".to_string(),
            maps_dir: "static/maps".to_string(),
            log_filter: "info".to_string(),
            flash_cookie: "county_forecast_flash".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `COUNTY_FORECAST_*` variables.
    /// A `.env` file in the working directory is read first.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::from_figment(Self::figment(config_path))
    }

    pub fn figment(config_path: PathBuf) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|err| AppError::ConfigError(format!("Failed to load config: {}", err)))?;
        config
            .validate()
            .map_err(|err| AppError::ConfigError(format!("Invalid config: {}", err)))?;
        Ok(config)
    }

    pub fn formula_path(&self) -> PathBuf {
        PathBuf::from(&self.formula_path)
    }

    pub fn supercharger_path(&self) -> Option<PathBuf> {
        self.supercharger_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn charts_dir(&self) -> PathBuf {
        PathBuf::from(&self.charts_dir)
    }

    pub fn maps_dir(&self) -> PathBuf {
        PathBuf::from(&self.maps_dir)
    }
}
