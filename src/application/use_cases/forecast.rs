use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::application::use_cases::county_lookup::CountyTable;
use crate::application::use_cases::image_resolver::find_image_for_county;
use crate::domain::county::EvaluationResult;
use crate::domain::formula::try_evaluate_formula;

/// Why a submission was turned away. Nothing is rendered for the county.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastRejection {
    EmptyCounty,
    CountyNotFound(String),
    InvalidSuperchargers(String),
    EvaluationFailed(String),
}

impl fmt::Display for ForecastRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastRejection::EmptyCounty => write!(f, "Please enter a county name."),
            ForecastRejection::CountyNotFound(input) => {
                write!(f, "County '{}' not found in Excel file.", input)
            }
            ForecastRejection::InvalidSuperchargers(_) => {
                write!(f, "Superchargers must be a valid number.")
            }
            ForecastRejection::EvaluationFailed(_) => {
                write!(f, "Could not evaluate formulas for this county.")
            }
        }
    }
}

impl std::error::Error for ForecastRejection {}

/// Everything the result page shows for one county.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub county: String,
    pub result: Option<EvaluationResult>,
    pub supercharger_count: Option<f64>,
    pub chart_filename: Option<String>,
    pub map_filename: Option<String>,
    /// Non-fatal notices, e.g. a missing chart image.
    pub warnings: Vec<String>,
}

pub struct ForecastUseCase {
    table: Arc<CountyTable>,
    charts_dir: PathBuf,
    maps_dir: PathBuf,
}

impl ForecastUseCase {
    pub fn new(table: Arc<CountyTable>, charts_dir: PathBuf, maps_dir: PathBuf) -> Self {
        Self {
            table,
            charts_dir,
            maps_dir,
        }
    }

    pub fn table(&self) -> &CountyTable {
        &self.table
    }

    pub async fn execute(
        &self,
        county_input: &str,
        superchargers_input: &str,
    ) -> Result<ForecastOutcome, ForecastRejection> {
        let county_input = county_input.trim();
        let superchargers_input = superchargers_input.trim();

        if county_input.is_empty() {
            return Err(ForecastRejection::EmptyCounty);
        }

        let row = self
            .table
            .find(county_input)
            .ok_or_else(|| ForecastRejection::CountyNotFound(county_input.to_string()))?;
        let county = row.county.clone();
        let supercharger_count = self.table.supercharger_count(county_input);

        let x = if superchargers_input.is_empty() {
            supercharger_count
        } else {
            let parsed = parse_count(superchargers_input).ok_or_else(|| {
                ForecastRejection::InvalidSuperchargers(superchargers_input.to_string())
            })?;
            Some(parsed)
        };

        let result = match x {
            Some(x) => {
                let ev_y = try_evaluate_formula(row.ev_formula.as_deref(), x);
                let adopt_y = try_evaluate_formula(row.adopt_formula.as_deref(), x);
                match (ev_y, adopt_y) {
                    (Ok(ev_y), Ok(adopt_y)) => Some(EvaluationResult {
                        x,
                        ev_y: Some(ev_y),
                        adopt_y: Some(adopt_y),
                    }),
                    (ev_y, adopt_y) => {
                        warn!(
                            county = %county,
                            x,
                            ev_error = ?ev_y.err(),
                            adopt_error = ?adopt_y.err(),
                            "Formula evaluation failed"
                        );
                        return Err(ForecastRejection::EvaluationFailed(county));
                    }
                }
            }
            None => None,
        };

        let chart_filename = find_image_for_county(&self.charts_dir, &county).await;
        let map_filename = find_image_for_county(&self.maps_dir, &county).await;

        let mut warnings = Vec::new();
        if chart_filename.is_none() {
            warnings.push(format!("No chart image found for county: {}", county));
        }
        if map_filename.is_none() {
            warnings.push(format!("No map image found for county: {}", county));
        }

        info!(
            county = %county,
            evaluated = result.is_some(),
            chart = chart_filename.is_some(),
            map = map_filename.is_some(),
            "Forecast rendered"
        );

        Ok(ForecastOutcome {
            county,
            result,
            supercharger_count,
            chart_filename,
            map_filename,
            warnings,
        })
    }
}

/// Parse a typed number. `_` is accepted only between two digits, as in `1_000`.
fn parse_count(input: &str) -> Option<f64> {
    let chars: Vec<char> = input.chars().collect();
    let mut cleaned = String::with_capacity(input.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).map_or(false, |next| next.is_ascii_digit());
            if !between_digits {
                return None;
            }
            continue;
        }
        cleaned.push(c);
    }
    cleaned.parse().ok()
}
