use serde::{Deserialize, Serialize};

/// Column holding the display name of a county.
pub const COUNTY_COLUMN: &str = "County";
/// Column holding the "EVs vs superchargers" formula.
pub const EV_FORMULA_COLUMN: &str = "EVs_vs_SC_Formula";
/// Column holding the "adoption vs superchargers" formula.
pub const ADOPT_FORMULA_COLUMN: &str = "Adopt_vs_SC_Formula";
/// Optional column holding the current supercharger count.
pub const SUPERCHARGER_COUNT_COLUMN: &str = "Supercharger_Count";

/// Lookup key form of a county name: trimmed and lowercased.
pub fn normalize_county(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One county row of the formula sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRow {
    pub county: String,
    pub county_clean: String,
    /// `None` when the cell did not hold text.
    pub ev_formula: Option<String>,
    pub adopt_formula: Option<String>,
}

impl FormulaRow {
    pub fn new(county: String, ev_formula: Option<String>, adopt_formula: Option<String>) -> Self {
        let county_clean = normalize_county(&county);
        Self {
            county,
            county_clean,
            ev_formula,
            adopt_formula,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperchargerRow {
    pub county_clean: String,
    pub supercharger_count: f64,
}

impl SuperchargerRow {
    pub fn new(county: &str, supercharger_count: f64) -> Self {
        Self {
            county_clean: normalize_county(county),
            supercharger_count,
        }
    }
}

/// Both formulas evaluated at `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub x: f64,
    pub ev_y: Option<f64>,
    pub adopt_y: Option<f64>,
}
