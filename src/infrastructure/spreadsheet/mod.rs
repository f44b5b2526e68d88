// ============================================================
// SPREADSHEET INFRASTRUCTURE LAYER
// ============================================================
// Loads the county formula sheet and the optional supercharger table
// from workbook (xlsx, xls, ods) or csv files.

mod csv_source;
mod workbook;

use std::path::Path;

use tracing::{debug, info};

use crate::application::use_cases::county_lookup::CountyTable;
use crate::domain::county::{
    FormulaRow, SuperchargerRow, ADOPT_FORMULA_COLUMN, COUNTY_COLUMN, EV_FORMULA_COLUMN,
    SUPERCHARGER_COUNT_COLUMN,
};
use crate::domain::error::{AppError, Result};

pub use csv_source::read_csv_sheet;
pub use workbook::read_workbook_sheet;

/// A cell value, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Booleans, dates, error values.
    Other(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn display_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Other(text) => text.clone(),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Header row plus data rows of the first sheet.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetData {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| AppError::ValidationError(format!("Missing required column '{}'", name)))
    }

    fn cell(row: &[Cell], idx: usize) -> &Cell {
        row.get(idx).unwrap_or(&EMPTY_CELL)
    }
}

/// Read the first sheet of `path`, choosing the reader by extension.
pub fn read_sheet(path: &Path) -> Result<SheetData> {
    if !path.exists() {
        return Err(AppError::NotFound(format!(
            "Cannot find data file: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => read_csv_sheet(path),
        _ => read_workbook_sheet(path),
    }
}

/// Build formula rows; blank county cells are skipped.
pub fn formula_rows(sheet: &SheetData) -> Result<Vec<FormulaRow>> {
    let county_idx = sheet.require_column(COUNTY_COLUMN)?;
    let ev_idx = sheet.require_column(EV_FORMULA_COLUMN)?;
    let adopt_idx = sheet.require_column(ADOPT_FORMULA_COLUMN)?;

    let mut rows = Vec::new();
    for (index, row) in sheet.rows.iter().enumerate() {
        let county = SheetData::cell(row, county_idx);
        if county.is_empty() {
            debug!(row = index + 2, "Skipping row without county");
            continue;
        }

        rows.push(FormulaRow::new(
            county.display_string(),
            SheetData::cell(row, ev_idx).as_text().map(str::to_string),
            SheetData::cell(row, adopt_idx).as_text().map(str::to_string),
        ));
    }

    Ok(rows)
}

/// Supercharger counts keyed by `County` (or `County_clean`). A sheet
/// without a `Supercharger_Count` column yields no rows.
pub fn supercharger_rows(sheet: &SheetData) -> Result<Vec<SuperchargerRow>> {
    let Some(count_idx) = sheet.column(SUPERCHARGER_COUNT_COLUMN) else {
        return Ok(Vec::new());
    };
    let county_idx = match sheet.column(COUNTY_COLUMN) {
        Some(idx) => idx,
        None => sheet.require_column("County_clean")?,
    };

    let mut rows = Vec::new();
    for (index, row) in sheet.rows.iter().enumerate() {
        let county = SheetData::cell(row, county_idx);
        if county.is_empty() {
            continue;
        }
        match SheetData::cell(row, count_idx).as_number() {
            Some(count) => rows.push(SuperchargerRow::new(&county.display_string(), count)),
            None => debug!(row = index + 2, "Skipping row without supercharger count"),
        }
    }

    Ok(rows)
}

/// Load everything the forecast needs. A missing formula sheet is fatal.
pub fn load_county_table(formula_path: &Path, supercharger_path: Option<&Path>) -> Result<CountyTable> {
    let formula_sheet = read_sheet(formula_path)?;
    let rows = formula_rows(&formula_sheet)?;

    // The dedicated table comes first so its counts win the first-match lookup.
    let mut superchargers = Vec::new();
    if let Some(path) = supercharger_path {
        let sheet = read_sheet(path)?;
        let counts = supercharger_rows(&sheet)?;
        if counts.is_empty() {
            return Err(AppError::ValidationError(format!(
                "No '{}' values found in {}",
                SUPERCHARGER_COUNT_COLUMN,
                path.display()
            )));
        }
        superchargers.extend(counts);
    }
    superchargers.extend(supercharger_rows(&formula_sheet)?);

    info!(
        counties = rows.len(),
        supercharger_counts = superchargers.len(),
        path = %formula_path.display(),
        "Loaded county formulas"
    );

    Ok(CountyTable::new(rows).with_superchargers(superchargers))
}
