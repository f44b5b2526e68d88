use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::{Cell, SheetData};
use crate::domain::error::{AppError, Result};

/// Read the first worksheet of an xlsx/xls/ods workbook. The first row is
/// the header.
pub fn read_workbook_sheet(path: &Path) -> Result<SheetData> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::ParseError(format!(
            "Failed to open workbook {}: {}",
            path.display(),
            e
        ))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ParseError(format!("No worksheet found in {}", path.display())))??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|cell| to_cell(cell).display_string().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(SheetData {
        headers,
        rows: rows.map(|row| row.iter().map(to_cell).collect()).collect(),
    })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        other => Cell::Other(other.to_string()),
    }
}
