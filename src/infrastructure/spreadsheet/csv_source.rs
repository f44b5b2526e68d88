use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use super::{Cell, SheetData};
use crate::domain::error::{AppError, Result};

/// Read a delimited text file. The delimiter is picked from the header line.
pub fn read_csv_sheet(path: &Path) -> Result<SheetData> {
    let content = read_with_encoding_detection(path)?;
    parse_csv_content(&content)
}

pub fn parse_csv_content(content: &str) -> Result<SheetData> {
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(content.lines().next().unwrap_or(""));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 2, e))
        })?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(SheetData { headers, rows })
}

/// UTF-8 first, then Windows-1252 (what spreadsheet exports usually are).
fn read_with_encoding_detection(path: &Path) -> Result<String> {
    let buffer = fs::read(path)
        .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;

    match String::from_utf8(buffer) {
        Ok(content) => Ok(content),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

fn detect_delimiter(header_line: &str) -> u8 {
    // Reversed so that ties go to the earlier candidate.
    [b',', b';', b'\t', b'|']
        .into_iter()
        .rev()
        .max_by_key(|&delimiter| header_line.bytes().filter(|&b| b == delimiter).count())
        .filter(|&delimiter| header_line.as_bytes().contains(&delimiter))
        .unwrap_or(b',')
}
