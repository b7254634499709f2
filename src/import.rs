//! Spreadsheet import: turns a CSV export of the market sheet into dataset
//! records.
//!
//! The sheet carries a few summary rows above the real header, uses
//! `DD/MM/YYYY` dates, and leaves spreadsheet error markers in cells that
//! could not be computed.

use crate::record::{FieldValue, Record, DATE_FIELD};
use std::fmt;
use std::io::{Read, Write};

/// Rows scanned when looking for the header row.
const HEADER_SEARCH_ROWS: usize = 5;

/// Spreadsheet error markers that are imported as null.
const ERROR_MARKERS: [&str; 3] = ["#DIV/0!", "#N/A", "#REF!"];

/// Errors raised while importing a sheet export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The export contains no rows at all
    Empty,
    /// Malformed CSV input
    Csv(String),
    /// Failed to write the JSON output
    Output(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Empty => write!(f, "No data found in sheet"),
            ImportError::Csv(msg) => write!(f, "CSV error: {}", msg),
            ImportError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err.to_string())
    }
}

/// Index of the header row: the first of the leading rows whose first cell
/// mentions a date or whose second cell is the marketing-year marker `MY`.
/// Defaults to the first row.
pub fn find_header_row(rows: &[Vec<String>]) -> usize {
    rows.iter()
        .take(HEADER_SEARCH_ROWS)
        .position(|row| {
            let first_is_date = row
                .first()
                .map(|cell| cell.to_lowercase().contains("date"))
                .unwrap_or(false);
            let second_is_my = row.get(1).map(|cell| cell == "MY").unwrap_or(false);
            first_is_date || second_is_my
        })
        .unwrap_or(0)
}

/// Converts a sheet date `DD/MM/YYYY` (day and month may be single digits)
/// to ISO `YYYY-MM-DD`. Anything else is returned unchanged.
pub fn convert_sheet_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return raw.to_string();
    }
    format!("{}-{:0>2}-{:0>2}", parts[2], parts[1], parts[0])
}

/// Matches an optional minus sign, digits, and an optional fractional part.
fn looks_numeric(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// Cleans one cell according to its column.
pub fn clean_cell(header: &str, raw: &str) -> FieldValue {
    if raw.is_empty() {
        return FieldValue::Null;
    }
    if ERROR_MARKERS.iter().any(|marker| raw.contains(marker)) {
        return FieldValue::Null;
    }
    if header == DATE_FIELD && raw.contains('/') {
        return FieldValue::Text(convert_sheet_date(raw));
    }

    let trimmed = raw.trim();
    if !trimmed.is_empty() && looks_numeric(trimmed) {
        if let Ok(number) = trimmed.parse::<f64>() {
            return FieldValue::Number(number);
        }
    }

    FieldValue::Text(raw.to_string())
}

/// Converts raw sheet rows into records. Rows without a `Date` are dropped
/// and record order follows the sheet.
pub fn rows_to_records(mut rows: Vec<Vec<String>>) -> Result<Vec<Record>, ImportError> {
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }

    let header_index = find_header_row(&rows);
    let data_rows = rows.split_off(header_index + 1);
    let mut headers = rows.swap_remove(header_index);

    match headers.first_mut() {
        Some(first) if first.trim().is_empty() => {
            log::info!("Empty first column header renamed to {}", DATE_FIELD);
            *first = DATE_FIELD.to_string();
        }
        None => headers.push(DATE_FIELD.to_string()),
        _ => {}
    }

    log::info!(
        "Using row {} as headers ({} columns)",
        header_index + 1,
        headers.len()
    );

    let records: Vec<Record> = data_rows
        .iter()
        .filter_map(|row| {
            let mut record = Record::new();
            for (index, header) in headers.iter().enumerate() {
                if header.trim().is_empty() {
                    continue;
                }
                let raw = row.get(index).map(String::as_str).unwrap_or("");
                record.insert(header.clone(), clean_cell(header, raw));
            }

            match record.get(DATE_FIELD) {
                Some(date) if !date.is_null() => Some(record),
                _ => None,
            }
        })
        .collect();

    log::info!("Converted {} records", records.len());
    Ok(records)
}

/// Reads a CSV sheet export into records.
pub fn import_csv<R: Read>(reader: R) -> Result<Vec<Record>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        rows.push(row.iter().map(str::to_string).collect());
    }

    rows_to_records(rows)
}

/// Writes records as the pretty-printed JSON array the dataset loader reads.
pub fn write_json<W: Write>(records: &[Record], writer: W) -> Result<(), ImportError> {
    serde_json::to_writer_pretty(writer, records).map_err(|e| ImportError::Output(e.to_string()))
}
