//! CSV column tables.
//!
//! Every command reads its data as named numeric columns: a header row, then
//! one `f64` per cell. Empty cells and `nan` (any case) read as NaN so gaps in
//! measured data survive the round trip. Short rows are padded with NaN; rows
//! with more cells than the header are an error.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::AppError;

/// Named, column-major numeric data.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ColumnTable {
    /// Build a table. Columns may differ in length; shorter ones are written
    /// with empty trailing cells.
    pub fn new(headers: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, AppError> {
        if headers.len() != columns.len() {
            return Err(AppError::new(
                2,
                format!("{} headers for {} columns", headers.len(), columns.len()),
            ));
        }
        Ok(Self { headers, columns })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn index_of(&self, name: &str) -> Result<usize, AppError> {
        let wanted = normalize_header_name(name);
        self.headers
            .iter()
            .position(|h| *h == wanted)
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!("Missing column '{name}' (have: {})", self.headers.join(", ")),
                )
            })
    }

    pub fn column(&self, name: &str) -> Result<&[f64], AppError> {
        Ok(&self.columns[self.index_of(name)?])
    }

    /// Parse CSV from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
            .iter()
            .map(normalize_header_name)
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(AppError::new(2, "CSV has no header row"));
        }

        let mut seen = HashMap::new();
        for (idx, h) in headers.iter().enumerate() {
            if let Some(prev) = seen.insert(h.as_str(), idx) {
                return Err(AppError::new(
                    2,
                    format!("Duplicate column '{h}' (positions {prev} and {idx})"),
                ));
            }
        }

        let mut columns = vec![Vec::new(); headers.len()];
        for (idx, result) in reader.records().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;
            if record.len() > headers.len() {
                return Err(AppError::new(
                    2,
                    format!("Line {line} has {} cells, header has {}", record.len(), headers.len()),
                ));
            }
            for (c, column) in columns.iter_mut().enumerate() {
                let cell = record.get(c).unwrap_or("");
                let value = parse_cell(cell).ok_or_else(|| {
                    AppError::new(
                        2,
                        format!("Line {line}, column '{}': '{cell}' is not a number", headers[c]),
                    )
                })?;
                column.push(value);
            }
        }
        debug!(columns = headers.len(), rows = columns.first().map(Vec::len).unwrap_or(0), "read table");

        Ok(Self { headers, columns })
    }

    pub fn read_csv(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
        Self::from_reader(file)
    }

    /// Write the table as CSV.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), AppError> {
        let err = |e: csv::Error| AppError::new(2, format!("Failed to write CSV: {e}"));
        let mut w = csv::Writer::from_writer(writer);
        w.write_record(&self.headers).map_err(err)?;
        for i in 0..self.rows() {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.get(i).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            w.write_record(&row).map_err(err)?;
        }
        w.flush()
            .map_err(|e| AppError::new(2, format!("Failed to write CSV: {e}")))
    }

    /// Write to `path`, or stdout when `None`.
    pub fn write_csv(&self, path: Option<&Path>) -> Result<(), AppError> {
        match path {
            Some(p) => {
                let file = File::create(p)
                    .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", p.display())))?;
                self.to_writer(file)
            }
            None => self.to_writer(std::io::stdout().lock()),
        }
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}
