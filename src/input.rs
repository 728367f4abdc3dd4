//! Input list reader
//!
//! The input is a CSV file with a header row and two columns, author and title,
//! taken by position. Rows that do not have exactly two non-empty fields are
//! skipped and reported, they never stop the read.

use crate::error::{PricerError, Result};
use crate::types::BookRequest;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

/// Parsed input rows plus the warnings for rows that were skipped
#[derive(Debug, Default)]
pub struct InputBatch {
    pub requests: Vec<BookRequest>,
    pub warnings: Vec<PricerError>,
}

impl InputBatch {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Read the input list from `path`
///
/// A missing or unreadable file is fatal (`InputRead`).
pub fn read_input(path: &Path) -> Result<InputBatch> {
    if !path.exists() {
        return Err(PricerError::InputRead(format!(
            "File {} not found",
            path.display()
        )));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PricerError::InputRead(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = rdr
        .headers()
        .map_err(|e| PricerError::InputRead(format!("Failed to read header: {}", e)))?;
    if headers.is_empty() {
        return Err(PricerError::InputRead(format!(
            "File {} has no header row",
            path.display()
        )));
    }

    let mut batch = InputBatch::default();
    let mut record = StringRecord::new();
    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                match parse_row(line, &record) {
                    Ok(request) => batch.requests.push(request),
                    Err(warning) => {
                        log::warn!("{}", warning);
                        batch.warnings.push(warning);
                    }
                }
            }
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                return Err(PricerError::InputRead(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                let warning = PricerError::MalformedRow {
                    line,
                    reason: e.to_string(),
                };
                log::warn!("{}", warning);
                batch.warnings.push(warning);
            }
        }
    }

    log::info!(
        "Found {} ebooks in file {} ({} rows skipped)",
        batch.requests.len(),
        path.display(),
        batch.warnings.len()
    );

    Ok(batch)
}

fn parse_row(line: u64, record: &StringRecord) -> Result<BookRequest> {
    if record.len() != 2 {
        return Err(PricerError::MalformedRow {
            line,
            reason: format!("expected 2 columns, got {}: {:?}", record.len(), record),
        });
    }

    let seller = record[0].trim();
    let title = record[1].trim();
    if seller.is_empty() || title.is_empty() {
        return Err(PricerError::MalformedRow {
            line,
            reason: format!("empty author or title: {:?}", record),
        });
    }

    Ok(BookRequest::new(line, seller, title))
}
