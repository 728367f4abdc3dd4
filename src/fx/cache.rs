//! Persisted exchange rate cache
//!
//! An append-only CSV file with one row per resolved (date, currency) pair:
//!
//! ```text
//! date,currency,rate,tableNo
//! 2020-01-15,USD,3.7,010/A/NBP/2020
//! ```
//!
//! The whole file is read once at startup. Lookups are a linear scan over the
//! in-memory rows in file order, so duplicate rows are tolerated and the first
//! one wins. Every append is written through to disk before returning.

use crate::error::{PricerError, Result};
use crate::types::Rate;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER: [&str; 4] = ["date", "currency", "rate", "tableNo"];

/// One published exchange rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub currency: String,
    pub rate: Rate,
    #[serde(rename = "tableNo")]
    pub table_no: String,
}

impl RateRecord {
    pub fn new(
        date: NaiveDate,
        currency: impl Into<String>,
        rate: Rate,
        table_no: impl Into<String>,
    ) -> Self {
        Self {
            date,
            currency: currency.into(),
            rate,
            table_no: table_no.into(),
        }
    }
}

/// In-memory rate store backed by an optional CSV file
#[derive(Debug, Clone, Default)]
pub struct RateCache {
    records: Vec<RateRecord>,
    path: Option<PathBuf>,
}

impl RateCache {
    /// Cache with no backing file
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load every record from `path`, creating the file with a header if absent
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // a zero-length file has no header yet
        let is_empty_file = fs::metadata(path)
            .map(|m| m.is_file() && m.len() == 0)
            .unwrap_or(false);
        if !path.exists() || is_empty_file {
            Self::create_store(path)?;
            log::info!("Created empty rate cache at {}", path.display());
            return Ok(Self {
                records: Vec::new(),
                path: Some(path.to_path_buf()),
            });
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                PricerError::CacheRead(format!("Failed to open {}: {}", path.display(), e))
            })?;

        let mut records = Vec::new();
        for (idx, result) in rdr.deserialize::<RateRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(e) if e.is_io_error() => {
                    return Err(PricerError::CacheRead(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    )));
                }
                Err(e) => {
                    // header is line 1
                    log::warn!(
                        "Skipping malformed rate cache row {} in {}: {}",
                        idx + 2,
                        path.display(),
                        e
                    );
                }
            }
        }

        log::debug!("Loaded {} cached rates from {}", records.len(), path.display());

        Ok(Self {
            records,
            path: Some(path.to_path_buf()),
        })
    }

    fn create_store(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    PricerError::CacheWrite(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut wtr = WriterBuilder::new().from_path(path).map_err(|e| {
            PricerError::CacheWrite(format!("Failed to create {}: {}", path.display(), e))
        })?;
        wtr.write_record(HEADER)
            .and_then(|_| wtr.flush().map_err(csv::Error::from))
            .map_err(|e| {
                PricerError::CacheWrite(format!("Failed to write {}: {}", path.display(), e))
            })
    }

    /// First record matching both date and currency
    pub fn lookup(&self, date: NaiveDate, currency: &str) -> Option<&RateRecord> {
        self.records
            .iter()
            .find(|r| r.date == date && r.currency == currency)
    }

    /// Add a record and persist it immediately
    pub fn append(&mut self, record: RateRecord) -> Result<()> {
        if !(record.rate > 0.0) {
            return Err(PricerError::DataError(format!(
                "Exchange rate must be positive, got: {}",
                record.rate
            )));
        }

        if let Some(path) = &self.path {
            Self::append_row(path, &record)?;
        }

        log::debug!(
            "Cached {} rate {} for {} ({})",
            record.currency,
            record.rate,
            record.date,
            record.table_no
        );
        self.records.push(record);
        Ok(())
    }

    fn append_row(path: &Path, record: &RateRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                PricerError::CacheWrite(format!("Failed to open {}: {}", path.display(), e))
            })?;

        // a hand-edited store may lack the final newline
        Self::terminate_last_row(&mut file).map_err(|e| {
            PricerError::CacheWrite(format!("Failed to write {}: {}", path.display(), e))
        })?;

        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.serialize(record)
            .and_then(|_| wtr.flush().map_err(csv::Error::from))
            .map_err(|e| {
                PricerError::CacheWrite(format!("Failed to write {}: {}", path.display(), e))
            })
    }

    fn terminate_last_row(file: &mut File) -> io::Result<()> {
        if file.metadata()?.len() == 0 {
            return Ok(());
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_creates_store_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates").join("exchange_rates.csv");

        let cache = RateCache::load(&path).unwrap();

        assert!(cache.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "date,currency,rate,tableNo\n");
    }

    #[test]
    fn test_load_empty_file_writes_header() {
        let file = NamedTempFile::new().unwrap();

        let cache = RateCache::load(file.path()).unwrap();

        assert!(cache.is_empty());
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "date,currency,rate,tableNo\n"
        );
    }

    #[test]
    fn test_load_existing_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "date,currency,rate,tableNo\n\
             2020-01-15,USD,3.7,010/A/NBP/2020\n\
             2020-01-15,EUR,4.23,010/A/NBP/2020"
        )
        .unwrap();
        file.flush().unwrap();

        let cache = RateCache::load(file.path()).unwrap();

        assert_eq!(cache.len(), 2);
        let eur = cache.lookup(date(2020, 1, 15), "EUR").unwrap();
        assert_eq!(eur.rate, 4.23);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "date,currency,rate,tableNo\n\
             not-a-date,USD,3.7,010/A/NBP/2020\n\
             2020-01-16,USD,3.71,011/A/NBP/2020"
        )
        .unwrap();
        file.flush().unwrap();

        let cache = RateCache::load(file.path()).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(date(2020, 1, 16), "USD").is_some());
    }

    #[test]
    fn test_duplicates_first_match_wins() {
        let mut cache = RateCache::in_memory();
        cache
            .append(RateRecord::new(date(2020, 1, 15), "USD", 3.70, "first"))
            .unwrap();
        cache
            .append(RateRecord::new(date(2020, 1, 15), "USD", 3.90, "second"))
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup(date(2020, 1, 15), "USD").unwrap().table_no, "first");
    }

    #[test]
    fn test_lookup_requires_both_fields() {
        let mut cache = RateCache::in_memory();
        cache
            .append(RateRecord::new(date(2020, 1, 15), "USD", 3.70, "010/A/NBP/2020"))
            .unwrap();

        assert!(cache.lookup(date(2020, 1, 14), "USD").is_none());
        assert!(cache.lookup(date(2020, 1, 15), "EUR").is_none());
    }

    #[test]
    fn test_append_persists_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exchange_rates.csv");

        let mut cache = RateCache::load(&path).unwrap();
        cache
            .append(RateRecord::new(date(2020, 1, 15), "USD", 3.7, "010/A/NBP/2020"))
            .unwrap();

        let reloaded = RateCache::load(&path).unwrap();
        assert_eq!(reloaded.records(), cache.records());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,currency,rate,tableNo\n2020-01-15,USD,3.7,010/A/NBP/2020\n"
        );
    }

    #[test]
    fn test_append_after_row_without_newline() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "date,currency,rate,tableNo\n2020-01-15,USD,3.7,010/A/NBP/2020"
        )
        .unwrap();
        file.flush().unwrap();

        let mut cache = RateCache::load(file.path()).unwrap();
        assert_eq!(cache.len(), 1);
        cache
            .append(RateRecord::new(date(2020, 1, 16), "EUR", 4.2, "011/A/NBP/2020"))
            .unwrap();

        let reloaded = RateCache::load(file.path()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records(), cache.records());
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "date,currency,rate,tableNo\n\
             2020-01-15,USD,3.7,010/A/NBP/2020\n\
             2020-01-16,EUR,4.2,011/A/NBP/2020\n"
        );
    }

    #[test]
    fn test_unreadable_store_is_read_error() {
        let dir = tempdir().unwrap();

        // a directory exists but cannot be opened as a CSV file
        let result = RateCache::load(dir.path());
        assert!(matches!(result, Err(PricerError::CacheRead(_))));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let mut cache = RateCache::in_memory();

        let result = cache.append(RateRecord::new(date(2020, 1, 15), "USD", 0.0, "x"));
        assert!(result.is_err());

        let result = cache.append(RateRecord::new(date(2020, 1, 15), "USD", -1.0, "x"));
        assert!(result.is_err());

        assert!(cache.is_empty());
    }
}
