//! Error types for ebook-pricer

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for ebook-pricer
#[derive(Error, Debug)]
pub enum PricerError {
    // ========== Input ==========
    #[error("Input read error: {0}")]
    InputRead(String),

    #[error("Invalid data at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    // ========== Catalog ==========
    #[error("No ebook found for {seller} {title}")]
    CatalogNotFound { seller: String, title: String },

    #[error("Request for {seller} {title} failed with status code {status}")]
    CatalogRequestFailed {
        seller: String,
        title: String,
        status: u16,
    },

    // ========== Exchange rates ==========
    #[error("Cannot get exchange rate for {date}: rate source does not provide data before {floor}")]
    DateOutOfRange { date: NaiveDate, floor: NaiveDate },

    #[error("Cannot get {currency} exchange rate for {date} or up to {days_searched} days before")]
    RateUnavailable {
        currency: String,
        date: NaiveDate,
        days_searched: u32,
    },

    #[error("Rate request for {currency} on {date} failed with status code {status}")]
    RateRequestFailed {
        currency: String,
        date: NaiveDate,
        status: u16,
    },

    #[error("Rate cache read error: {0}")]
    CacheRead(String),

    #[error("Rate cache write error: {0}")]
    CacheWrite(String),

    // ========== Output ==========
    #[error("Output write error: {0}")]
    OutputWrite(String),

    // ========== Ambient ==========
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl PricerError {
    /// Errors that abort the whole run instead of being recorded per item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PricerError::InputRead(_)
                | PricerError::CacheRead(_)
                | PricerError::CacheWrite(_)
                | PricerError::OutputWrite(_)
                | PricerError::IoError(_)
                | PricerError::ConfigError(_)
        )
    }
}

impl From<reqwest::Error> for PricerError {
    fn from(e: reqwest::Error) -> Self {
        PricerError::Http(e.to_string())
    }
}

/// Result type alias for ebook-pricer operations
pub type Result<T> = std::result::Result<T, PricerError>;
