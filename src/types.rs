//! Core types shared across the pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Price type (using f64, as returned by the catalog)
pub type Price = f64;

/// Exchange rate: amount of target currency per unit of source currency
pub type Rate = f64;

/// One row of the input list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRequest {
    /// 1-based line number in the input file (header is line 1)
    pub line: u64,
    pub seller: String,
    pub title: String,
}

impl BookRequest {
    pub fn new(line: u64, seller: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            line,
            seller: seller.into(),
            title: title.into(),
        }
    }

    /// Human readable label used in reports
    pub fn label(&self) -> String {
        format!("{} {}", self.seller, self.title)
    }
}

/// Commerce metadata returned by a catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub seller_name: String,
    pub title: String,
    pub currency: String,
    pub price: Price,
    pub release_date: NaiveDate,
}

/// Converted price attached to an item once its rate is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub rate: Rate,
    pub priced_in_target: Price,
    pub table_no: String,
}

/// Catalog entry augmented with its converted price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    pub seller_name: String,
    pub title: String,
    pub currency: String,
    pub price: Price,
    pub release_date: NaiveDate,
    pub conversion: Option<Conversion>,
}

impl PricedItem {
    /// Attach a resolved rate; `priced_in_target` is always `price * rate`
    pub fn apply_rate(&mut self, rate: Rate, table_no: impl Into<String>) {
        self.conversion = Some(Conversion {
            rate,
            priced_in_target: self.price * rate,
            table_no: table_no.into(),
        });
    }

    pub fn is_converted(&self) -> bool {
        self.conversion.is_some()
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.seller_name, self.title)
    }
}

impl From<CatalogEntry> for PricedItem {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            seller_name: entry.seller_name,
            title: entry.title,
            currency: entry.currency,
            price: entry.price,
            release_date: entry.release_date,
            conversion: None,
        }
    }
}
