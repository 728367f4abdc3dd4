//! Deterministic stand-ins for the external services
//!
//! Every stub counts its calls so tests can assert how many requests a
//! resolution or a pipeline run issued.

#![allow(dead_code)]

use chrono::NaiveDate;
use ebook_pricer::catalog::CatalogSource;
use ebook_pricer::error::{PricerError, Result};
use ebook_pricer::fx::{RateQuote, RateSource};
use ebook_pricer::throttle::Throttle;
use ebook_pricer::types::CatalogEntry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Rate source answering 200 for configured days and 404 for every other day
#[derive(Default)]
pub struct StubRateSource {
    rates: HashMap<(String, NaiveDate), RateQuote>,
    requests: Mutex<Vec<(String, NaiveDate)>>,
}

impl StubRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: &str, date: NaiveDate, rate: f64, table_no: &str) -> Self {
        self.rates.insert(
            (currency.to_string(), date),
            RateQuote {
                rate,
                table_no: table_no.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_dates(&self) -> Vec<NaiveDate> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, date)| *date)
            .collect()
    }
}

impl RateSource for StubRateSource {
    async fn fetch_rate(&self, currency: &str, date: NaiveDate) -> Result<Option<RateQuote>> {
        self.requests
            .lock()
            .unwrap()
            .push((currency.to_string(), date));
        Ok(self.rates.get(&(currency.to_string(), date)).cloned())
    }

    fn name(&self) -> &str {
        "stub-rates"
    }
}

/// Catalog keyed by (seller, title); unknown titles are `CatalogNotFound`
#[derive(Default)]
pub struct StubCatalog {
    entries: HashMap<(String, String), CatalogEntry>,
    failing: HashMap<(String, String), u16>,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        seller: &str,
        title: &str,
        currency: &str,
        price: f64,
        release_date: NaiveDate,
    ) -> Self {
        self.entries.insert(
            (seller.to_string(), title.to_string()),
            CatalogEntry {
                seller_name: seller.to_string(),
                title: title.to_string(),
                currency: currency.to_string(),
                price,
                release_date,
            },
        );
        self
    }

    pub fn with_failure(mut self, seller: &str, title: &str, status: u16) -> Self {
        self.failing
            .insert((seller.to_string(), title.to_string()), status);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CatalogSource for StubCatalog {
    async fn search(&self, seller: &str, title: &str, _country: &str) -> Result<CatalogEntry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (seller.to_string(), title.to_string());

        if let Some(status) = self.failing.get(&key) {
            return Err(PricerError::CatalogRequestFailed {
                seller: seller.to_string(),
                title: title.to_string(),
                status: *status,
            });
        }

        self.entries
            .get(&key)
            .cloned()
            .ok_or_else(|| PricerError::CatalogNotFound {
                seller: seller.to_string(),
                title: title.to_string(),
            })
    }

    fn name(&self) -> &str {
        "stub-catalog"
    }
}

/// Throttle that only counts pauses
#[derive(Default)]
pub struct CountingThrottle {
    pauses: AtomicUsize,
}

impl CountingThrottle {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl Throttle for CountingThrottle {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}
