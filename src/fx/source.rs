//! Historical exchange rate sources

use crate::error::{PricerError, Result};
use crate::types::Rate;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Rate published for a single day
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub rate: Rate,
    pub table_no: String,
}

/// Transport for the external rate API
pub trait RateSource: Send + Sync {
    /// Rate for `currency` published on exactly `date`
    ///
    /// `Ok(None)` means the source has no rate for that day (weekend, holiday).
    fn fetch_rate(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<RateQuote>>> + Send;

    /// Get the source name
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct NbpResponse {
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    no: String,
    mid: f64,
}

/// National Bank of Poland exchange rate API (PLN per unit of currency)
pub struct NbpRateSource {
    client: Client,
    base_url: String,
    table: String,
}

impl NbpRateSource {
    pub fn new(base_url: impl Into<String>, table: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PricerError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
        })
    }

    fn rate_url(&self, currency: &str, date: NaiveDate) -> String {
        format!(
            "{}/{}/{}/{}/",
            self.base_url,
            self.table,
            currency,
            date.format("%Y-%m-%d")
        )
    }

    fn parse_body(body: &str) -> Result<RateQuote> {
        let response: NbpResponse = serde_json::from_str(body)
            .map_err(|e| PricerError::ParseError(format!("Invalid rate response: {}", e)))?;

        let first = response
            .rates
            .into_iter()
            .next()
            .ok_or_else(|| PricerError::ParseError("Rate response has no rates".to_string()))?;

        Ok(RateQuote {
            rate: first.mid,
            table_no: first.no,
        })
    }
}

impl RateSource for NbpRateSource {
    async fn fetch_rate(&self, currency: &str, date: NaiveDate) -> Result<Option<RateQuote>> {
        let url = self.rate_url(currency, date);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("format", "json")])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                Self::parse_body(&body).map(Some)
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(PricerError::RateRequestFailed {
                currency: currency.to_string(),
                date,
                status: status.as_u16(),
            }),
        }
    }

    fn name(&self) -> &str {
        "NBP"
    }
}
