//! iTunes Search API catalog
//!
//! The API answers with `text/javascript`, so the body is read as text and
//! parsed as JSON explicitly.

use super::CatalogSource;
use crate::error::{PricerError, Result};
use crate::types::CatalogEntry;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    artist_name: String,
    track_name: String,
    currency: String,
    price: Option<f64>,
    release_date: String,
}

/// iTunes Search catalog (no API key required)
pub struct ItunesCatalog {
    client: Client,
    base_url: String,
    media: String,
}

impl ItunesCatalog {
    pub fn new(base_url: impl Into<String>, media: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PricerError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            media: media.into(),
        })
    }

    fn parse_body(seller: &str, title: &str, body: &str) -> Result<CatalogEntry> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|e| PricerError::ParseError(format!("Invalid catalog response: {}", e)))?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PricerError::CatalogNotFound {
                seller: seller.to_string(),
                title: title.to_string(),
            })?;

        let price = match first.price {
            Some(price) if price > 0.0 => price,
            Some(price) => {
                return Err(PricerError::ParseError(format!(
                    "Non-positive price {} for {} {}",
                    price, seller, title
                )))
            }
            None => {
                return Err(PricerError::ParseError(format!(
                    "Missing price for {} {}",
                    seller, title
                )))
            }
        };

        Ok(CatalogEntry {
            seller_name: first.artist_name,
            title: first.track_name,
            currency: first.currency,
            price,
            release_date: parse_release_date(&first.release_date)?,
        })
    }
}

/// Release dates come as `2020-01-15T08:00:00Z`; only the calendar day is kept
fn parse_release_date(raw: &str) -> Result<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| PricerError::ParseError(format!("Invalid release date: {}", raw)))
}

impl CatalogSource for ItunesCatalog {
    async fn search(&self, seller: &str, title: &str, country: &str) -> Result<CatalogEntry> {
        let term = format!("{} {}", seller, title);
        log::debug!("Searching catalog for '{}' in {}", term, country);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("term", term.as_str()),
                ("country", country),
                ("media", self.media.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PricerError::CatalogRequestFailed {
                seller: seller.to_string(),
                title: title.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        Self::parse_body(seller, title, &body)
    }

    fn name(&self) -> &str {
        "iTunes"
    }
}
