//! Exchange rate resolution with cache and fallback-day search
//!
//! Rate sources do not publish on weekends or holidays, so a miss on the
//! requested date walks backwards one calendar day at a time until a rate is
//! found or the fallback window is exhausted. Every candidate date is checked
//! against the cache before the source is queried.
//!
//! A rate found on an earlier day is cached under that earlier day. A later
//! request for the same original date therefore re-runs the walk, but stops at
//! the cached day without querying the source again. Set
//! [`ResolverPolicy::alias_requested_date`] to also cache it under the
//! requested date.

use super::cache::{RateCache, RateRecord};
use super::source::{RateQuote, RateSource};
use crate::config::Config;
use crate::error::{PricerError, Result};
use crate::throttle::Throttle;
use crate::types::Rate;
use chrono::{Days, NaiveDate};

/// Table number reported for identity conversions
pub const IDENTITY_TABLE_NO: &str = "-";

/// Fixed parameters of the search
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverPolicy {
    /// Currency all rates are quoted in
    pub target_currency: String,
    /// Earliest date the source has data for
    pub historical_floor: NaiveDate,
    /// Days searched per resolution, the requested date included
    pub max_fallback_days: u32,
    pub alias_requested_date: bool,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ResolverPolicy {
    fn from(config: &Config) -> Self {
        Self {
            target_currency: config.target_currency.clone(),
            historical_floor: config.historical_floor,
            max_fallback_days: config.max_fallback_days,
            alias_requested_date: config.alias_requested_date,
        }
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub rate: Rate,
    pub table_no: String,
    /// Day the rate was published for
    pub effective_date: NaiveDate,
    /// Calendar days between the requested and the effective date
    pub days_back: u32,
}

impl ResolvedRate {
    fn from_record(record: &RateRecord, requested: NaiveDate) -> Self {
        Self {
            rate: record.rate,
            table_no: record.table_no.clone(),
            effective_date: record.date,
            days_back: (requested - record.date).num_days().max(0) as u32,
        }
    }
}

/// Resolves (currency, date) pairs to rates, owning the rate cache
pub struct RateResolver<S, T> {
    source: S,
    throttle: T,
    cache: RateCache,
    policy: ResolverPolicy,
}

impl<S: RateSource, T: Throttle> RateResolver<S, T> {
    pub fn new(source: S, throttle: T, cache: RateCache, policy: ResolverPolicy) -> Self {
        Self {
            source,
            throttle,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_cache(self) -> RateCache {
        self.cache
    }

    /// Resolve the rate for `currency` on `date`
    pub async fn resolve(&mut self, currency: &str, date: NaiveDate) -> Result<ResolvedRate> {
        if date < self.policy.historical_floor {
            return Err(PricerError::DateOutOfRange {
                date,
                floor: self.policy.historical_floor,
            });
        }

        if currency.eq_ignore_ascii_case(&self.policy.target_currency) {
            return Ok(ResolvedRate {
                rate: 1.0,
                table_no: IDENTITY_TABLE_NO.to_string(),
                effective_date: date,
                days_back: 0,
            });
        }

        if let Some(record) = self.cache.lookup(date, currency) {
            log::debug!("Cache hit for {} on {}", currency, date);
            return Ok(ResolvedRate::from_record(record, date));
        }

        let mut days_searched = 0;
        for offset in 0..self.policy.max_fallback_days {
            let candidate = match date.checked_sub_days(Days::new(u64::from(offset))) {
                Some(d) if d >= self.policy.historical_floor => d,
                _ => break,
            };
            days_searched += 1;

            // the requested date was already checked above
            if offset > 0 {
                if let Some(record) = self.cache.lookup(candidate, currency) {
                    log::debug!(
                        "Cache hit for {} on {} ({} days before {})",
                        currency,
                        candidate,
                        offset,
                        date
                    );
                    let resolved = ResolvedRate::from_record(record, date);
                    self.alias(currency, date, &resolved)?;
                    return Ok(resolved);
                }
            }

            if let Some(quote) = self.query(currency, candidate).await {
                if offset > 0 {
                    log::info!(
                        "No {} rate on {}, using {} ({} days earlier)",
                        currency,
                        date,
                        candidate,
                        offset
                    );
                }
                self.cache.append(RateRecord::new(
                    candidate,
                    currency,
                    quote.rate,
                    quote.table_no.clone(),
                ))?;

                let resolved = ResolvedRate {
                    rate: quote.rate,
                    table_no: quote.table_no,
                    effective_date: candidate,
                    days_back: offset,
                };
                self.alias(currency, date, &resolved)?;
                return Ok(resolved);
            }
        }

        Err(PricerError::RateUnavailable {
            currency: currency.to_string(),
            date,
            days_searched,
        })
    }

    /// One source request followed by the throttle pause
    ///
    /// Anything other than a rate counts as a miss for that day.
    async fn query(&self, currency: &str, date: NaiveDate) -> Option<RateQuote> {
        let result = self.source.fetch_rate(currency, date).await;
        self.throttle.pause().await;

        match result {
            Ok(Some(quote)) if !(quote.rate.is_finite() && quote.rate > 0.0) => {
                log::warn!(
                    "{} returned invalid {} rate {} for {}",
                    self.source.name(),
                    currency,
                    quote.rate,
                    date
                );
                None
            }
            Ok(quote) => quote,
            Err(e) => {
                log::warn!(
                    "{} rate request for {} on {} failed: {}",
                    self.source.name(),
                    currency,
                    date,
                    e
                );
                None
            }
        }
    }

    fn alias(&mut self, currency: &str, requested: NaiveDate, resolved: &ResolvedRate) -> Result<()> {
        if !self.policy.alias_requested_date || resolved.effective_date == requested {
            return Ok(());
        }
        if self.cache.lookup(requested, currency).is_some() {
            return Ok(());
        }
        self.cache.append(RateRecord::new(
            requested,
            currency,
            resolved.rate,
            resolved.table_no.clone(),
        ))
    }
}
