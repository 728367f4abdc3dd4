//! Pricing pipeline
//!
//! Runs the four phases in order, each over the full item list:
//!
//! 1. read the input list
//! 2. look every title up in the catalog
//! 3. resolve an exchange rate for every catalog hit
//! 4. write the priced items as JSON
//!
//! Per-item failures are collected into the phase's [`PhaseReport`] and never
//! stop the run. Only fatal errors (missing input, cache or output I/O) do.

use crate::catalog::CatalogSource;
use crate::error::{PricerError, Result};
use crate::fx::{RateResolver, RateSource};
use crate::input::read_input;
use crate::output::write_output;
use crate::throttle::Throttle;
use crate::types::{BookRequest, PricedItem};
use std::fmt;
use std::path::Path;

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Input,
    Catalog,
    Rates,
    Output,
}

impl Phase {
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Input => "Reading data from CSV",
            Phase::Catalog => "Getting data from catalog",
            Phase::Rates => "Getting exchange rates",
            Phase::Output => "Saving data to JSON file",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A failure tied to one input row or item
#[derive(Debug)]
pub struct ItemError {
    pub item: String,
    pub error: PricerError,
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.error)
    }
}

/// Outcome of one phase
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    pub attempted: usize,
    pub succeeded: usize,
    pub errors: Vec<ItemError>,
}

impl PhaseReport {
    fn new(phase: Phase, attempted: usize) -> Self {
        Self {
            phase,
            attempted,
            succeeded: 0,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, item: String, error: PricerError) {
        log::warn!("{}: {}", item, error);
        self.errors.push(ItemError { item, error });
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Everything a completed run produced
#[derive(Debug)]
pub struct RunSummary {
    pub items: Vec<PricedItem>,
    pub reports: Vec<PhaseReport>,
}

impl RunSummary {
    pub fn report(&self, phase: Phase) -> Option<&PhaseReport> {
        self.reports.iter().find(|r| r.phase == phase)
    }

    pub fn converted(&self) -> usize {
        self.items.iter().filter(|item| item.is_converted()).count()
    }
}

/// Progress hooks, driven once per item
pub trait Progress {
    fn begin(&self, _phase: Phase, _total: usize) {}
    fn advance(&self) {}
    fn finish(&self, _report: &PhaseReport) {}
}

/// Silent progress
impl Progress for () {}

pub struct Pipeline<C, S, T> {
    catalog: C,
    resolver: RateResolver<S, T>,
    throttle: T,
    country: String,
}

impl<C, S, T> Pipeline<C, S, T>
where
    C: CatalogSource,
    S: RateSource,
    T: Throttle,
{
    /// `throttle` paces catalog requests; the resolver paces its own
    pub fn new(
        catalog: C,
        resolver: RateResolver<S, T>,
        throttle: T,
        country: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            throttle,
            country: country.into(),
        }
    }

    pub fn resolver(&self) -> &RateResolver<S, T> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut RateResolver<S, T> {
        &mut self.resolver
    }

    /// Run every phase; only fatal errors are returned as `Err`
    pub async fn run(
        &mut self,
        input: &Path,
        output: &Path,
        progress: &dyn Progress,
    ) -> Result<RunSummary> {
        let (requests, input_report) = self.read_requests(input, progress)?;
        let (mut items, catalog_report) = self.fetch_catalog(&requests, progress).await;
        let rates_report = self.convert_prices(&mut items, progress).await?;
        let output_report = self.write_items(output, &items, progress)?;

        Ok(RunSummary {
            items,
            reports: vec![input_report, catalog_report, rates_report, output_report],
        })
    }

    /// Phase 1: read and validate the input list
    pub fn read_requests(
        &self,
        input: &Path,
        progress: &dyn Progress,
    ) -> Result<(Vec<BookRequest>, PhaseReport)> {
        progress.begin(Phase::Input, 0);
        let batch = read_input(input)?;

        let mut report = PhaseReport::new(Phase::Input, batch.requests.len() + batch.warnings.len());
        report.succeeded = batch.requests.len();
        for warning in batch.warnings {
            let item = match &warning {
                PricerError::MalformedRow { line, .. } => format!("line {}", line),
                _ => input.display().to_string(),
            };
            report.errors.push(ItemError { item, error: warning });
        }

        progress.finish(&report);
        Ok((batch.requests, report))
    }

    /// Phase 2: one catalog search per request, in order
    pub async fn fetch_catalog(
        &self,
        requests: &[BookRequest],
        progress: &dyn Progress,
    ) -> (Vec<PricedItem>, PhaseReport) {
        progress.begin(Phase::Catalog, requests.len());
        let mut report = PhaseReport::new(Phase::Catalog, requests.len());
        let mut items = Vec::with_capacity(requests.len());

        for request in requests {
            let result = self
                .catalog
                .search(&request.seller, &request.title, &self.country)
                .await;
            self.throttle.pause().await;

            match result {
                Ok(entry) => {
                    items.push(PricedItem::from(entry));
                    report.succeeded += 1;
                }
                Err(e) => report.record(request.label(), e),
            }
            progress.advance();
        }

        log::info!(
            "Could not retrieve data from {} for {} ebooks",
            self.catalog.name(),
            report.failed()
        );
        progress.finish(&report);
        (items, report)
    }

    /// Phase 3: resolve a rate for every item and attach the conversion
    pub async fn convert_prices(
        &mut self,
        items: &mut [PricedItem],
        progress: &dyn Progress,
    ) -> Result<PhaseReport> {
        progress.begin(Phase::Rates, items.len());
        let mut report = PhaseReport::new(Phase::Rates, items.len());

        for item in items.iter_mut() {
            match self.resolver.resolve(&item.currency, item.release_date).await {
                Ok(resolved) => {
                    item.apply_rate(resolved.rate, resolved.table_no);
                    report.succeeded += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.record(item.label(), e),
            }
            progress.advance();
        }

        log::info!(
            "Could not retrieve exchange rates from {} for {} ebooks",
            self.resolver.source().name(),
            report.failed()
        );
        progress.finish(&report);
        Ok(report)
    }

    /// Phase 4: persist the results
    pub fn write_items(
        &self,
        output: &Path,
        items: &[PricedItem],
        progress: &dyn Progress,
    ) -> Result<PhaseReport> {
        progress.begin(Phase::Output, 0);
        write_output(output, items)?;

        let mut report = PhaseReport::new(Phase::Output, items.len());
        report.succeeded = items.len();
        progress.finish(&report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{RateCache, RateQuote, ResolverPolicy};
    use crate::throttle::NoDelay;
    use crate::types::CatalogEntry;
    use chrono::NaiveDate;
    use std::cell::Cell;

    struct OneBookCatalog;

    impl CatalogSource for OneBookCatalog {
        async fn search(&self, seller: &str, title: &str, _country: &str) -> Result<CatalogEntry> {
            if title != "Emma" {
                return Err(PricerError::CatalogNotFound {
                    seller: seller.to_string(),
                    title: title.to_string(),
                });
            }
            Ok(CatalogEntry {
                seller_name: seller.to_string(),
                title: title.to_string(),
                currency: "GBP".to_string(),
                price: 4.0,
                release_date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            })
        }

        fn name(&self) -> &str {
            "one-book"
        }
    }

    struct FlatRate;

    impl RateSource for FlatRate {
        async fn fetch_rate(&self, _currency: &str, _date: NaiveDate) -> Result<Option<RateQuote>> {
            Ok(Some(RateQuote {
                rate: 5.0,
                table_no: "104/A/NBP/2021".to_string(),
            }))
        }

        fn name(&self) -> &str {
            "flat"
        }
    }

    #[derive(Default)]
    struct CountingProgress {
        advanced: Cell<usize>,
        finished: Cell<usize>,
    }

    impl Progress for CountingProgress {
        fn advance(&self) {
            self.advanced.set(self.advanced.get() + 1);
        }

        fn finish(&self, _report: &PhaseReport) {
            self.finished.set(self.finished.get() + 1);
        }
    }

    fn pipeline() -> Pipeline<OneBookCatalog, FlatRate, NoDelay> {
        let resolver = RateResolver::new(
            FlatRate,
            NoDelay,
            RateCache::in_memory(),
            ResolverPolicy::default(),
        );
        Pipeline::new(OneBookCatalog, resolver, NoDelay, "GB")
    }

    #[tokio::test]
    async fn test_catalog_failures_recorded() {
        let pipeline = pipeline();
        let requests = vec![
            BookRequest::new(2, "Jane Austen", "Emma"),
            BookRequest::new(3, "Jane Austen", "Unknown"),
        ];
        let progress = CountingProgress::default();

        let (items, report) = pipeline.fetch_catalog(&requests, &progress).await;

        assert_eq!(items.len(), 1);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.errors[0].item, "Jane Austen Unknown");
        assert_eq!(progress.advanced.get(), 2);
        assert_eq!(progress.finished.get(), 1);
    }

    #[tokio::test]
    async fn test_convert_records_out_of_range() {
        let mut pipeline = pipeline();
        let mut items = vec![
            PricedItem::from(CatalogEntry {
                seller_name: "Old".to_string(),
                title: "Book".to_string(),
                currency: "GBP".to_string(),
                price: 1.0,
                release_date: NaiveDate::from_ymd_opt(1998, 1, 1).unwrap(),
            }),
            PricedItem::from(CatalogEntry {
                seller_name: "New".to_string(),
                title: "Book".to_string(),
                currency: "GBP".to_string(),
                price: 2.0,
                release_date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            }),
        ];

        let report = pipeline.convert_prices(&mut items, &()).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert!(matches!(
            report.errors[0].error,
            PricerError::DateOutOfRange { .. }
        ));
        assert!(items[0].conversion.is_none());
        assert_eq!(items[1].conversion.as_ref().unwrap().priced_in_target, 10.0);
    }
}
