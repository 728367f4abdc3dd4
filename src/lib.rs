//! # ebook-pricer
//!
//! Looks ebook titles up in a commerce catalog and converts their prices into a
//! target currency using historical daily exchange rates.
//!
//! Rates are resolved cache-first against an append-only CSV store. When no rate
//! was published on a release date (weekends, holidays), earlier days are
//! searched within a bounded fallback window.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ebook_pricer::prelude::*;
//! use std::path::Path;
//!
//! # async fn run() -> ebook_pricer::error::Result<()> {
//! let config = Config::default();
//! let resolver = RateResolver::new(
//!     NbpRateSource::new(&config.rate_url, &config.rate_table, config.http_timeout())?,
//!     FixedDelay::new(config.request_delay()),
//!     RateCache::load(&config.cache_path)?,
//!     ResolverPolicy::from(&config),
//! );
//! let catalog = ItunesCatalog::new(&config.catalog_url, &config.media, config.http_timeout())?;
//!
//! let mut pipeline = Pipeline::new(catalog, resolver, FixedDelay::new(config.request_delay()), &config.country);
//! let summary = pipeline
//!     .run(Path::new("books.csv"), Path::new("ebooks_data.json"), &())
//!     .await?;
//! println!("{} of {} items converted", summary.converted(), summary.items.len());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod fx;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod throttle;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::catalog::{CatalogSource, ItunesCatalog};
    pub use crate::config::Config;
    pub use crate::error::{PricerError, Result};
    pub use crate::fx::{
        NbpRateSource, RateCache, RateQuote, RateRecord, RateResolver, RateSource, ResolvedRate,
        ResolverPolicy,
    };
    pub use crate::pipeline::{Phase, PhaseReport, Pipeline, Progress, RunSummary};
    pub use crate::throttle::{FixedDelay, NoDelay, Throttle};
    pub use crate::types::*;
}
