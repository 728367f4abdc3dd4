//! Foreign exchange (FX) rate resolution
//!
//! # Components
//!
//! - **cache**: append-only CSV store of resolved rates
//! - **source**: `RateSource` trait and the NBP HTTP implementation
//! - **resolver**: cache-first lookup with a bounded fallback-day search
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use ebook_pricer::fx::{RateCache, RateRecord};
//!
//! let mut cache = RateCache::in_memory();
//! let date = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
//!
//! cache.append(RateRecord::new(date, "USD", 3.70, "010/A/NBP/2020")).unwrap();
//!
//! let record = cache.lookup(date, "USD").unwrap();
//! assert_eq!(record.rate, 3.70);
//! ```

pub mod cache;
pub mod resolver;
pub mod source;

pub use cache::{RateCache, RateRecord};
pub use resolver::{RateResolver, ResolvedRate, ResolverPolicy, IDENTITY_TABLE_NO};
pub use source::{NbpRateSource, RateQuote, RateSource};
