//! Commerce catalog lookups
//!
//! The pipeline only depends on the [`CatalogSource`] contract. The iTunes
//! Search implementation lives in [`itunes`].

pub mod itunes;

pub use itunes::ItunesCatalog;

use crate::error::Result;
use crate::types::CatalogEntry;
use std::future::Future;

/// Trait for catalog services
pub trait CatalogSource: Send + Sync {
    /// Find the first ebook matching `seller` and `title` in the `country` storefront
    ///
    /// Fails with `CatalogNotFound` when the search has no results and with
    /// `CatalogRequestFailed` on a non-success HTTP status.
    fn search(
        &self,
        seller: &str,
        title: &str,
        country: &str,
    ) -> impl Future<Output = Result<CatalogEntry>> + Send;

    /// Get the source name
    fn name(&self) -> &str;
}
