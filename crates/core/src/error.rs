//! Error taxonomy for category resolution and quote lookups.
//!
//! Only [`CategoryNotFoundError`] ever crosses the aggregator boundary. Lookup
//! errors are folded into per-record results by the aggregator.

use thiserror::Error;

/// The requested category is neither `all` nor a configured key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Category '{category}' not found.")]
pub struct CategoryNotFoundError {
    pub category: String,
}

/// The primary quote lookup failed for one symbol.
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch data for ticker: {ticker}")]
pub struct QuoteLookupError {
    pub ticker: String,
    pub detail: String,
}

/// The secondary earnings lookup produced nothing usable.
#[derive(Debug, Clone, Error)]
pub enum EarningsLookupError {
    #[error("earnings lookup failed for {ticker}: {detail}")]
    Failed { ticker: String, detail: String },

    #[error("no earnings chart data for {ticker}")]
    Missing { ticker: String },
}
