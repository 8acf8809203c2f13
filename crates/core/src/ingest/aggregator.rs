use crate::domain::metrics::{build_metrics, earnings_date};
use crate::domain::quote::{EarningsDate, QuoteRecord};
use crate::error::{EarningsLookupError, QuoteLookupError};
use crate::ingest::provider::QuoteProvider;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;

/// Fans a symbol list out to the quote provider, one task per symbol.
#[derive(Clone)]
pub struct QuoteAggregator {
    provider: Arc<dyn QuoteProvider>,
}

impl QuoteAggregator {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// One record per input symbol, in input order. Never fails as a batch;
    /// callers inspect each record's variant.
    pub async fn fetch_all(&self, symbols: &[String]) -> Vec<QuoteRecord> {
        self.fetch_all_as_of(symbols, Utc::now().date_naive()).await
    }

    pub async fn fetch_all_as_of(&self, symbols: &[String], as_of: NaiveDate) -> Vec<QuoteRecord> {
        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let provider = Arc::clone(&self.provider);
                let symbol = symbol.clone();
                tokio::spawn(async move { fetch_one(provider.as_ref(), &symbol, as_of).await })
            })
            .collect();

        // join_all yields results in handle order, so slot i stays symbol i.
        let records: Vec<QuoteRecord> = join_all(handles)
            .await
            .into_iter()
            .zip(symbols)
            .map(|(joined, symbol)| match joined {
                Ok(record) => record,
                Err(err) => {
                    tracing::error!(ticker = %symbol, error = %err, "quote task did not complete");
                    let err = QuoteLookupError {
                        ticker: symbol.clone(),
                        detail: err.to_string(),
                    };
                    QuoteRecord::failure(symbol.clone(), err.to_string())
                }
            })
            .collect();

        let failures = records.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            provider = self.provider.provider_name(),
            symbols = records.len(),
            failures,
            "quote batch complete"
        );

        records
    }

    pub async fn fetch_one(&self, symbol: &str) -> QuoteRecord {
        fetch_one(self.provider.as_ref(), symbol, Utc::now().date_naive()).await
    }
}

/// Primary lookup decides success or failure; the earnings lookup can only
/// downgrade `EarningsDate` to the placeholder.
pub async fn fetch_one(provider: &dyn QuoteProvider, symbol: &str, as_of: NaiveDate) -> QuoteRecord {
    let quote = match provider.quote(symbol).await {
        Ok(quote) => quote,
        Err(err) => {
            let err = QuoteLookupError {
                ticker: symbol.to_string(),
                detail: format!("{err:#}"),
            };
            tracing::error!(ticker = %symbol, error = %err.detail, "quote lookup failed");
            return QuoteRecord::failure(symbol, err.to_string());
        }
    };

    let earnings = match lookup_earnings(provider, symbol).await {
        Ok(dates) => earnings_date(Some(dates.as_slice())),
        Err(err) => {
            tracing::warn!(ticker = %symbol, error = %err, "earnings date not available");
            EarningsDate::NotAvailable
        }
    };

    QuoteRecord::Success(build_metrics(symbol, quote, earnings, as_of))
}

async fn lookup_earnings(
    provider: &dyn QuoteProvider,
    symbol: &str,
) -> Result<Vec<DateTime<Utc>>, EarningsLookupError> {
    match provider.earnings_dates(symbol).await {
        Ok(Some(dates)) => Ok(dates),
        Ok(None) => Err(EarningsLookupError::Missing {
            ticker: symbol.to_string(),
        }),
        Err(err) => Err(EarningsLookupError::Failed {
            ticker: symbol.to_string(),
            detail: format!("{err:#}"),
        }),
    }
}
