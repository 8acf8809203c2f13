use crate::config::Settings;
use crate::ingest::types::{QuoteEnvelope, RawQuote, SummaryEnvelope};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const QUOTE_PATH: &str = "/v7/finance/quote";
const SUMMARY_PATH: &str = "/v10/finance/quoteSummary";
const CRUMB_PATH: &str = "/v1/test/getcrumb";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn quote(&self, symbol: &str) -> Result<RawQuote>;

    /// Earnings dates in provider order; `Ok(None)` when the response carries
    /// no earnings-chart date list at all.
    async fn earnings_dates(&self, symbol: &str) -> Result<Option<Vec<DateTime<Utc>>>>;
}

type CrumbSession = Shared<BoxFuture<'static, Result<String, Arc<anyhow::Error>>>>;

pub struct YahooFinanceProvider {
    http: reqwest::Client,
    base_url: String,
    cookie_url: String,

    // Session crumb, fetched once and reused until the provider rejects it or
    // the fetch fails. The lock is never held across a request.
    crumb: Mutex<Option<CrumbSession>>,
}

impl YahooFinanceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .quote_provider_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let cookie_url = settings
            .quote_provider_cookie_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COOKIE_URL.to_string());
        let timeout_secs = settings
            .quote_provider_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build quote provider http client")?;

        Ok(Self {
            http,
            base_url,
            cookie_url,
            crumb: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    // Concurrent callers share one in-flight session request and its outcome.
    fn session(&self) -> CrumbSession {
        let mut slot = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| {
            establish_session(
                self.http.clone(),
                self.cookie_url.clone(),
                self.url(CRUMB_PATH),
            )
            .map_err(Arc::new)
            .boxed()
            .shared()
        })
        .clone()
    }

    /// Drops `session` from the cache unless a newer one already replaced it.
    fn forget(&self, session: &CrumbSession) {
        let mut slot = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|cached| cached.ptr_eq(session)) {
            *slot = None;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let session = self.session();
        let crumb = session.clone().await.map_err(|err| {
            self.forget(&session);
            anyhow::anyhow!("{err:#}")
        })?;

        let res = self
            .http
            .get(self.url(path))
            .query(query)
            .query(&[("crumb", crumb.as_str())])
            .send()
            .await
            .context("quote provider request failed")?;

        let status = res.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.forget(&session);
        }

        let text = res
            .text()
            .await
            .context("failed to read provider response")?;
        if !status.is_success() {
            anyhow::bail!("quote provider HTTP {status}: {}", text.trim());
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("unexpected provider response shape: {text}"))
    }
}

async fn establish_session(http: reqwest::Client, cookie_url: String, crumb_url: String) -> Result<String> {
    // Only the Set-Cookie matters here; the status is usually 404.
    http.get(&cookie_url)
        .send()
        .await
        .context("quote provider cookie request failed")?;

    let res = http
        .get(&crumb_url)
        .send()
        .await
        .context("quote provider crumb request failed")?;
    let status = res.status();
    let text = res
        .text()
        .await
        .context("failed to read crumb response")?;
    if !status.is_success() {
        anyhow::bail!("crumb HTTP {status}: {}", text.trim());
    }

    let crumb = text.trim().to_string();
    anyhow::ensure!(
        !crumb.is_empty() && !crumb.contains(char::is_whitespace),
        "quote provider returned an unusable crumb: {crumb:?}"
    );

    tracing::debug!("quote provider session established");
    Ok(crumb)
}

#[async_trait::async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn quote(&self, symbol: &str) -> Result<RawQuote> {
        let envelope: QuoteEnvelope = self.get_json(QUOTE_PATH, &[("symbols", symbol)]).await?;
        quote_from_envelope(symbol, envelope)
    }

    async fn earnings_dates(&self, symbol: &str) -> Result<Option<Vec<DateTime<Utc>>>> {
        let path = format!("{SUMMARY_PATH}/{symbol}");
        let envelope: SummaryEnvelope = self.get_json(&path, &[("modules", "earnings")]).await?;
        earnings_from_envelope(symbol, envelope)
    }
}

fn quote_from_envelope(symbol: &str, envelope: QuoteEnvelope) -> Result<RawQuote> {
    let response = envelope.quote_response;
    if let Some(err) = response.error.filter(|e| !e.is_null()) {
        anyhow::bail!("provider returned error for {symbol}: {err}");
    }

    response
        .result
        .into_iter()
        .next()
        .with_context(|| format!("no quote returned for {symbol}"))
}

fn earnings_from_envelope(
    symbol: &str,
    envelope: SummaryEnvelope,
) -> Result<Option<Vec<DateTime<Utc>>>> {
    let summary = envelope.quote_summary;
    if let Some(err) = summary.error.filter(|e| !e.is_null()) {
        anyhow::bail!("provider returned error for {symbol}: {err}");
    }

    let dates = summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.earnings)
        .and_then(|e| e.earnings_chart)
        .and_then(|c| c.earnings_date);

    let Some(dates) = dates else {
        return Ok(None);
    };

    let mut out = Vec::with_capacity(dates.len());
    for ts in dates {
        let dt = DateTime::<Utc>::from_timestamp(ts.raw, 0)
            .with_context(|| format!("earnings timestamp out of range for {symbol}: {}", ts.raw))?;
        out.push(dt);
    }
    Ok(Some(out))
}
