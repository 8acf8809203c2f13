use serde::Deserialize;
use serde_json::Value;

/// Subset of a provider quote the dashboard derives its metrics from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    #[serde(default)]
    pub symbol: String,
    pub short_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_change_percent: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub industry: Option<String>,
    pub sector: Option<String>,
}

// v7 /finance/quote envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteEnvelope {
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteResponse {
    #[serde(default)]
    pub result: Vec<RawQuote>,
    pub error: Option<Value>,
}

// v10 /finance/quoteSummary envelope; every level may be missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryEnvelope {
    pub quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteSummary {
    pub result: Option<Vec<SummaryResult>>,
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResult {
    pub earnings: Option<EarningsModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarningsModule {
    pub earnings_chart: Option<EarningsChart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarningsChart {
    pub earnings_date: Option<Vec<RawTimestamp>>,
}

/// Yahoo's `{"raw": <unix seconds>, "fmt": "YYYY-MM-DD"}` pair.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTimestamp {
    pub raw: i64,
}
