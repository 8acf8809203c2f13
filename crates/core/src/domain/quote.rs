use serde::{Serialize, Serializer};

/// Wire value for a field the provider did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

pub const EARNINGS_DATE_PLACEHOLDER: &str = "Earnings date not available";

/// Per-ticker result of a quote lookup.
///
/// Serialized untagged: a success is the flat metrics object, a failure is
/// `{"Ticker": .., "error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuoteRecord {
    Success(StockMetrics),
    Failure(QuoteFailure),
}

impl QuoteRecord {
    pub fn failure(ticker: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure(QuoteFailure {
            ticker: ticker.into(),
            error: error.into(),
        })
    }

    pub fn ticker(&self) -> &str {
        match self {
            Self::Success(m) => &m.ticker,
            Self::Failure(f) => &f.ticker,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_success(&self) -> Option<&StockMetrics> {
        match self {
            Self::Success(m) => Some(m),
            Self::Failure(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockMetrics {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "CompanyName", serialize_with = "or_not_available")]
    pub company_name: Option<String>,
    #[serde(rename = "CurrentPrice", serialize_with = "or_not_available")]
    pub current_price: Option<f64>,
    #[serde(rename = "CurrentDate")]
    pub current_date: String,
    #[serde(rename = "FiftyTwoWeekHigh", serialize_with = "or_not_available")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(rename = "FiftyTwoWeekLow", serialize_with = "or_not_available")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(rename = "MarketCap", serialize_with = "or_not_available")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Industry", serialize_with = "or_not_available")]
    pub industry: Option<String>,
    #[serde(rename = "Sector", serialize_with = "or_not_available")]
    pub sector: Option<String>,
    /// Daily percent change, `"X.XX%"`.
    #[serde(rename = "CHANGE", serialize_with = "or_not_available")]
    pub change: Option<String>,
    #[serde(rename = "HighToCurrentChange", serialize_with = "or_not_available")]
    pub high_to_current_change: Option<String>,
    #[serde(rename = "EarningsDate")]
    pub earnings_date: EarningsDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteFailure {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    pub error: String,
}

/// Formatted earnings dates in provider order, or the placeholder when the
/// earnings lookup produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarningsDate {
    Dates(Vec<String>),
    NotAvailable,
}

impl Serialize for EarningsDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Dates(dates) => dates.serialize(serializer),
            Self::NotAvailable => serializer.serialize_str(EARNINGS_DATE_PLACEHOLDER),
        }
    }
}

fn or_not_available<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}
