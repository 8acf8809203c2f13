use crate::domain::quote::{EarningsDate, StockMetrics};
use crate::ingest::types::RawQuote;
use chrono::{DateTime, NaiveDate, Utc};

/// Two decimals plus a trailing `%`. Ties round away from zero.
pub fn format_percent(value: f64) -> String {
    // `{:.2}` alone rounds exact ties to even (1.125 -> "1.12").
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 && value >= 0.0 {
        return "0.00%".to_string();
    }
    format!("{rounded:.2}%")
}

/// Percent distance of the current price from the 52-week high.
///
/// Absent when either input is absent, non-finite, or the high is zero.
pub fn high_to_current_change(price: Option<f64>, high: Option<f64>) -> Option<String> {
    let price = price.filter(|v| v.is_finite())?;
    let high = high.filter(|v| v.is_finite() && *v != 0.0)?;
    Some(format_percent((price - high) / high * 100.0))
}

pub fn daily_change(percent: Option<f64>) -> Option<String> {
    percent.filter(|v| v.is_finite()).map(format_percent)
}

/// en-US short date, e.g. `4/25/2024`.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

pub fn earnings_date(timestamps: Option<&[DateTime<Utc>]>) -> EarningsDate {
    match timestamps {
        Some(ts) => EarningsDate::Dates(
            ts.iter()
                .map(|t| format_calendar_date(t.date_naive()))
                .collect(),
        ),
        None => EarningsDate::NotAvailable,
    }
}

/// Builds the success record for `requested` from the provider's raw quote.
pub fn build_metrics(
    requested: &str,
    quote: RawQuote,
    earnings_date: EarningsDate,
    as_of: NaiveDate,
) -> StockMetrics {
    let ticker = if quote.symbol.trim().is_empty() {
        requested.to_string()
    } else {
        quote.symbol
    };

    StockMetrics {
        ticker,
        company_name: quote.short_name,
        current_price: quote.regular_market_price,
        current_date: format_calendar_date(as_of),
        fifty_two_week_high: quote.fifty_two_week_high,
        fifty_two_week_low: quote.fifty_two_week_low,
        market_cap: quote.market_cap,
        industry: quote.industry,
        sector: quote.sector,
        change: daily_change(quote.regular_market_change_percent),
        high_to_current_change: high_to_current_change(
            quote.regular_market_price,
            quote.fifty_two_week_high,
        ),
        earnings_date,
    }
}
