//! Table view over a batch of quote records: column display, sorting,
//! substring filters, and the intensity tiers used to shade the two
//! percentage columns.

use crate::domain::quote::{
    EarningsDate, QuoteRecord, StockMetrics, EARNINGS_DATE_PLACEHOLDER, NOT_AVAILABLE,
};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Ticker,
    CompanyName,
    CurrentPrice,
    CurrentDate,
    FiftyTwoWeekHigh,
    FiftyTwoWeekLow,
    MarketCap,
    Industry,
    Sector,
    Change,
    HighToCurrentChange,
    EarningsDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("filter must look like COLUMN=TEXT (got '{0}')")]
    MalformedFilter(String),
}

// Sort key for one cell.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Ticker,
        Column::CompanyName,
        Column::CurrentPrice,
        Column::CurrentDate,
        Column::FiftyTwoWeekHigh,
        Column::FiftyTwoWeekLow,
        Column::MarketCap,
        Column::Industry,
        Column::Sector,
        Column::Change,
        Column::HighToCurrentChange,
        Column::EarningsDate,
    ];

    /// Field name in the JSON record.
    pub fn field_name(self) -> &'static str {
        match self {
            Column::Ticker => "Ticker",
            Column::CompanyName => "CompanyName",
            Column::CurrentPrice => "CurrentPrice",
            Column::CurrentDate => "CurrentDate",
            Column::FiftyTwoWeekHigh => "FiftyTwoWeekHigh",
            Column::FiftyTwoWeekLow => "FiftyTwoWeekLow",
            Column::MarketCap => "MarketCap",
            Column::Industry => "Industry",
            Column::Sector => "Sector",
            Column::Change => "CHANGE",
            Column::HighToCurrentChange => "HighToCurrentChange",
            Column::EarningsDate => "EarningsDate",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::Ticker => "Ticker",
            Column::CompanyName => "Company Name",
            Column::CurrentPrice => "Current Price",
            Column::CurrentDate => "Date",
            Column::FiftyTwoWeekHigh => "52 Week High",
            Column::FiftyTwoWeekLow => "52 Week Low",
            Column::MarketCap => "Market Cap",
            Column::Industry => "Industry",
            Column::Sector => "Sector",
            Column::Change => "Change",
            Column::HighToCurrentChange => "% Change from 52 Week High",
            Column::EarningsDate => "Earnings Date",
        }
    }

    /// Shading scale for the percentage columns.
    pub fn scale(self) -> Option<Scale> {
        match self {
            Column::Change => Some(Scale::DailyChange),
            Column::HighToCurrentChange => Some(Scale::FromHigh),
            _ => None,
        }
    }

    /// Rendered cell text. Failure rows only render their ticker.
    pub fn display(self, record: &QuoteRecord) -> String {
        let m = match record {
            QuoteRecord::Success(m) => m,
            QuoteRecord::Failure(f) => {
                return if self == Column::Ticker {
                    f.ticker.clone()
                } else {
                    String::new()
                };
            }
        };

        match self {
            Column::Ticker => m.ticker.clone(),
            Column::CompanyName => text_or_na(m.company_name.as_deref()),
            Column::CurrentPrice => money_or_na(m.current_price),
            Column::CurrentDate => m.current_date.clone(),
            Column::FiftyTwoWeekHigh => money_or_na(m.fifty_two_week_high),
            Column::FiftyTwoWeekLow => money_or_na(m.fifty_two_week_low),
            Column::MarketCap => m
                .market_cap
                .map(|v| format!("${:.2}B", v / 1e9))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            Column::Industry => text_or_na(m.industry.as_deref()),
            Column::Sector => text_or_na(m.sector.as_deref()),
            Column::Change => text_or_na(m.change.as_deref()),
            Column::HighToCurrentChange => text_or_na(m.high_to_current_change.as_deref()),
            Column::EarningsDate => match &m.earnings_date {
                EarningsDate::Dates(d) => d.join(", "),
                EarningsDate::NotAvailable => EARNINGS_DATE_PLACEHOLDER.to_string(),
            },
        }
    }

    fn cell(self, record: &QuoteRecord) -> Cell {
        let m: &StockMetrics = match record {
            QuoteRecord::Success(m) => m,
            QuoteRecord::Failure(f) => {
                return if self == Column::Ticker {
                    Cell::Text(f.ticker.to_lowercase())
                } else {
                    Cell::Missing
                };
            }
        };

        let number = |v: Option<f64>| v.map(Cell::Number).unwrap_or(Cell::Missing);
        let text = |v: Option<&str>| {
            v.map(|s| Cell::Text(s.to_lowercase()))
                .unwrap_or(Cell::Missing)
        };
        let percent = |v: Option<&str>| {
            v.and_then(parse_percent)
                .map(Cell::Number)
                .unwrap_or(Cell::Missing)
        };

        match self {
            Column::Ticker => Cell::Text(m.ticker.to_lowercase()),
            Column::CompanyName => text(m.company_name.as_deref()),
            Column::CurrentPrice => number(m.current_price),
            Column::CurrentDate => text(Some(m.current_date.as_str())),
            Column::FiftyTwoWeekHigh => number(m.fifty_two_week_high),
            Column::FiftyTwoWeekLow => number(m.fifty_two_week_low),
            Column::MarketCap => number(m.market_cap),
            Column::Industry => text(m.industry.as_deref()),
            Column::Sector => text(m.sector.as_deref()),
            Column::Change => percent(m.change.as_deref()),
            Column::HighToCurrentChange => percent(m.high_to_current_change.as_deref()),
            Column::EarningsDate => match &m.earnings_date {
                EarningsDate::Dates(d) => text(d.first().map(String::as_str)),
                EarningsDate::NotAvailable => Cell::Missing,
            },
        }
    }
}

impl FromStr for Column {
    type Err = ViewError;

    /// Accepts JSON field names case-insensitively, ignoring `_`, `-` and spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Column::ALL
            .into_iter()
            .find(|c| normalize(c.field_name()) == wanted)
            .ok_or_else(|| ViewError::UnknownColumn(s.to_string()))
    }
}

/// Case-insensitive substring filter on one column's rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: Column,
    pub needle: String,
}

impl ColumnFilter {
    pub fn new(column: Column, needle: impl Into<String>) -> Self {
        Self {
            column,
            needle: needle.into(),
        }
    }

    pub fn matches(&self, record: &QuoteRecord) -> bool {
        let needle = self.needle.to_lowercase();
        needle.is_empty() || self.column.display(record).to_lowercase().contains(&needle)
    }
}

impl FromStr for ColumnFilter {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, needle) = s
            .split_once('=')
            .ok_or_else(|| ViewError::MalformedFilter(s.to_string()))?;
        Ok(Self::new(column.parse()?, needle))
    }
}

/// `"-12.34%"` -> `-12.34`.
pub fn parse_percent(s: &str) -> Option<f64> {
    s.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}

/// Stable sort on one column. Percent strings compare by value; absent values
/// and failure rows go last in either direction.
pub fn sort_records(records: &mut [QuoteRecord], column: Column, direction: SortDirection) {
    records.sort_by(|a, b| {
        let (a, b) = (column.cell(a), column.cell(b));
        match (&a, &b) {
            (Cell::Missing, Cell::Missing) => Ordering::Equal,
            (Cell::Missing, _) => Ordering::Greater,
            (_, Cell::Missing) => Ordering::Less,
            _ => {
                let ord = compare_present(&a, &b);
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
        }
    });
}

/// Keeps records matching every filter, preserving order.
pub fn filter_records(records: Vec<QuoteRecord>, filters: &[ColumnFilter]) -> Vec<QuoteRecord> {
    records
        .into_iter()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .collect()
}

/// Independent shading scales for the two percentage columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Drawdown from the 52-week high; only declines are shaded.
    FromHigh,
    /// Daily move in either direction.
    DailyChange,
}

impl Scale {
    pub fn max_tier(self) -> u8 {
        match self {
            Scale::FromHigh => 5,
            Scale::DailyChange => 3,
        }
    }
}

/// Monotonic in magnitude: 0 means unshaded, higher means more intense.
pub fn intensity_tier(scale: Scale, percent: f64) -> u8 {
    if !percent.is_finite() {
        return 0;
    }

    match scale {
        Scale::FromHigh => {
            if percent <= -50.0 {
                5
            } else if percent < -40.0 {
                4
            } else if percent < -30.0 {
                3
            } else if percent < -20.0 {
                2
            } else if percent < -10.0 {
                1
            } else {
                0
            }
        }
        Scale::DailyChange => {
            let magnitude = percent.abs();
            if magnitude >= 5.0 {
                3
            } else if magnitude >= 3.0 {
                2
            } else if magnitude >= 1.0 {
                1
            } else {
                0
            }
        }
    }
}

/// Tier of a percentage cell, `None` for other columns or absent values.
pub fn cell_tier(column: Column, record: &QuoteRecord) -> Option<u8> {
    let scale = column.scale()?;
    match column.cell(record) {
        Cell::Number(v) => Some(intensity_tier(scale, v)),
        _ => None,
    }
}

fn compare_present(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn text_or_na(v: Option<&str>) -> String {
    v.unwrap_or(NOT_AVAILABLE).to_string()
}

fn money_or_na(v: Option<f64>) -> String {
    v.map(|v| format!("${v:.2}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
