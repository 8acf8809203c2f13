use stockdash_core::domain::quote::QuoteRecord;
use stockdash_core::view::{cell_tier, Column};
use unicode_width::UnicodeWidthStr;

/// Columns of the dashboard table, in display order.
pub const REPORT_COLUMNS: [Column; 8] = [
    Column::Ticker,
    Column::CompanyName,
    Column::CurrentPrice,
    Column::FiftyTwoWeekHigh,
    Column::FiftyTwoWeekLow,
    Column::MarketCap,
    Column::Change,
    Column::HighToCurrentChange,
];

const GAP: &str = "  ";

/// Aligned plain-text table. Shaded percentage cells get one `#` per tier;
/// failure rows print the error message after the ticker.
pub fn render_table(records: &[QuoteRecord], columns: &[Column]) -> String {
    let header: Vec<String> = columns.iter().map(|c| c.header().to_string()).collect();
    let rows: Vec<Vec<String>> = records.iter().map(|r| row_cells(r, columns)).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| UnicodeWidthStr::width(h.as_str())).collect();
    for (record, row) in records.iter().zip(&rows) {
        // A failure's error message overflows into the columns to its right.
        let sized = if record.is_success() { row.len() } else { 1 };
        for (width, cell) in widths.iter_mut().zip(row.iter().take(sized)) {
            *width = (*width).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn row_cells(record: &QuoteRecord, columns: &[Column]) -> Vec<String> {
    match record {
        QuoteRecord::Success(_) => columns
            .iter()
            .map(|c| {
                let text = c.display(record);
                match cell_tier(*c, record) {
                    Some(tier) if tier > 0 => format!("{text} {}", "#".repeat(tier as usize)),
                    _ => text,
                }
            })
            .collect(),
        QuoteRecord::Failure(f) => vec![f.ticker.clone(), f.error.clone()],
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str(GAP);
        }
        line.push_str(cell);
        let width = widths.get(i).copied().unwrap_or(0);
        let pad = width.saturating_sub(UnicodeWidthStr::width(cell.as_str()));
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdash_core::domain::quote::{EarningsDate, StockMetrics};

    fn success(ticker: &str, change: &str, from_high: &str) -> QuoteRecord {
        QuoteRecord::Success(StockMetrics {
            ticker: ticker.to_string(),
            company_name: Some("Advanced Micro Devices".to_string()),
            current_price: Some(55.0),
            current_date: "1/27/2026".to_string(),
            fifty_two_week_high: Some(100.0),
            fifty_two_week_low: Some(40.0),
            market_cap: Some(89_000_000_000.0),
            industry: None,
            sector: None,
            change: Some(change.to_string()),
            high_to_current_change: Some(from_high.to_string()),
            earnings_date: EarningsDate::NotAvailable,
        })
    }

    #[test]
    fn renders_header_rule_and_rows() {
        let records = vec![
            success("AMD", "-3.50%", "-45.00%"),
            QuoteRecord::failure("MSFT", "Failed to fetch data for ticker: MSFT"),
        ];
        let out = render_table(&records, &REPORT_COLUMNS);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Ticker"));
        assert!(lines[0].ends_with("% Change from 52 Week High"));
        assert!(lines[1].starts_with("------"));
        assert!(lines[2].contains("$55.00"));
        assert!(lines[2].contains("$89.00B"));
        assert!(lines[2].contains("-3.50% ##"));
        assert!(lines[2].ends_with("-45.00% ####"));
        assert!(lines[3].starts_with("MSFT"));
        assert!(lines[3].ends_with("Failed to fetch data for ticker: MSFT"));
    }

    #[test]
    fn columns_line_up() {
        let records = vec![
            success("AMD", "0.10%", "-1.00%"),
            success("NVDA", "0.20%", "-2.00%"),
        ];
        let out = render_table(&records, &[Column::Ticker, Column::Change]);
        let lines: Vec<&str> = out.lines().collect();
        let change_col = lines[0].find("Change").unwrap();
        assert_eq!(lines[2].find("0.10%"), Some(change_col));
        assert_eq!(lines[3].find("0.20%"), Some(change_col));
    }

    #[test]
    fn unshaded_cells_have_no_bar() {
        let out = render_table(&[success("AMD", "0.10%", "-1.00%")], &REPORT_COLUMNS);
        assert!(!out.contains('#'));
    }
}
