use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockdash_core::categories::CategoryTable;
use stockdash_core::config::Settings;
use stockdash_core::ingest::aggregator::QuoteAggregator;
use stockdash_core::ingest::provider::YahooFinanceProvider;
use stockdash_core::view::{filter_records, sort_records, Column, ColumnFilter, SortDirection};

mod render;

#[derive(Debug, Parser)]
#[command(name = "stockdash_report")]
struct Args {
    /// Category to report on. `all` flattens every configured category.
    #[arg(long, default_value = "all")]
    category: String,

    /// Column to sort by, as its JSON field name (e.g. HighToCurrentChange).
    #[arg(long)]
    sort: Option<Column>,

    /// Sort descending.
    #[arg(long)]
    desc: bool,

    /// Substring filter COLUMN=TEXT. Repeatable; every filter must match.
    #[arg(long = "filter", value_name = "COLUMN=TEXT")]
    filters: Vec<ColumnFilter>,

    /// Tickers file; overrides TICKERS_PATH.
    #[arg(long)]
    tickers: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(path) = args.tickers.clone() {
        settings.tickers_path = path;
    }

    if let Err(err) = run(&args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn run(args: &Args, settings: &Settings) -> anyhow::Result<()> {
    let categories = CategoryTable::load(&settings.tickers_path)?;
    let symbols = categories.resolve(&args.category)?;

    let provider = YahooFinanceProvider::from_settings(settings)?;
    let aggregator = QuoteAggregator::new(Arc::new(provider));

    tracing::info!(
        category = %args.category,
        symbols = symbols.len(),
        "fetching quotes"
    );
    let records = aggregator.fetch_all(&symbols).await;

    let mut records = filter_records(records, &args.filters);
    if let Some(column) = args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        sort_records(&mut records, column, direction);
    }

    print!("{}", render::render_table(&records, &render::REPORT_COLUMNS));
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sort_and_repeated_filters() {
        let args = Args::try_parse_from([
            "stockdash_report",
            "--category",
            "tech",
            "--sort",
            "HighToCurrentChange",
            "--desc",
            "--filter",
            "sector=tech",
            "--filter",
            "ticker=a",
        ])
        .unwrap();

        assert_eq!(args.category, "tech");
        assert_eq!(args.sort, Some(Column::HighToCurrentChange));
        assert!(args.desc);
        assert_eq!(
            args.filters,
            vec![
                ColumnFilter::new(Column::Sector, "tech"),
                ColumnFilter::new(Column::Ticker, "a"),
            ]
        );
    }

    #[test]
    fn defaults_to_all_categories() {
        let args = Args::try_parse_from(["stockdash_report"]).unwrap();
        assert_eq!(args.category, "all");
        assert!(args.sort.is_none());
        assert!(args.filters.is_empty());
    }

    #[test]
    fn rejects_unknown_sort_column() {
        assert!(Args::try_parse_from(["stockdash_report", "--sort", "bogus"]).is_err());
        assert!(Args::try_parse_from(["stockdash_report", "--filter", "sector"]).is_err());
    }
}
