use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockdash_core::categories::{CategoryTable, ALL_CATEGORY};
use stockdash_core::domain::quote::QuoteRecord;
use stockdash_core::ingest::aggregator::QuoteAggregator;
use stockdash_core::ingest::provider::YahooFinanceProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockdash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let categories = CategoryTable::load(&settings.tickers_path).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;
    tracing::info!(
        path = %settings.tickers_path.display(),
        categories = categories.len(),
        "loaded category table"
    );

    let provider = YahooFinanceProvider::from_settings(&settings)?;
    let state = AppState {
        categories: Arc::new(categories),
        aggregator: QuoteAggregator::new(Arc::new(provider)),
    };

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/categories", get(get_categories))
        .route("/api/stocks/:category", get(get_stocks))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    categories: Arc<CategoryTable>,
    aggregator: QuoteAggregator,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

async fn get_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    let names = std::iter::once(ALL_CATEGORY)
        .chain(state.categories.names())
        .map(str::to_string)
        .collect();
    Json(names)
}

async fn get_stocks(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<QuoteRecord>>, ApiError> {
    let symbols = state.categories.resolve(&category).map_err(|e| {
        tracing::warn!(%category, error = %e, "unknown category requested");
        ApiError {
            error: e.to_string(),
        }
    })?;

    // Per-symbol failures come back as records; this never fails as a batch.
    let records = state.aggregator.fetch_all(&symbols).await;
    Ok(Json(records))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockdash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
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
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};
    use stockdash_core::ingest::provider::QuoteProvider;
    use stockdash_core::ingest::types::RawQuote;

    struct FakeProvider;

    #[async_trait::async_trait]
    impl QuoteProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn quote(&self, symbol: &str) -> anyhow::Result<RawQuote> {
            if symbol == "MSFT" {
                anyhow::bail!("quote provider HTTP 404 Not Found");
            }
            Ok(RawQuote {
                symbol: symbol.to_string(),
                short_name: Some(format!("{symbol} Inc.")),
                regular_market_price: Some(80.0),
                regular_market_change_percent: Some(-1.234),
                fifty_two_week_high: Some(100.0),
                fifty_two_week_low: Some(50.0),
                market_cap: Some(1.0e12),
                industry: None,
                sector: None,
            })
        }

        async fn earnings_dates(&self, _symbol: &str) -> anyhow::Result<Option<Vec<DateTime<Utc>>>> {
            anyhow::bail!("quoteSummary unavailable")
        }
    }

    async fn serve() -> String {
        let categories = CategoryTable::from_entries([
            ("tech", vec!["AAPL", "MSFT", "GOOG"]),
            ("oil", vec!["XOM"]),
        ])
        .unwrap();
        let state = AppState {
            categories: Arc::new(categories),
            aggregator: QuoteAggregator::new(Arc::new(FakeProvider)),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn returns_records_in_category_order_with_isolated_failure() {
        let base = serve().await;
        let res = reqwest::get(format!("{base}/api/stocks/TECH")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);

        let body: Value = res.json().await.unwrap();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0]["Ticker"], json!("AAPL"));
        assert_eq!(rows[0]["HighToCurrentChange"], json!("-20.00%"));
        assert_eq!(rows[0]["CHANGE"], json!("-1.23%"));
        assert_eq!(rows[0]["Industry"], json!("N/A"));
        assert_eq!(rows[0]["EarningsDate"], json!("Earnings date not available"));

        assert_eq!(
            rows[1],
            json!({"Ticker": "MSFT", "error": "Failed to fetch data for ticker: MSFT"})
        );
        assert_eq!(rows[2]["Ticker"], json!("GOOG"));
    }

    #[tokio::test]
    async fn all_flattens_every_category() {
        let base = serve().await;
        let body: Value = reqwest::get(format!("{base}/api/stocks/all"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let tickers: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["Ticker"].as_str().unwrap())
            .collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "GOOG", "XOM"]);
    }

    #[tokio::test]
    async fn unknown_category_is_500_with_error_body() {
        let base = serve().await;
        let res = reqwest::get(format!("{base}/api/stocks/nonexistent"))
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Category 'nonexistent' not found."}));
    }

    #[tokio::test]
    async fn lists_categories_with_all_first() {
        let base = serve().await;
        let body: Value = reqwest::get(format!("{base}/api/categories"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!(["all", "tech", "oil"]));

        let health = reqwest::get(format!("{base}/healthz"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(health, "ok");
    }
}
