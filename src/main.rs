//! News aggregator service: binary entrypoint.
//! Boots the Axum HTTP server with the aggregator as shared state.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use news_aggregator::api::{create_router, AppState};
use news_aggregator::metrics::Metrics;
use news_aggregator::{config, logging, Aggregator};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let cfg = config::load_default().context("loading news config")?;
    let aggregator = Aggregator::from_config(&cfg).context("building aggregator")?;
    let metrics = Metrics::init(cfg.cache_ttl_secs)?;

    tracing::info!(sources = ?aggregator.source_names(), "news service starting");

    let router = create_router(AppState::new(aggregator)).merge(metrics.router());
    Ok(router.into())
}
