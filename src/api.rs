use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregator::Aggregator;
use crate::export::{to_views, ArticleView};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/news", get(news))
        .route("/news/{source}", get(news_by_source))
        .route("/sources", get(sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, serde::Deserialize)]
struct NewsQuery {
    /// Bypass the cache freshness check.
    #[serde(default)]
    refresh: bool,
    #[serde(default)]
    limit: Option<usize>,
}

fn limited(mut views: Vec<ArticleView>, limit: Option<usize>) -> Vec<ArticleView> {
    if let Some(n) = limit {
        views.truncate(n);
    }
    views
}

async fn news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Json<Vec<ArticleView>> {
    let feed = if q.refresh {
        state.aggregator.refresh_all().await
    } else {
        state.aggregator.fetch_all().await
    };
    Json(limited(to_views(&feed), q.limit))
}

async fn news_by_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Query(q): Query<NewsQuery>,
) -> Response {
    let res = if q.refresh {
        state.aggregator.refresh_source(&source).await
    } else {
        state.aggregator.fetch_by_source(&source).await
    };
    match res {
        Ok(articles) => Json(limited(to_views(&articles), q.limit)).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn sources(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.aggregator.source_names())
}
