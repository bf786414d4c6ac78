use axum::{
    extract::{Query, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use crate::models::{PoolRecord, YieldSnapshot};
use crate::services::view::{self, Page};
use crate::services::{CacheStatus, StatsView, YieldCollector};
use crate::sources::SourceError;

pub const CACHE_HEADER: &str = "x-cache";

pub struct AppState {
    pub collector: Arc<YieldCollector>,
    pub page_size: usize,
}

/// Every upstream failure looks the same to clients; detail only goes to the log.
pub struct ApiError(SourceError);

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Error fetching yields: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to fetch yields" })),
        )
            .into_response()
    }
}

fn with_cache_header(body: impl IntoResponse, status: CacheStatus) -> Response {
    (
        [(HeaderName::from_static(CACHE_HEADER), HeaderValue::from_static(status.as_str()))],
        body,
    )
        .into_response()
}

/// GET /api/yields - ranked stablecoin pools
async fn get_yields(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let (snapshot, status) = state.collector.retrieve().await?;
    let body: YieldSnapshot = (*snapshot).clone();
    Ok(with_cache_header(Json(body), status))
}

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ViewResponse {
    #[serde(flatten)]
    page: Page<PoolRecord>,
    timestamp: String,
}

/// GET /api/yields/view?q=&page= - searched, paginated table view
async fn get_yields_view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Response, ApiError> {
    let (snapshot, status) = state.collector.retrieve().await?;

    let matched: Vec<PoolRecord> = view::search(&snapshot.data, params.q.as_deref().unwrap_or(""))
        .into_iter()
        .cloned()
        .collect();
    let page = view::paginate(&matched, params.page.unwrap_or(1), state.page_size);

    let body = ViewResponse {
        page,
        timestamp: snapshot.timestamp_iso(),
    };
    Ok(with_cache_header(Json(body), status))
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

/// GET /stats
async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsView> {
    Json(state.collector.stats().view())
}

pub fn create_rest_router(state: Arc<AppState>, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route("/api/yields", get(get_yields))
        .route("/api/yields/view", get(get_yields_view))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    // after the fallback so static files get CORS headers too
    router.layer(CorsLayer::permissive())
}
