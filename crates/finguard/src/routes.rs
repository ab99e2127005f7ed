use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use finguard_agents::QueryOrchestrator;
use finguard_models::{AnalyzeRequest, QueryResult};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::api_error::ApiError;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<QueryOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: QueryOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

pub fn router(state: AppState, static_dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/analyze", post(analyze))
        .nest_service("/static", ServeDir::new(static_dir.into()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Runs the query on its own task so a panic inside the agent surfaces as a
/// 500 instead of dropping the connection.
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let task = tokio::spawn(async move {
        orchestrator
            .run(&request.agent_type, &request.query)
            .await
    });

    match task.await {
        Ok(result) => Ok(Json(result?)),
        Err(e) => {
            error!(error = %e, "Query task failed");
            Err(ApiError::Internal)
        }
    }
}
