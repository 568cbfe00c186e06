use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use testpool_pool::FixturePool;

use crate::report;

struct AppState {
    pool: FixturePool,
    data_dir: PathBuf,
}

/// Serve the dashboard API: pool status, cleanup, and the run log. Thin
/// pass-throughs over the pool manager; no extra logic lives here.
pub async fn serve(pool: FixturePool, data_dir: PathBuf, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState { pool, data_dir });
    let app = Router::new()
        .route("/api/pool-status", get(pool_status))
        .route("/api/cleanup", post(cleanup))
        .route("/api/test-results", get(test_results))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("dashboard API listening on http://localhost:{port}/api");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn pool_status(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.pool.status().await {
        Ok(status) => (
            StatusCode::OK,
            Json(json!({ "success": true, "status": status })),
        ),
        Err(err) => failure(err.to_string()),
    }
}

async fn cleanup(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.pool.cleanup().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Data pool cleaned up successfully"
            })),
        ),
        Err(err) => failure(err.to_string()),
    }
}

async fn test_results(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match report::read_results_recent_first(&state.data_dir).await {
        Ok(results) => (
            StatusCode::OK,
            Json(json!({ "success": true, "results": results })),
        ),
        Err(err) => failure(err.to_string()),
    }
}

fn failure(error: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": error })),
    )
}
