pub mod pages;
pub mod process;

use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn configure(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(pages::routes(state.clone()))
        .merge(process::routes(state))
}
