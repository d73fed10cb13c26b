use crate::state::AppState;
use a2ui::prompt_template::load_prompt;
use a2ui::samples::Sample;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::str::FromStr;

const PAGE: &str = include_str!("../pages/sample.html");

#[derive(Debug, Serialize)]
struct SampleEntry {
    name: String,
    title: &'static str,
    page: String,
    process: String,
}

async fn list_samples(State(state): State<AppState>) -> Json<Vec<SampleEntry>> {
    Json(
        state
            .samples()
            .into_iter()
            .map(|sample| SampleEntry {
                name: sample.to_string(),
                title: sample.title(),
                page: format!("/{}", sample),
                process: format!("/{}/process", sample),
            })
            .collect(),
    )
}

async fn serve_page(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let Some(sample) = Sample::from_str(&name)
        .ok()
        .filter(|sample| state.app(*sample).is_some())
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Unknown sample: {}", name) })),
        )
            .into_response();
    };

    match load_prompt(PAGE, &json!({ "title": sample.title(), "sample": sample.to_string() })) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page for {}: {:?}", sample, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to render page" })),
            )
                .into_response()
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_samples))
        .route("/:sample", get(serve_page))
        .with_state(state)
}
