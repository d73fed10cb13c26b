use crate::state::AppState;
use a2ui::errors::AgentError;
use a2ui::models::message::HistoryTurn;
use a2ui::samples::{Reply, Sample};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    user_message: String,
    #[serde(default)]
    history: HistoryInput,
}

/// Prior turns, either as a list or as the JSON-encoded list older pages send
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryInput {
    Turns(Vec<HistoryTurn>),
    Encoded(String),
}

impl Default for HistoryInput {
    fn default() -> Self {
        HistoryInput::Turns(Vec::new())
    }
}

impl HistoryInput {
    /// An unreadable encoded history counts as no history
    fn into_turns(self) -> Vec<HistoryTurn> {
        match self {
            HistoryInput::Turns(turns) => turns,
            HistoryInput::Encoded(raw) if raw.trim().is_empty() => Vec::new(),
            HistoryInput::Encoded(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Invalid history JSON: {}", e);
                Vec::new()
            }),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn status_for(error: &AgentError) -> StatusCode {
    match error {
        AgentError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
        AgentError::Provider(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn process(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ProcessRequest>,
) -> Response {
    let Some((sample, app)) = Sample::from_str(&name)
        .ok()
        .and_then(|sample| state.app(sample).map(|app| (sample, app)))
    else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown sample: {}", name));
    };

    let history = request.history.into_turns();
    let user_message = request.user_message;
    info!("{} request with {} prior turn(s)", sample, history.len());

    // the conversation loop blocks on the model endpoint
    let result: Result<Reply, AgentError> =
        match tokio::task::spawn_blocking(move || app.process(&user_message, &history)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Request worker failed: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Request worker failed");
            }
        };

    match result {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            warn!("{} request failed: {}", sample, e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/:sample/process", post(process))
        .with_state(state)
}
