//! HTTP request handlers

use super::types::{ErrorResponse, RelayReply, RelayRequest, VersionResponse};
use super::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Body returned for every upstream failure; upstream detail stays in the logs
pub const UPSTREAM_ERROR_MESSAGE: &str = "Error communicating with dialogue service";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(send_chat))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayReply>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Message must not be empty".to_string(),
        ));
    }

    match state.gateway.forward(&req.message).await {
        Ok(reply) => Ok(Json(RelayReply { reply })),
        Err(e) => {
            tracing::error!(
                endpoint = %state.gateway.endpoint(),
                kind = ?e.kind,
                error = %e,
                "Failed to forward message"
            );
            Err(AppError::Upstream)
        }
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Upstream,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream => (
                StatusCode::INTERNAL_SERVER_ERROR,
                UPSTREAM_ERROR_MESSAGE.to_string(),
            ),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
