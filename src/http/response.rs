use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::recognition::StateSnapshot;
use crate::sentence::SentenceSource;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub status: u16,
    pub session_id: Uuid,
    #[serde(flatten)]
    pub state: StateSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub status: u16,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub status: u16,
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub batches: u64,
    #[serde(flatten)]
    pub state: StateSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SentenceResponse {
    pub status: u16,
    pub session_id: Uuid,
    pub list_sign: Vec<String>,
    pub sentence: String,
    pub source: SentenceSource,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: u16,
    pub model: String,
    pub labels: usize,
    pub sessions: usize,
    pub sentence_smoother: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Shape { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InferenceTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        let body = ErrorBody {
            status: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
