use std::time::Duration;

use thiserror::Error;
use tower::BoxError;
use uuid::Uuid;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid frame batch: {0}")]
    Validation(String),
    #[error("Cannot shape {rows} landmark rows into {frames} frames of {points} points")]
    Shape {
        rows: usize,
        frames: usize,
        points: usize,
    },
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Inference timed out after {0:?}")]
    InferenceTimeout(Duration),
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),
    #[error("Session limit of {0} reached")]
    SessionLimit(usize),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to load model: {0}")]
    Model(String),
    #[error("Failed to load sign labels: {0}")]
    Labels(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to bind to {1}: {0}")]
    Bind(std::io::Error, String),
}

impl AppError {
    /// Recovers the typed error from a boxed tower service failure.
    pub fn from_service_error(error: BoxError, timeout: Duration) -> Self {
        if error.is::<tower::timeout::error::Elapsed>() {
            return AppError::InferenceTimeout(timeout);
        }
        match error.downcast::<AppError>() {
            Ok(app_error) => *app_error,
            Err(other) => AppError::Inference(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

// Sentence smoother failures never reach the caller, the joined sentence is used instead.
#[derive(Error, Debug)]
pub enum SentenceError {
    #[error("Sentence service request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Sentence service returned no text")]
    EmptyResponse,
    #[error("Sentence service API key variable {0} is not set")]
    MissingApiKey(String),
    #[error("Sentence service timed out after {0:?}")]
    Timeout(Duration),
}
