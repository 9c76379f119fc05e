use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;
use uuid::Uuid;

use super::response::{
    HealthResponse, PredictionResponse, SentenceResponse, SessionCreated, SessionInfo,
    StatusResponse,
};
use super::AppState;
use crate::error::AppError;
use crate::landmarks::FrameObservation;

pub const SESSION_HEADER: &str = "x-session-id";

/// Session named by the request header, or a fresh one when the header is absent.
///
/// The flag is true when the session was created for this request.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<(Uuid, bool), AppError> {
    match headers.get(SESSION_HEADER) {
        Some(value) => {
            let raw = value.to_str().map_err(|_| {
                AppError::Validation(format!("{} header is not valid text", SESSION_HEADER))
            })?;
            let id = Uuid::parse_str(raw.trim()).map_err(|_| {
                AppError::Validation(format!("{} header `{}` is not a UUID", SESSION_HEADER, raw))
            })?;
            state.sessions.get(id)?;
            Ok((id, false))
        }
        None => Ok((state.sessions.create()?, true)),
    }
}

pub async fn predict_sequence(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Vec<FrameObservation>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(frames) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let (session_id, created) = resolve_session(&state, &headers)?;
    let handle = state.sessions.get(session_id)?;

    let mut session = handle.lock().await;
    session.touch();
    debug!(
        "Session {} batch {} with {} frames",
        session_id,
        session.batches() + 1,
        frames.len()
    );
    let result = state.recognizer.recognize(&mut session.state, frames).await;
    let snapshot = match result {
        Ok(snapshot) => {
            session.record_batch();
            snapshot
        }
        Err(e) => {
            drop(session);
            // Nobody learns the id of a session created by a failed request.
            if created {
                if let Err(remove_err) = state.sessions.remove(session_id) {
                    debug!("Rejected batch left nothing to clean up: {}", remove_err);
                }
            }
            return Err(e);
        }
    };
    drop(session);

    Ok((
        [(SESSION_HEADER, session_id.to_string())],
        Json(PredictionResponse {
            status: 200,
            session_id,
            state: snapshot,
        }),
    ))
}

pub async fn create_session(State(state): State<AppState>) -> Result<Json<SessionCreated>, AppError> {
    let session_id = state.sessions.create()?;
    Ok(Json(SessionCreated {
        status: 200,
        session_id,
    }))
}

pub async fn session_info(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionInfo>, AppError> {
    let handle = state.sessions.get(session_id)?;
    let session = handle.lock().await;
    Ok(Json(SessionInfo {
        status: 200,
        session_id,
        created_at: session.created_at(),
        batches: session.batches(),
        state: session.state.snapshot(),
    }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    state.sessions.remove(session_id)?;
    Ok(Json(StatusResponse { status: 200 }))
}

pub async fn compose_sentence(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SentenceResponse>, AppError> {
    let handle = state.sessions.get(session_id)?;
    // The smoother call is slow, so the session is released before it.
    let words = handle.lock().await.state.snapshot().list_sign;
    let composed = state.composer.compose(&words).await;
    Ok(Json(SentenceResponse {
        status: 200,
        session_id,
        list_sign: words,
        sentence: composed.sentence,
        source: composed.source,
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: 200,
        model: state.recognizer.model_name().to_string(),
        labels: state.recognizer.label_count(),
        sessions: state.sessions.len(),
        sentence_smoother: state.composer.is_enabled(),
    })
}
