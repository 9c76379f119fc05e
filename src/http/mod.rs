pub mod handlers;
pub mod response;
pub mod server;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::recognition::SignRecognizer;
use crate::sentence::SentenceComposer;
use crate::session::SessionStore;

pub use handlers::SESSION_HEADER;
pub use server::Server;

/// Shared, read-mostly resources handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub recognizer: Arc<SignRecognizer>,
    pub composer: SentenceComposer,
}

impl AppState {
    pub fn new(
        sessions: SessionStore,
        recognizer: SignRecognizer,
        composer: SentenceComposer,
    ) -> Self {
        Self {
            sessions,
            recognizer: Arc::new(recognizer),
            composer,
        }
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/predict-sequence", post(handlers::predict_sequence))
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/{id}",
            get(handlers::session_info).delete(handlers::delete_session),
        )
        .route("/sessions/{id}/sentence", post(handlers::compose_sentence))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
