use std::sync::Arc;

use islr_rust::config::Settings;
use islr_rust::error::AppError;
use islr_rust::http::{self, AppState, Server};
use islr_rust::recognition::{OnnxClassifier, SignLabelTable, SignRecognizer};
use islr_rust::sentence::SentenceComposer;
use islr_rust::session::{SessionReaper, SessionStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

const DEFAULT_CONFIG_PATH: &str = "islr.toml";

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = Settings::load(&config_path)?;
    init_logging(settings.log_level()?);
    info!("Loaded settings from {} and environment", config_path);

    let labels = SignLabelTable::load(&settings.model.labels_path)?;
    let classifier = Arc::new(OnnxClassifier::load(&settings.model)?);
    let recognizer = SignRecognizer::builder(classifier, labels)
        .settings(&settings)
        .build();

    let sessions = SessionStore::new(
        &settings.recognition.reset_label,
        settings.idle_timeout(),
        settings.sessions.max_sessions,
    );
    let composer = SentenceComposer::from_settings(&settings.sentence);

    let cancel_token = CancellationToken::new();
    let reaper = SessionReaper::start(
        sessions.clone(),
        settings.reap_interval(),
        cancel_token.clone(),
    );

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown_token.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    let state = AppState::new(sessions, recognizer, composer);
    let router = http::router(state, settings.server.max_body_bytes);
    let result = Server::new(settings.bind_address(), router)
        .start(cancel_token.clone())
        .await;

    cancel_token.cancel();
    reaper.stop().await;
    result
}
