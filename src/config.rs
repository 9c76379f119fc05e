use std::time::Duration;

use serde::Deserialize;
use tracing::Level;

use crate::error::AppError;

const ENV_PREFIX: &str = "ISLR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub recognition: RecognitionSettings,
    pub sessions: SessionSettings,
    pub sentence: SentenceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub max_frames_per_batch: usize,
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: 16 * 1024 * 1024,
            max_frames_per_batch: 256,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub model_path: String,
    pub labels_path: String,
    pub input_name: String,
    pub output_name: String,
    pub intra_threads: usize,
    pub inference_timeout_ms: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: "assets/islr/model.onnx".to_string(),
            labels_path: "assets/islr/dict_sign.csv".to_string(),
            input_name: "inputs".to_string(),
            output_name: "outputs".to_string(),
            intra_threads: 2,
            inference_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// A batch whose first frame is at or before this many seconds starts a new session.
    pub reset_after_secs: f64,
    pub reset_label: String,
    pub unknown_label: String,
    /// Classifier labels that behave like "nothing recognized".
    pub noise_labels: Vec<String>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            reset_after_secs: 4.0,
            reset_label: "No Movement Detected".to_string(),
            unknown_label: "Unknown Sign".to_string(),
            noise_labels: vec!["jeans".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub idle_timeout_secs: u64,
    pub reap_interval_secs: u64,
    pub max_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            reap_interval_secs: 30,
            max_sessions: 1_024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentenceSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_ms: u64,
}

impl Default for SentenceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-pro".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl SentenceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    /// Layers the optional TOML file under `ISLR__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("recognition.noise_labels")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.inference_timeout_ms == 0 {
            return Err(AppError::Config(
                "Inference timeout must be greater than 0".to_string(),
            ));
        }
        if self.server.max_frames_per_batch == 0 {
            return Err(AppError::Config(
                "Max frames per batch must be greater than 0".to_string(),
            ));
        }
        if self.sessions.idle_timeout_secs == 0 || self.sessions.reap_interval_secs == 0 {
            return Err(AppError::Config(
                "Session idle timeout and reap interval must be greater than 0".to_string(),
            ));
        }
        if self.sessions.max_sessions == 0 {
            return Err(AppError::Config(
                "Max sessions must be greater than 0".to_string(),
            ));
        }
        if self.sentence.enabled && self.sentence.timeout_ms == 0 {
            return Err(AppError::Config(
                "Sentence timeout must be greater than 0".to_string(),
            ));
        }
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, AppError> {
        self.server
            .log_level
            .parse::<Level>()
            .map_err(|_| AppError::Config(format!("Unknown log level {}", self.server.log_level)))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.model.inference_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.sessions.idle_timeout_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.sessions.reap_interval_secs)
    }
}
