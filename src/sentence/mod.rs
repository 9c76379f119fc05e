pub mod generative;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::config::SentenceSettings;
use crate::error::SentenceError;

pub use generative::GenerativeSmoother;

/// Best-effort rewrite of recognized signs into natural language.
#[async_trait]
pub trait SentenceSmoother: Send + Sync {
    async fn smooth(&self, words: &[String]) -> Result<String, SentenceError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSource {
    Smoother,
    Joined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedSentence {
    pub sentence: String,
    pub source: SentenceSource,
}

/// Produces a sentence for a sign list, falling back to the words joined by spaces.
#[derive(Clone, Default)]
pub struct SentenceComposer {
    smoother: Option<Arc<dyn SentenceSmoother>>,
    timeout: Duration,
}

impl SentenceComposer {
    pub fn new(smoother: Arc<dyn SentenceSmoother>, timeout: Duration) -> Self {
        Self {
            smoother: Some(smoother),
            timeout,
        }
    }

    /// A composer that only ever joins words.
    pub fn joined_only() -> Self {
        Self::default()
    }

    /// Builds the configured smoother. Setup failures disable smoothing rather than startup.
    pub fn from_settings(settings: &SentenceSettings) -> Self {
        if !settings.enabled {
            return Self::joined_only();
        }
        match GenerativeSmoother::from_settings(settings) {
            Ok(smoother) => Self::new(Arc::new(smoother), settings.timeout()),
            Err(e) => {
                warn!("Sentence smoother disabled: {}", e);
                Self::joined_only()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.smoother.is_some()
    }

    pub async fn compose(&self, words: &[String]) -> ComposedSentence {
        let joined = ComposedSentence {
            sentence: words.join(" "),
            source: SentenceSource::Joined,
        };
        let Some(smoother) = &self.smoother else {
            return joined;
        };
        if words.is_empty() {
            return joined;
        }

        let result = tokio::time::timeout(self.timeout, smoother.smooth(words))
            .await
            .unwrap_or(Err(SentenceError::Timeout(self.timeout)));
        match result {
            Ok(sentence) => ComposedSentence {
                sentence,
                source: SentenceSource::Smoother,
            },
            Err(e) => {
                warn!(
                    "Sentence smoother '{}' failed, using joined words: {}",
                    smoother.name(),
                    e
                );
                joined
            }
        }
    }
}
