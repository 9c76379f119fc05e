use indexmap::IndexSet;
use serde::Serialize;

use crate::config::RecognitionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Accumulating,
}

/// The labels and threshold that drive resets.
#[derive(Debug, Clone)]
pub struct RecognitionPolicy {
    pub reset_after_secs: f64,
    pub reset_label: String,
    pub unknown_label: String,
    pub noise_labels: Vec<String>,
}

impl RecognitionPolicy {
    pub fn is_session_start(&self, first_frame_secs: f64) -> bool {
        first_frame_secs <= self.reset_after_secs
    }

    pub fn is_noise(&self, sign: &str) -> bool {
        sign.is_empty() || self.noise_labels.iter().any(|noise| noise == sign)
    }
}

impl From<&RecognitionSettings> for RecognitionPolicy {
    fn from(settings: &RecognitionSettings) -> Self {
        Self {
            reset_after_secs: settings.reset_after_secs,
            reset_label: settings.reset_label.clone(),
            unknown_label: settings.unknown_label.clone(),
            noise_labels: settings.noise_labels.clone(),
        }
    }
}

impl Default for RecognitionPolicy {
    fn default() -> Self {
        Self::from(&RecognitionSettings::default())
    }
}

/// Running sign and sentence for one session.
#[derive(Debug, Clone)]
pub struct RecognitionState {
    phase: Phase,
    current_sign: String,
    unique_signs: IndexSet<String>,
    sentence: String,
}

impl RecognitionState {
    pub fn new(reset_label: &str) -> Self {
        Self {
            phase: Phase::Idle,
            current_sign: reset_label.to_string(),
            unique_signs: IndexSet::new(),
            sentence: String::new(),
        }
    }

    pub fn reset(&mut self, reset_label: &str) {
        self.phase = Phase::Idle;
        self.current_sign = reset_label.to_string();
        self.unique_signs.clear();
        self.sentence.clear();
    }

    /// Folds one recognized sign into the state.
    pub fn observe(&mut self, sign: &str, policy: &RecognitionPolicy) {
        if policy.is_noise(sign) {
            self.reset(&policy.reset_label);
            return;
        }
        self.phase = Phase::Accumulating;
        self.current_sign = sign.to_string();
        self.unique_signs.insert(sign.to_string());
        // A lone sign is not a sentence yet.
        if self.unique_signs.len() > 1 {
            self.sentence = self.joined();
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_sign(&self) -> &str {
        &self.current_sign
    }

    pub fn unique_signs(&self) -> impl Iterator<Item = &str> {
        self.unique_signs.iter().map(String::as_str)
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn joined(&self) -> String {
        self.unique_signs().collect::<Vec<_>>().join(" ")
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            sign: self.current_sign.clone(),
            list_sign: self.unique_signs.iter().cloned().collect(),
            sentence: self.sentence.clone(),
            phase: self.phase,
        }
    }
}

/// The full state as exposed to callers after every batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub sign: String,
    pub list_sign: Vec<String>,
    pub sentence: String,
    #[serde(skip)]
    pub phase: Phase,
}
