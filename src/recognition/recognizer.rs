use std::sync::Arc;
use std::time::{Duration, Instant};

use tower::ServiceExt;
use tracing::debug;

use super::context::BatchContext;
use super::labels::SignLabelTable;
use super::service::{ClassifierStack, ClassifierStackBuilder};
use super::state::{RecognitionPolicy, RecognitionState, StateSnapshot};
use super::Classifier;
use crate::config::Settings;
use crate::error::AppError;
use crate::landmarks::FrameObservation;

/// Turns landmark batches into signs and folds them into a session's state.
#[derive(Clone)]
pub struct SignRecognizer {
    classifier: ClassifierStack,
    labels: Arc<SignLabelTable>,
    policy: RecognitionPolicy,
    timeout: Duration,
    max_frames: usize,
    model_name: String,
}

impl SignRecognizer {
    pub fn builder(classifier: Arc<dyn Classifier>, labels: SignLabelTable) -> SignRecognizerBuilder {
        SignRecognizerBuilder::new(classifier, labels)
    }

    pub fn policy(&self) -> &RecognitionPolicy {
        &self.policy
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Runs one batch and returns the session's full state afterwards.
    ///
    /// A batch that opens a new recording resets the state before inference, so
    /// the reset stands even when the batch itself is rejected later on.
    pub async fn recognize(
        &self,
        state: &mut RecognitionState,
        frames: Vec<FrameObservation>,
    ) -> Result<StateSnapshot, AppError> {
        let received = BatchContext::new(frames, self.max_frames)?;
        if self.policy.is_session_start(received.first_frame_secs()) {
            debug!(
                "Batch starts at {}s, resetting recognition state",
                received.first_frame_secs()
            );
            state.reset(&self.policy.reset_label);
        }

        let (assembled, tensor) = received.into_assembled()?;
        let inference_start = Instant::now();
        let scores = self
            .classifier
            .clone()
            .oneshot(tensor)
            .await
            .map_err(|e| AppError::from_service_error(e, self.timeout))?;
        let classified = assembled.into_classified(&scores, inference_start.elapsed())?;

        let sign = match self.labels.get(classified.sign_index()) {
            Some(sign) => sign,
            None => {
                debug!(
                    "Label table has no entry for index {}",
                    classified.sign_index()
                );
                self.policy.unknown_label.as_str()
            }
        };
        state.observe(sign, &self.policy);

        let metrics = classified.metrics();
        debug!(
            "Recognized '{}' (index {}, score {:.3}) from {} frames: assembly {}us, inference {}us, total {}us",
            sign,
            classified.sign_index(),
            classified.top_score(),
            classified.frames(),
            metrics.assembly.as_micros(),
            metrics.inference.as_micros(),
            classified.elapsed().as_micros()
        );
        Ok(state.snapshot())
    }
}

pub struct SignRecognizerBuilder {
    classifier: Arc<dyn Classifier>,
    labels: SignLabelTable,
    policy: RecognitionPolicy,
    timeout: Duration,
    max_frames: usize,
}

impl SignRecognizerBuilder {
    pub fn new(classifier: Arc<dyn Classifier>, labels: SignLabelTable) -> Self {
        Self {
            classifier,
            labels,
            policy: RecognitionPolicy::default(),
            timeout: Duration::from_secs(2),
            max_frames: 256,
        }
    }

    // Takes policy, timeout and batch limit from the settings.
    pub fn settings(self, settings: &Settings) -> Self {
        self.policy(RecognitionPolicy::from(&settings.recognition))
            .timeout(settings.inference_timeout())
            .max_frames(settings.server.max_frames_per_batch)
    }

    pub fn policy(mut self, policy: RecognitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn build(self) -> SignRecognizer {
        let model_name = self.classifier.name().to_string();
        let classifier = ClassifierStackBuilder::new(self.classifier)
            .timeout(self.timeout)
            .build();
        SignRecognizer {
            classifier,
            labels: Arc::new(self.labels),
            policy: self.policy,
            timeout: self.timeout,
            max_frames: self.max_frames,
            model_name,
        }
    }
}
