use std::time::{Duration, Instant};

use super::classifier::arg_max;
use crate::error::AppError;
use crate::landmarks::{assemble, FrameObservation, InferenceTensor};

// Markers to track how far a batch has travelled through recognition
pub struct Received {
    frames: Vec<FrameObservation>,
}
pub struct Assembled {
    frames: usize,
}
pub struct Classified {
    frames: usize,
    sign_index: usize,
    top_score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct BatchMetrics {
    pub assembly: Duration,
    pub inference: Duration,
}

/// One predict call's batch with compile-time stage tracking.
pub struct BatchContext<S> {
    metrics: BatchMetrics,
    processing_start: Instant,
    stage: S,
}

impl<S> BatchContext<S> {
    pub fn metrics(&self) -> &BatchMetrics {
        &self.metrics
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }
}

impl BatchContext<Received> {
    /// Validates the batch as a whole and every frame in it.
    pub fn new(frames: Vec<FrameObservation>, max_frames: usize) -> Result<Self, AppError> {
        if frames.is_empty() {
            return Err(AppError::Validation("batch contains no frames".to_string()));
        }
        if frames.len() > max_frames {
            return Err(AppError::Validation(format!(
                "batch contains {} frames, at most {} are accepted",
                frames.len(),
                max_frames
            )));
        }
        for frame in &frames {
            frame.validate()?;
        }
        Ok(Self {
            metrics: BatchMetrics::default(),
            processing_start: Instant::now(),
            stage: Received { frames },
        })
    }

    /// Timestamp of the first frame as sent, before any reordering.
    pub fn first_frame_secs(&self) -> f64 {
        self.stage.frames[0].time_in_seconds
    }

    pub fn into_assembled(mut self) -> Result<(BatchContext<Assembled>, InferenceTensor), AppError> {
        let start = Instant::now();
        let tensor = assemble(&self.stage.frames)?;
        self.metrics.assembly = start.elapsed();
        Ok((
            BatchContext {
                metrics: self.metrics,
                processing_start: self.processing_start,
                stage: Assembled {
                    frames: tensor.frames(),
                },
            },
            tensor,
        ))
    }
}

impl BatchContext<Assembled> {
    pub fn frames(&self) -> usize {
        self.stage.frames
    }

    pub fn into_classified(
        mut self,
        scores: &[f32],
        inference: Duration,
    ) -> Result<BatchContext<Classified>, AppError> {
        let sign_index = arg_max(scores)?;
        self.metrics.inference = inference;
        Ok(BatchContext {
            metrics: self.metrics,
            processing_start: self.processing_start,
            stage: Classified {
                frames: self.stage.frames,
                sign_index,
                top_score: scores[sign_index],
            },
        })
    }
}

impl BatchContext<Classified> {
    pub fn frames(&self) -> usize {
        self.stage.frames
    }

    pub fn sign_index(&self) -> usize {
        self.stage.sign_index
    }

    pub fn top_score(&self) -> f32 {
        self.stage.top_score
    }
}
