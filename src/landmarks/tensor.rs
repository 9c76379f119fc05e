use std::collections::BTreeSet;

use ndarray::{Array3, ArrayView3};

use super::frame::FrameObservation;
use super::normalize::{normalize_frame, NormalizedRow, POINTS_PER_FRAME};
use crate::error::AppError;

pub const CHANNELS: usize = 3;

/// `(frames, 543, 3)` coordinates in classifier layout.
#[derive(Debug, Clone)]
pub struct InferenceTensor {
    data: Array3<f32>,
}

impl InferenceTensor {
    /// Stacks normalized rows, already sorted by `(frame, kind, landmark_index)`.
    pub fn from_sorted_rows(rows: &[NormalizedRow], frames: usize) -> Result<Self, AppError> {
        let shape_error = || AppError::Shape {
            rows: rows.len(),
            frames,
            points: POINTS_PER_FRAME,
        };
        if frames == 0 || rows.len() != frames * POINTS_PER_FRAME {
            return Err(shape_error());
        }
        let values: Vec<f32> = rows.iter().flat_map(|row| row.xyz()).collect();
        let data = Array3::from_shape_vec((frames, POINTS_PER_FRAME, CHANNELS), values)
            .map_err(|_| shape_error())?;
        Ok(Self { data })
    }

    pub fn frames(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Shape and row-major values, the form `ort` tensors are built from.
    pub fn to_shape_and_values(&self) -> (Vec<i64>, Vec<f32>) {
        let shape = self.data.shape().iter().map(|&d| d as i64).collect();
        let values = self.data.iter().copied().collect();
        (shape, values)
    }
}

/// Normalizes every frame of the batch and stacks them into one tensor.
///
/// Row order is fixed by sorting, so the result does not depend on frame arrival
/// order. Frames sharing a frame number produce more rows than distinct frames
/// can hold and are reported as a shape error.
pub fn assemble(frames: &[FrameObservation]) -> Result<InferenceTensor, AppError> {
    let mut rows: Vec<NormalizedRow> = frames
        .iter()
        .flat_map(|frame| normalize_frame(frame).into_rows())
        .collect();
    rows.sort_by_key(NormalizedRow::sort_key);

    let distinct_frames = rows.iter().map(|row| row.frame).collect::<BTreeSet<_>>().len();
    InferenceTensor::from_sorted_rows(&rows, distinct_frames)
}
