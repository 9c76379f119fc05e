use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// One tracked point at one instant. `visibility` is carried on the wire but unused by inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: Option<f32>,
    #[serde(default)]
    pub visibility: Option<f32>,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            visibility: None,
        }
    }
}

/// Landmark group kinds, declared in the channel order the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    Face,
    LeftHand,
    Pose,
    RightHand,
}

impl LandmarkKind {
    pub const ALL: [LandmarkKind; 4] = [
        LandmarkKind::Face,
        LandmarkKind::LeftHand,
        LandmarkKind::Pose,
        LandmarkKind::RightHand,
    ];

    pub const fn expected_count(self) -> usize {
        match self {
            LandmarkKind::Face => 478,
            LandmarkKind::Pose => 33,
            LandmarkKind::LeftHand | LandmarkKind::RightHand => 21,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LandmarkKind::Face => "face",
            LandmarkKind::LeftHand => "left_hand",
            LandmarkKind::Pose => "pose",
            LandmarkKind::RightHand => "right_hand",
        }
    }
}

impl fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence of one landmark group in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LandmarkGroup<'a> {
    Observed(&'a [LandmarkPoint]),
    Missing,
}

impl<'a> LandmarkGroup<'a> {
    // Empty arrays mean tracking was lost, same as an absent field.
    fn from_field(field: &'a Option<Vec<LandmarkPoint>>) -> Self {
        match field.as_deref() {
            Some(points) if !points.is_empty() => LandmarkGroup::Observed(points),
            _ => LandmarkGroup::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameObservation {
    pub time_in_seconds: f64,
    pub frame_number: i64,
    #[serde(default)]
    pub pose_landmarks: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub face_landmarks: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub left_hand_landmarks: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub right_hand_landmarks: Option<Vec<LandmarkPoint>>,
}

impl FrameObservation {
    /// A frame with no landmark groups tracked.
    pub fn empty(frame_number: i64, time_in_seconds: f64) -> Self {
        Self {
            time_in_seconds,
            frame_number,
            pose_landmarks: None,
            face_landmarks: None,
            left_hand_landmarks: None,
            right_hand_landmarks: None,
        }
    }

    pub fn with_group(mut self, kind: LandmarkKind, points: Vec<LandmarkPoint>) -> Self {
        *self.field_mut(kind) = Some(points);
        self
    }

    pub fn group(&self, kind: LandmarkKind) -> LandmarkGroup<'_> {
        let field = match kind {
            LandmarkKind::Face => &self.face_landmarks,
            LandmarkKind::LeftHand => &self.left_hand_landmarks,
            LandmarkKind::Pose => &self.pose_landmarks,
            LandmarkKind::RightHand => &self.right_hand_landmarks,
        };
        LandmarkGroup::from_field(field)
    }

    fn field_mut(&mut self, kind: LandmarkKind) -> &mut Option<Vec<LandmarkPoint>> {
        match kind {
            LandmarkKind::Face => &mut self.face_landmarks,
            LandmarkKind::LeftHand => &mut self.left_hand_landmarks,
            LandmarkKind::Pose => &mut self.pose_landmarks,
            LandmarkKind::RightHand => &mut self.right_hand_landmarks,
        }
    }

    /// Rejects frames whose observed groups do not match the fixed group sizes.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.time_in_seconds.is_finite() {
            return Err(AppError::Validation(format!(
                "frame {} has a non-finite timeInSeconds",
                self.frame_number
            )));
        }
        for kind in LandmarkKind::ALL {
            if let LandmarkGroup::Observed(points) = self.group(kind) {
                if points.len() != kind.expected_count() {
                    return Err(AppError::Validation(format!(
                        "frame {} has {} {} landmarks, expected {}",
                        self.frame_number,
                        points.len(),
                        kind,
                        kind.expected_count()
                    )));
                }
            }
        }
        Ok(())
    }
}
