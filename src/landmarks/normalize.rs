use super::frame::{FrameObservation, LandmarkGroup, LandmarkKind};

/// Face indices at or above this are iris refinements the classifier never saw.
pub const RETAINED_INDEX_LIMIT: usize = 468;

/// Rows per frame before the iris filter: 478 + 33 + 21 + 21.
pub const ROWS_PER_FRAME_UNFILTERED: usize = 553;

/// Points per frame after the iris filter, the classifier's second axis.
pub const POINTS_PER_FRAME: usize = 543;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRow {
    pub landmark_index: usize,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub kind: LandmarkKind,
    pub frame: i64,
}

impl NormalizedRow {
    fn missing(landmark_index: usize, kind: LandmarkKind, frame: i64) -> Self {
        Self {
            landmark_index,
            x: f32::NAN,
            y: f32::NAN,
            z: f32::NAN,
            kind,
            frame,
        }
    }

    /// Ordering key used when stacking frames.
    pub fn sort_key(&self) -> (i64, LandmarkKind, usize) {
        (self.frame, self.kind, self.landmark_index)
    }

    pub fn xyz(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    // NaN != NaN, so tests compare bit patterns.
    #[cfg(test)]
    pub(crate) fn same_bits(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedFrameTable {
    frame: i64,
    rows: Vec<NormalizedRow>,
}

impl NormalizedFrameTable {
    pub fn frame(&self) -> i64 {
        self.frame
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<NormalizedRow> {
        self.rows
    }
}

/// Emits every group of the frame, synthesizing a NaN block for each missing one.
pub fn expand_groups(frame: &FrameObservation) -> Vec<NormalizedRow> {
    let frame_number = frame.frame_number;
    let mut rows = Vec::with_capacity(ROWS_PER_FRAME_UNFILTERED);
    for kind in LandmarkKind::ALL {
        match frame.group(kind) {
            LandmarkGroup::Observed(points) => {
                rows.extend(points.iter().enumerate().map(|(index, point)| NormalizedRow {
                    landmark_index: index,
                    x: point.x,
                    y: point.y,
                    z: point.z.unwrap_or(f32::NAN),
                    kind,
                    frame: frame_number,
                }));
            }
            LandmarkGroup::Missing => {
                rows.extend(
                    (0..kind.expected_count())
                        .map(|index| NormalizedRow::missing(index, kind, frame_number)),
                );
            }
        }
    }
    rows
}

pub fn normalize_frame(frame: &FrameObservation) -> NormalizedFrameTable {
    let mut rows = expand_groups(frame);
    rows.retain(|row| row.landmark_index < RETAINED_INDEX_LIMIT);
    NormalizedFrameTable {
        frame: frame.frame_number,
        rows,
    }
}
