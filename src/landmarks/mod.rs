pub mod frame;
pub mod normalize;
pub mod tensor;

pub use frame::{FrameObservation, LandmarkGroup, LandmarkKind, LandmarkPoint};
pub use normalize::{
    expand_groups, normalize_frame, NormalizedFrameTable, NormalizedRow, POINTS_PER_FRAME,
};
pub use tensor::{assemble, InferenceTensor};
