pub mod config;
pub mod error;
pub mod http;
pub mod landmarks;
pub mod recognition;
pub mod sentence;
pub mod session;

pub use config::Settings;
pub use error::{AppError, SentenceError};
pub use landmarks::{FrameObservation, InferenceTensor, LandmarkKind, LandmarkPoint};
pub use recognition::{Classifier, OnnxClassifier, RecognitionState, SignLabelTable, SignRecognizer};
pub use session::SessionStore;
