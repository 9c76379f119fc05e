pub mod classifier;
pub mod context;
pub mod instrument;
pub mod labels;
pub mod recognizer;
pub mod service;
pub mod state;

pub use classifier::{arg_max, Classifier, OnnxClassifier};
pub use labels::SignLabelTable;
pub use recognizer::{SignRecognizer, SignRecognizerBuilder};
pub use service::{ClassifierService, ClassifierStack, ClassifierStackBuilder};
pub use state::{Phase, RecognitionPolicy, RecognitionState, StateSnapshot};
