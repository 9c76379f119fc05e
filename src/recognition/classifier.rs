use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::info;

use crate::config::ModelSettings;
use crate::error::AppError;
use crate::landmarks::InferenceTensor;

/// A pretrained sequence classifier scoring a landmark tensor over a closed label set.
///
/// Calls are blocking and CPU bound; the service layer moves them off the runtime.
pub trait Classifier: Send + Sync {
    fn classify(&self, tensor: &InferenceTensor) -> Result<Vec<f32>, AppError>;
    fn name(&self) -> &str;
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    name: String,
}

impl OnnxClassifier {
    pub fn load(settings: &ModelSettings) -> Result<Self, AppError> {
        let path = Path::new(&settings.model_path);
        if !path.exists() {
            return Err(AppError::Model(format!(
                "model file {} does not exist",
                path.display()
            )));
        }
        info!("Loading sign classifier from {}...", path.display());
        let session = Session::builder()
            .map_err(model_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_error)?
            .with_intra_threads(settings.intra_threads)
            .map_err(model_error)?
            .commit_from_file(path)
            .map_err(model_error)?;

        Ok(Self {
            session: Mutex::new(session),
            input_name: settings.input_name.clone(),
            output_name: settings.output_name.clone(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| settings.model_path.clone()),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, tensor: &InferenceTensor) -> Result<Vec<f32>, AppError> {
        let (shape, values) = tensor.to_shape_and_values();
        let input = Tensor::from_array((shape, values)).map_err(inference_error)?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Inference("classifier session poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(inference_error)?;
        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            AppError::Inference(format!("model has no output named {}", self.output_name))
        })?;
        let (_shape, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?;
        Ok(scores.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn model_error(error: impl Display) -> AppError {
    AppError::Model(error.to_string())
}

fn inference_error(error: impl Display) -> AppError {
    AppError::Inference(error.to_string())
}

/// Index of the first highest score. NaN scores never win.
pub fn arg_max(scores: &[f32]) -> Result<usize, AppError> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (index, &score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
        .ok_or_else(|| AppError::Inference("classifier returned no usable scores".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_max_picks_highest() {
        assert_eq!(arg_max(&[0.1, 0.7, 0.2]).unwrap(), 1);
    }

    #[test]
    fn arg_max_prefers_first_on_ties() {
        assert_eq!(arg_max(&[0.5, 0.1, 0.5]).unwrap(), 0);
    }

    #[test]
    fn arg_max_skips_nan() {
        assert_eq!(arg_max(&[f32::NAN, -3.0, -1.0]).unwrap(), 2);
    }

    #[test]
    fn arg_max_of_nothing_is_an_inference_error() {
        assert!(matches!(arg_max(&[]), Err(AppError::Inference(_))));
        assert!(matches!(arg_max(&[f32::NAN]), Err(AppError::Inference(_))));
    }

    #[test]
    fn missing_model_file_is_reported() {
        let settings = ModelSettings {
            model_path: "no/such/model.onnx".to_string(),
            ..ModelSettings::default()
        };
        assert!(matches!(
            OnnxClassifier::load(&settings),
            Err(AppError::Model(_))
        ));
    }
}
