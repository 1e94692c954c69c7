use std::path::{Path, PathBuf};

use gradecast_classifiers::pipeline::Pipeline;

/// Read-only service state, shared behind the router's `Arc`.
///
/// The pipeline is loaded once at startup. When loading fails the service
/// still starts; `model` stays `None` and every prediction is refused.
pub struct AppState {
    pub model: Option<Pipeline>,
    pub model_path: PathBuf,
}

impl AppState {
    /// Load the artifact at `model_path`, logging instead of failing.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Self {
        let model_path = model_path.as_ref().to_path_buf();
        let model = match Pipeline::load(&model_path) {
            Ok(pipeline) => {
                log::info!(
                    "Loaded {} pipeline from {} (trained {})",
                    pipeline.model_name(),
                    model_path.display(),
                    pipeline.trained_at().to_rfc3339()
                );
                Some(pipeline)
            }
            Err(e) => {
                log::error!(
                    "Failed to load model from {}: {}. Predictions will be unavailable.",
                    model_path.display(),
                    e
                );
                None
            }
        };
        AppState { model, model_path }
    }

    pub fn with_model<P: AsRef<Path>>(pipeline: Pipeline, model_path: P) -> Self {
        AppState {
            model: Some(pipeline),
            model_path: model_path.as_ref().to_path_buf(),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }
}
