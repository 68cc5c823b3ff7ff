pub mod model;

pub use model::{LeafModel, ModelLoadError};

use ndarray::Array4;

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Model error: {0}")]
    Model(#[from] tch::TchError),
    #[error("Model returned an empty output tensor")]
    EmptyOutput,
    #[error("Model returned a non-finite prediction")]
    NonFinite,
}

/// Seam between the pipeline and the loaded classifier: a synchronous,
/// side-effect-free map from an input tensor to a raw probability.
pub trait Predictor: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<f32, PredictionError>;
}
