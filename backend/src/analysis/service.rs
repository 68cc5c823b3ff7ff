use std::sync::Arc;

use ndarray::Array4;

use crate::analysis::decode::{DecodeError, decode_image};
use crate::analysis::preprocess::prepare;
use crate::analysis::validate::{RejectionReason, validate};
use crate::analysis::verdict::{LeafAnalysis, build_verdict};
use crate::inference::Predictor;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("ML Model not available")]
    ModelUnavailable,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{message}")]
    ValidationRejected {
        reason: RejectionReason,
        message: String,
    },
    #[error("Model prediction failed: {0}")]
    PredictionFailed(String),
    #[error("Analysis failed: {0}")]
    Internal(String),
}

/// Sequences the analysis pipeline: availability check, decode, content
/// validation, preprocessing, prediction, verdict. Strictly sequential,
/// short-circuits on the first failure, retries nothing.
///
/// Cheap for the service to clone; the classifier handle is shared.
#[derive(Clone)]
pub struct AnalysisService {
    model: Option<Arc<dyn Predictor>>,
}

impl AnalysisService {
    pub fn new(model: Option<Arc<dyn Predictor>>) -> Self {
        Self { model }
    }

    pub fn is_model_available(&self) -> bool {
        self.model.is_some()
    }

    /// Single entry point: encoded bytes in, graded verdict or typed
    /// failure out.
    ///
    /// Classifier availability is checked before any pixel is decoded, and
    /// content validation runs before the classifier is ever invoked;
    /// unsuitable photos must be turned away without paying for inference.
    pub fn analyze(&self, image_bytes: &[u8]) -> Result<LeafAnalysis, AnalysisError> {
        if !self.is_model_available() {
            return Err(AnalysisError::ModelUnavailable);
        }

        let grid = decode_image(image_bytes)?;
        validate(&grid, image_bytes.len()).map_err(|rejection| {
            AnalysisError::ValidationRejected {
                reason: rejection.reason,
                message: rejection.message.to_string(),
            }
        })?;

        let tensor = prepare(&grid);
        log::info!("Preprocessed image tensor shape: {:?}", tensor.shape());

        let raw_prediction = self.predict_raw(&tensor)?;
        log::info!("Raw model prediction: {}", raw_prediction);

        let analysis = build_verdict(raw_prediction);
        log::info!(
            "Analysis complete: {} (confidence: {:.1}%)",
            analysis.label.display_name(),
            analysis.confidence_pct
        );
        Ok(analysis)
    }

    /// Runs the classifier on an already-prepared tensor. Used by the
    /// pipeline and by the synthetic sanity probe.
    pub fn predict_raw(&self, tensor: &Array4<f32>) -> Result<f32, AnalysisError> {
        let model = self
            .model
            .as_ref()
            .ok_or(AnalysisError::ModelUnavailable)?;
        model.predict(tensor).map_err(|e| {
            log::error!("Model inference error: {}", e);
            AnalysisError::PredictionFailed(e.to_string())
        })
    }
}
