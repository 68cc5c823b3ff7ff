use std::sync::{Arc, Mutex};

use ndarray::Array4;
use tch::nn::ModuleT;
use tch::{CModule, Device, Kind, Tensor};

use crate::analysis::preprocess::MODEL_INPUT_SIZE;
use super::{PredictionError, Predictor};

#[derive(Debug, thiserror::Error)]
#[error("Failed to load model from '{path}': {source}")]
pub struct ModelLoadError {
    path: String,
    source: tch::TchError,
}

/// Pre-trained binary leaf health classifier, a TorchScript module loaded
/// once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct LeafModel {
    module: Arc<Mutex<CModule>>,
    device: Device,
}

impl LeafModel {
    pub fn load(path: &str) -> Result<Self, ModelLoadError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(path, device).map_err(|source| ModelLoadError {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            device,
        })
    }

    pub fn input_shape() -> Vec<i64> {
        vec![1, MODEL_INPUT_SIZE as i64, MODEL_INPUT_SIZE as i64, 3]
    }

    pub fn output_shape() -> Vec<i64> {
        vec![1, 1]
    }
}

impl Predictor for LeafModel {
    fn predict(&self, input: &Array4<f32>) -> Result<f32, PredictionError> {
        let flat: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_slice(&flat)
            .view([
                1,
                MODEL_INPUT_SIZE as i64,
                MODEL_INPUT_SIZE as i64,
                3,
            ])
            .to_device(self.device);
        let output = self.module.lock().unwrap().forward_t(&tensor, false);
        let output_flat = output.to_kind(Kind::Float).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        if num_elements == 0 {
            return Err(PredictionError::EmptyOutput);
        }
        let mut output_vec = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut output_vec, num_elements);
        let raw = output_vec[0];
        if !raw.is_finite() {
            return Err(PredictionError::NonFinite);
        }
        Ok(raw)
    }
}
