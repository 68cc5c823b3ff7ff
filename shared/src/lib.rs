use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct AnalyzeRequest {
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct AnalysisResponse {
    pub prediction: String,
    pub confidence: f32,
    pub is_healthy: bool,
    pub recommendations: String,
    pub model_info: ModelDetails,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct ModelDetails {
    pub raw_prediction_value: f32,
    pub model_threshold: f32,
    pub interpretation: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelShapes>,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct ModelShapes {
    pub input_shape: Vec<i64>,
    pub output_shape: Vec<i64>,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inappropriate_image: Option<bool>,
}
