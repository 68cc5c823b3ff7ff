use actix_web::{web, Error, HttpResponse};
use actix_multipart::Multipart;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use ndarray::{Array4, Axis};
use rand::Rng;
use serde_json::json;
use shared::{
    AnalysisResponse, AnalyzeRequest, ErrorResponse, HealthResponse, ModelDetails, ModelShapes,
};
use std::io::Write;

use crate::analysis::decode::DecodeError;
use crate::analysis::preprocess::MODEL_INPUT_SIZE;
use crate::analysis::service::{AnalysisError, AnalysisService};
use crate::analysis::validate::MAX_IMAGE_BYTES;
use crate::analysis::verdict::{HEALTH_THRESHOLD, HealthLabel, LeafAnalysis};
use crate::inference::LeafModel;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)))
        .service(web::resource("/analyze").route(web::post().to(analyze_base64)))
        .service(web::resource("/api/analyze").route(web::post().to(analyze_multipart)))
        .service(web::resource("/test-prediction").route(web::get().to(test_prediction)));
}

async fn health_check(service: web::Data<AnalysisService>) -> HttpResponse {
    let model_loaded = service.is_model_available();
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded,
        model_info: model_loaded.then(|| ModelShapes {
            input_shape: LeafModel::input_shape(),
            output_shape: LeafModel::output_shape(),
        }),
    })
}

/// JSON upload: `{ "image": "<data-URL or bare base64>" }`.
async fn analyze_base64(
    service: web::Data<AnalysisService>,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    // Browsers submit data URLs; everything before the comma is metadata.
    let encoded = body.image.rsplit(',').next().unwrap_or("");
    let image_data = match BASE64.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error decoding image payload: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid image format. Please upload a valid image file.".to_string(),
                message: None,
                inappropriate_image: None,
            });
        }
    };
    run_analysis(&service, image_data).await
}

/// Multipart upload: one analysis result per file part. Per-part failures
/// are reported inside the results array without failing the request.
async fn analyze_multipart(
    service: web::Data<AnalysisService>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let mut images: Vec<Vec<u8>> = Vec::new();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let mut image_data = Vec::new();
        let mut oversized = false;
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if oversized {
                // Drain the part without buffering; the pipeline reports
                // it as too large from the length alone.
                continue;
            }
            image_data.write_all(&data)?;
            oversized = image_data.len() > MAX_IMAGE_BYTES;
        }
        if !image_data.is_empty() {
            images.push(image_data);
        }
    }

    let mut results = Vec::new();
    for image_data in images {
        let svc = service.get_ref().clone();
        match web::block(move || svc.analyze(&image_data)).await {
            Ok(Ok(analysis)) => {
                results.push(json!({ "analysis": analysis_response(&analysis) }));
            }
            Ok(Err(e)) => {
                info!("Analysis rejected or failed: {}", e);
                results.push(json!({ "error": error_body(&e) }));
            }
            Err(e) => {
                error!("Analysis worker failed: {}", e);
                results.push(json!({
                    "error": ErrorResponse {
                        error: "Analysis failed".to_string(),
                        message: Some(
                            "An unexpected error occurred during analysis. Please try again."
                                .to_string(),
                        ),
                        inappropriate_image: None,
                    }
                }));
            }
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "results": results })))
}

/// Sanity probe: pushes two synthetic tensors through the classifier, one
/// green-boosted and one red-boosted, and reports the raw verdicts.
async fn test_prediction(service: web::Data<AnalysisService>) -> HttpResponse {
    if !service.is_model_available() {
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Model not loaded".to_string(),
            message: None,
            inappropriate_image: None,
        });
    }

    let mut rng = rand::rng();
    let healthy_sample = synthetic_sample(&mut rng, 0.0, 0.3);
    let affected_sample = synthetic_sample(&mut rng, 0.3, 0.1);

    let svc = service.get_ref().clone();
    let outcome = web::block(move || {
        let healthy = svc.predict_raw(&healthy_sample)?;
        let affected = svc.predict_raw(&affected_sample)?;
        Ok::<_, AnalysisError>((healthy, affected))
    })
    .await;

    match outcome {
        Ok(Ok((healthy, affected))) => HttpResponse::Ok().json(json!({
            "model_status": "working",
            "model_input_shape": LeafModel::input_shape(),
            "model_output_shape": LeafModel::output_shape(),
            "test_results": {
                "healthy_sample": {
                    "prediction": healthy,
                    "interpretation": interpret(healthy),
                },
                "affected_sample": {
                    "prediction": affected,
                    "interpretation": interpret(affected),
                },
            },
            "threshold_info": "Values > 0.5 = Healthy, Values <= 0.5 = Affected",
        })),
        Ok(Err(e)) => {
            error!("Test prediction failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
                message: None,
                inappropriate_image: None,
            })
        }
        Err(e) => {
            error!("Test prediction worker failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Test prediction failed".to_string(),
                message: None,
                inappropriate_image: None,
            })
        }
    }
}

async fn run_analysis(service: &web::Data<AnalysisService>, image_data: Vec<u8>) -> HttpResponse {
    let svc = service.get_ref().clone();
    match web::block(move || svc.analyze(&image_data)).await {
        Ok(Ok(analysis)) => HttpResponse::Ok().json(analysis_response(&analysis)),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!("Analysis worker failed: {}", e);
            error_response(&AnalysisError::Internal(e.to_string()))
        }
    }
}

fn analysis_response(analysis: &LeafAnalysis) -> AnalysisResponse {
    AnalysisResponse {
        prediction: analysis.label.display_name().to_string(),
        confidence: analysis.confidence_pct,
        is_healthy: analysis.label == HealthLabel::Healthy,
        recommendations: analysis.recommendation.to_string(),
        model_info: ModelDetails {
            raw_prediction_value: analysis.raw_prediction,
            model_threshold: HEALTH_THRESHOLD,
            interpretation:
                "Values > 0.5 indicate healthy plant, values <= 0.5 indicate affected plant"
                    .to_string(),
        },
    }
}

fn error_body(err: &AnalysisError) -> ErrorResponse {
    match err {
        AnalysisError::ModelUnavailable => ErrorResponse {
            error: "ML Model not available".to_string(),
            message: Some(
                "Plant health classifier model could not be loaded. Please check the MODEL_PATH configuration."
                    .to_string(),
            ),
            inappropriate_image: None,
        },
        AnalysisError::Decode(DecodeError::TooLarge) => ErrorResponse {
            error: DecodeError::TooLarge.to_string(),
            message: None,
            inappropriate_image: None,
        },
        AnalysisError::Decode(_) => ErrorResponse {
            error: "Invalid image format. Please upload a valid image file.".to_string(),
            message: None,
            inappropriate_image: None,
        },
        AnalysisError::ValidationRejected { message, .. } => ErrorResponse {
            error: "Inappropriate image".to_string(),
            message: Some(message.clone()),
            inappropriate_image: Some(true),
        },
        AnalysisError::PredictionFailed(_) => ErrorResponse {
            error: "Model prediction failed".to_string(),
            message: Some(
                "The ML model encountered an error during prediction. Please try with a different image."
                    .to_string(),
            ),
            inappropriate_image: None,
        },
        AnalysisError::Internal(_) => ErrorResponse {
            error: "Analysis failed".to_string(),
            message: Some(
                "An unexpected error occurred during analysis. Please try again.".to_string(),
            ),
            inappropriate_image: None,
        },
    }
}

fn error_response(err: &AnalysisError) -> HttpResponse {
    let body = error_body(err);
    match err {
        AnalysisError::Decode(_) | AnalysisError::ValidationRejected { .. } => {
            info!("Analysis request rejected: {}", err);
            HttpResponse::BadRequest().json(body)
        }
        AnalysisError::ModelUnavailable
        | AnalysisError::PredictionFailed(_)
        | AnalysisError::Internal(_) => {
            error!("Analysis request failed: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn interpret(prediction: f32) -> &'static str {
    if prediction > HEALTH_THRESHOLD {
        "Healthy"
    } else {
        "Affected"
    }
}

// Noise in [0.2, 0.5) with a per-channel boost, matching the probe images
// the classifier was smoke-tested with.
fn synthetic_sample<R: Rng>(rng: &mut R, red_boost: f32, green_boost: f32) -> Array4<f32> {
    let size = MODEL_INPUT_SIZE as usize;
    let mut tensor = Array4::from_shape_fn((1, size, size, 3), |_| rng.random::<f32>() * 0.3 + 0.2);
    tensor
        .index_axis_mut(Axis(3), 0)
        .mapv_inplace(|v| v + red_boost);
    tensor
        .index_axis_mut(Axis(3), 1)
        .mapv_inplace(|v| v + green_boost);
    tensor
}
