//! HTTP-level tests for the analysis service: route wiring, status codes,
//! and the JSON payloads the frontend contract relies on.

use std::io::Cursor;
use std::sync::Arc;

use actix_web::{test, web, App};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use serde_json::{json, Value};

use backend::analysis::service::AnalysisService;
use backend::inference::{PredictionError, Predictor};
use backend::routes::configure_routes;

struct FixedPredictor(f32);

impl Predictor for FixedPredictor {
    fn predict(&self, _input: &Array4<f32>) -> Result<f32, PredictionError> {
        Ok(self.0)
    }
}

fn service_with(prediction: f32) -> AnalysisService {
    AnalysisService::new(Some(Arc::new(FixedPredictor(prediction))))
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

fn leafy_png() -> Vec<u8> {
    png_bytes(&RgbImage::from_fn(224, 224, |x, y| {
        Rgb([
            40 + ((x * 3 + y * 5) % 40) as u8,
            100 + ((x * 7 + y * 13) % 80) as u8,
            30 + ((x + y) % 30) as u8,
        ])
    }))
}

macro_rules! app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn health_reports_missing_model() {
    let app = app!(AnalysisService::new(None));
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], false);
    assert!(body.get("model_info").is_none());
}

#[actix_web::test]
async fn health_reports_model_shapes_when_loaded() {
    let app = app!(service_with(0.9));
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_info"]["input_shape"], json!([1, 224, 224, 3]));
}

#[actix_web::test]
async fn analyze_accepts_data_url_payload() {
    let app = app!(service_with(0.95));
    let payload = format!("data:image/png;base64,{}", BASE64.encode(leafy_png()));
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({ "image": payload }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["prediction"], "Healthy Plant");
    assert_eq!(body["confidence"], 95.0);
    assert_eq!(body["is_healthy"], true);
    assert_eq!(body["model_info"]["model_threshold"], 0.5);
}

#[actix_web::test]
async fn analyze_accepts_bare_base64_payload() {
    let app = app!(service_with(0.05));
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({ "image": BASE64.encode(leafy_png()) }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["prediction"], "Affected Plant (Pest/Disease detected)");
    assert_eq!(body["is_healthy"], false);
    assert_eq!(body["confidence"], 95.0);
}

#[actix_web::test]
async fn analyze_flags_unsuitable_photos() {
    let app = app!(service_with(0.9));
    let tiny = png_bytes(&RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])));
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({ "image": BASE64.encode(tiny) }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Inappropriate image");
    assert_eq!(body["inappropriate_image"], true);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("minimum 100x100 pixels"));
}

#[actix_web::test]
async fn analyze_rejects_garbage_base64() {
    let app = app!(service_with(0.9));
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({ "image": "data:image/png;base64,@@not-base64@@" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid image format. Please upload a valid image file.");
}

#[actix_web::test]
async fn analyze_rejects_undecodable_bytes() {
    let app = app!(service_with(0.9));
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({ "image": BASE64.encode(b"not an image at all") }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn analyze_without_model_is_a_server_error() {
    let app = app!(AnalysisService::new(None));
    let req = test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({ "image": BASE64.encode(leafy_png()) }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ML Model not available");
}

#[actix_web::test]
async fn multipart_analyze_returns_one_result_per_file() {
    let app = app!(service_with(0.88));

    let boundary = "test-boundary";
    let mut body = Vec::new();
    for (name, bytes) in [
        ("leaf_one.png", leafy_png()),
        ("leaf_two.png", png_bytes(&RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])))),
    ] {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                boundary, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    let req = test::TestRequest::post()
        .uri("/api/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["analysis"]["prediction"], "Healthy Plant");
    assert_eq!(results[0]["analysis"]["confidence"], 88.0);
    assert_eq!(results[1]["error"]["error"], "Inappropriate image");
}

#[actix_web::test]
async fn test_prediction_requires_a_model() {
    let app = app!(AnalysisService::new(None));
    let req = test::TestRequest::get().uri("/test-prediction").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 500);
}

#[actix_web::test]
async fn test_prediction_reports_interpretations() {
    let app = app!(service_with(0.72));
    let req = test::TestRequest::get().uri("/test-prediction").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["model_status"], "working");
    assert_eq!(
        body["test_results"]["healthy_sample"]["interpretation"],
        "Healthy"
    );
}
