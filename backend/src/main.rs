use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::env;
use std::sync::Arc;

use backend::analysis::service::AnalysisService;
use backend::inference::{LeafModel, Predictor};
use backend::routes::configure_routes;

// Base64 inflates the 8 MiB image cap by a third, plus JSON framing.
const JSON_PAYLOAD_LIMIT: usize = 12 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let model_path =
        env::var("MODEL_PATH").unwrap_or_else(|_| "plant_health_classifier.pt".to_string());
    let model: Option<Arc<dyn Predictor>> = match LeafModel::load(&model_path) {
        Ok(model) => {
            log::info!("Model loaded successfully from {}", model_path);
            log::info!("Model input shape: {:?}", LeafModel::input_shape());
            log::info!("Model output shape: {:?}", LeafModel::output_shape());
            Some(Arc::new(model))
        }
        Err(e) => {
            log::error!("{}", e);
            log::warn!(
                "Starting without a classifier; analysis requests will be rejected until one is available"
            );
            None
        }
    };
    let service = AnalysisService::new(model);

    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::JsonConfig::default().limit(JSON_PAYLOAD_LIMIT))
            .app_data(web::Data::new(service.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
