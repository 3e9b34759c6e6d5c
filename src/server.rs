use std::sync::Arc;
use std::time::Instant;

use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, HttpServer, get, post, web};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use serde::Serialize;
use serde_json::json;

use crate::classifier::Classifier;
use crate::config::ServerConfig;
use crate::error::{PredictError, PredictResult};
use crate::labels::LabelSet;
use crate::preprocess::{INPUT_SHAPE, preprocess};
use crate::ranking::{Prediction, TOP_K};

pub const IMAGE_FIELD: &str = "image";

/// Read-only state shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub labels: LabelSet,
    pub max_payload_size: usize,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, labels: LabelSet, max_payload_size: usize) -> Self {
        Self {
            classifier,
            labels,
            max_payload_size,
        }
    }

    /// Decode, run the model and rank. Blocking; keep it off the async workers.
    pub fn classify(&self, image: &[u8]) -> PredictResult<Prediction> {
        let pixels = preprocess(image)?;
        let probabilities = self.classifier.predict(&pixels)?;
        if probabilities.len() != self.labels.len() {
            log::debug!(
                "Model returned {} scores for {} labels",
                probabilities.len(),
                self.labels.len()
            );
        }
        Ok(Prediction::from_probabilities(&probabilities, &self.labels))
    }
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    success: bool,
    #[serde(flatten)]
    prediction: Prediction,
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[get("/model_info")]
pub async fn model_info(app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "model_path": app_state.classifier.source(),
        "input_shape": INPUT_SHAPE,
        "labels": app_state.labels.codes(),
        "top_k": TOP_K,
    }))
}

#[post("/predict")]
pub async fn predict(
    payload: Multipart,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, PredictError> {
    let started = Instant::now();
    match handle_predict(payload, app_state).await {
        Ok(prediction) => {
            match prediction.best() {
                Some(best) => log::info!(
                    "Detected {} ({}%, {:?}) in {} ms",
                    best.code,
                    best.score,
                    best.tier,
                    started.elapsed().as_millis()
                ),
                None => log::info!(
                    "No known pattern detected in {} ms",
                    started.elapsed().as_millis()
                ),
            }
            Ok(HttpResponse::Ok().json(PredictResponse {
                success: true,
                prediction,
            }))
        }
        Err(e) => {
            if e.is_client_error() {
                log::warn!("Rejected prediction request [{}]: {}", e.kind(), e);
            } else {
                log::error!("Prediction failed [{}]: {}", e.kind(), e);
            }
            Err(e)
        }
    }
}

async fn handle_predict(
    payload: Multipart,
    app_state: web::Data<AppState>,
) -> PredictResult<Prediction> {
    let image = read_image_field(payload, app_state.max_payload_size).await?;
    log::debug!("Received {} byte upload", image.len());
    web::block(move || app_state.classify(&image)).await?
}

/// Pull the bytes of the first file part named `image` out of the form.
///
/// A body that is not valid multipart counts as having no image.
pub async fn read_image_field(mut payload: Multipart, limit: usize) -> PredictResult<Bytes> {
    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(PredictError::MissingImage),
            Err(e) => {
                log::warn!("Unreadable multipart body: {}", e);
                return Err(PredictError::MissingImage);
            }
        };
        if !is_image_upload(&field) {
            continue;
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| PredictError::Decode(format!("failed to read upload: {}", e)))?
        {
            if buf.len() + chunk.len() > limit {
                return Err(PredictError::PayloadTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }
        return Ok(buf.freeze());
    }
}

// plain form fields named "image" are not uploads
fn is_image_upload(field: &Field) -> bool {
    field.name() == Some(IMAGE_FIELD)
        && field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(model_info).service(predict);
}

pub async fn startup(config: ServerConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!(
        "Starting server at {}:{} with {} labels from model {}",
        config.host,
        config.port,
        app_state.labels.len(),
        app_state.classifier.source()
    );

    let mut server = HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    server.bind((config.host, config.port))?.run().await?;

    std::io::Result::Ok(())
}
