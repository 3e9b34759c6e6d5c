use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub const MISSING_IMAGE_MESSAGE: &str = "No image uploaded";

pub type PredictResult<T> = Result<T, PredictError>;

/// Everything that can go wrong between receiving an upload and answering it.
///
/// `MissingImage` and `PayloadTooLarge` are caller mistakes; the rest are
/// processing failures. The `Display` text is returned to the caller as is.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No image uploaded")]
    MissingImage,

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Inference(String),

    #[error("{0}")]
    Internal(String),
}

impl PredictError {
    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::MissingImage => "missing_image",
            PredictError::PayloadTooLarge { .. } => "payload_too_large",
            PredictError::Decode(_) => "decode",
            PredictError::Inference(_) => "inference",
            PredictError::Internal(_) => "internal",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<image::ImageError> for PredictError {
    fn from(e: image::ImageError) -> Self {
        PredictError::Decode(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for PredictError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        PredictError::Internal(e.to_string())
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingImage => StatusCode::BAD_REQUEST,
            PredictError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Decode(_) | PredictError::Inference(_) | PredictError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            PredictError::MissingImage => json!({ "error": MISSING_IMAGE_MESSAGE }),
            _ => json!({ "success": false, "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
