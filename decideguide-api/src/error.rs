use actix_web::{HttpResponse, ResponseError};
use decideguide_core::SurveyError;
use shared_types::ErrorResponse;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SurveyError> for ApiError {
    fn from(err: SurveyError) -> Self {
        match err {
            SurveyError::UploadTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            e if e.is_invalid_request() => ApiError::InvalidRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
        };

        match self {
            ApiError::NotFound(_) => {
                warn!(error = %self, "Request for missing entity");
                HttpResponse::NotFound().json(error_response)
            }
            ApiError::InvalidRequest(_) => {
                warn!(error = %self, "Rejected request");
                HttpResponse::BadRequest().json(error_response)
            }
            ApiError::PayloadTooLarge(_) => {
                warn!(error = %self, "Rejected oversized payload");
                HttpResponse::PayloadTooLarge().json(error_response)
            }
            ApiError::Internal(_) => {
                error!(error = %self, "Request failed");
                HttpResponse::InternalServerError().json(error_response)
            }
        }
    }
}

impl ApiError {
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
