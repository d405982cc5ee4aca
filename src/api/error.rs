use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::models::PointsTrackerError;

pub const INVALID_REQUEST: &str = "Invalid request";
pub const INVALID_ACTION: &str = "Invalid action. Use \"get\" or \"store\"";
pub const PROCESSING_FAILED: &str = "Unable to process request";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    RateLimited { message: String, retry_after_secs: u64 },

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<PointsTrackerError> for ApiError {
    fn from(err: PointsTrackerError) -> Self {
        match err {
            PointsTrackerError::InvalidAddress(_) => ApiError::bad_request(INVALID_REQUEST),
            PointsTrackerError::Validation { message, .. } => ApiError::BadRequest(message),
            PointsTrackerError::RateLimitExceeded { action, retry_after_secs } => ApiError::RateLimited {
                message: format!("Rate limit exceeded for {} action. Please try again later.", action),
                retry_after_secs,
            },
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal(PROCESSING_FAILED.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs, .. } => Some(*retry_after_secs),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
            retry_after,
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
