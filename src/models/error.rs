use thiserror::Error;

#[derive(Error, Debug)]
pub enum PointsTrackerError {
    #[error("{0}")]
    InvalidAddress(String),

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Rate limit exceeded for {action}, retry after {retry_after_secs}s")]
    RateLimitExceeded { action: String, retry_after_secs: u64 },

    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),

    #[error("Backend returned {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PointsTrackerError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PointsTrackerError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PointsTrackerError>;
