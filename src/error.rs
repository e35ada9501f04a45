use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream catalog error: {0}")]
    Upstream(String),

    #[error("The catalog is handling too many requests right now")]
    UpstreamOverloaded,

    #[error("Every facet query against the catalog failed")]
    AggregationFailed,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::UpstreamOverloaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                "The catalog is busy right now, give it a moment and retry".to_string(),
            ),
            AppError::AggregationFailed => (
                StatusCode::BAD_GATEWAY,
                "The catalog could not be reached".to_string(),
            ),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Cancelled => (StatusCode::REQUEST_TIMEOUT, self.to_string()),
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Persistence(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
