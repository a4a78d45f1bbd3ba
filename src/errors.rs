use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sqlx::migrate::MigrateError;
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Migration error: {0}")]
    MigrationError(#[from] MigrateError),

    #[error("Menu request failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Bad server response: {0}")]
    BadServerResponse(reqwest::StatusCode),

    #[error("Malformed menu payload: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found")]
    NotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadServerResponse(_) | AppError::FetchError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
