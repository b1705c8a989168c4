use engine::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Google Sheets not configured: {0}")]
    NotConfigured(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid url: {0}")]
    Url(String),
}

impl From<SheetsError> for StoreError {
    fn from(value: SheetsError) -> Self {
        match value {
            SheetsError::NotConfigured(msg) => StoreError::NotConfigured(msg),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}
