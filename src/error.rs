//! Error types for the OTP service
//!
//! Provides unified error handling using thiserror. Verification outcomes
//! (wrong code, expired, exhausted) are not errors and never appear here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Infrastructure failures of the expiring cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store's lock was poisoned by a panicking holder
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// == OTP Error Enum ==
/// Unified error type for the OTP service.
#[derive(Error, Debug)]
pub enum OtpError {
    /// Invalid settings, fatal at startup
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The notifier failed to deliver a code
    #[error("Failed to send OTP: {0}")]
    Delivery(#[source] anyhow::Error),

    /// The cache could not be used
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        let status = match &self {
            OtpError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OtpError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            OtpError::Config(_) | OtpError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the OTP service.
pub type Result<T> = std::result::Result<T, OtpError>;
