//! API Handlers
//!
//! HTTP request handlers for each OTP service endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::{OtpError, Result};
use crate::models::{
    ErrorResponse, GenerateOtpRequest, GenerateOtpResponse, HealthResponse, StatsResponse,
    VerifyOtpRequest, VerifyOtpResponse,
};
use crate::otp::{Notifier, OtpRecord, OtpVerifier};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Issues and checks codes
    pub verifier: Arc<OtpVerifier>,
    /// Store behind the verifier, shared with the sweep task
    pub cache: Arc<ExpiringCache<OtpRecord>>,
}

impl AppState {
    /// Wires a verifier over `cache`.
    pub fn new(verifier: OtpVerifier, cache: Arc<ExpiringCache<OtpRecord>>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            cache,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// # Errors
    /// `OtpError::Config` if the OTP settings are invalid.
    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let settings = config.otp_settings()?;
        let cache = Arc::new(ExpiringCache::new());
        let verifier = OtpVerifier::new(settings, cache.clone(), notifier);
        Ok(Self::new(verifier, cache))
    }
}

/// Handler for POST /otp/generate
///
/// Issues a code and sends it to the given email. The code is never echoed.
pub async fn generate_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateOtpRequest>,
) -> Result<Json<GenerateOtpResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(OtpError::InvalidRequest(error_msg));
    }

    state.verifier.generate(&req.email).await?;

    Ok(Json(GenerateOtpResponse::sent()))
}

/// Handler for POST /otp/verify
///
/// Answers 200 when the code is accepted, 400 for any rejected code.
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Response> {
    if let Some(error_msg) = req.validate() {
        return Err(OtpError::InvalidRequest(error_msg));
    }

    if state.verifier.validate(&req.email, &req.otp)? {
        Ok(Json(VerifyOtpResponse::verified()).into_response())
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid or expired OTP")),
        )
            .into_response())
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats()?;
    Ok(Json(stats.into()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
