//! Request DTOs for the OTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Longest accepted email address in bytes
pub const MAX_EMAIL_LENGTH: usize = 256;

/// Request body for POST /otp/generate
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateOtpRequest {
    /// Address the code is sent to
    pub email: String,
}

impl GenerateOtpRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_email(&self.email)
    }
}

/// Request body for POST /otp/verify
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    /// Address the code was sent to
    pub email: String,
    /// Code entered by the user
    pub otp: String,
}

impl VerifyOtpRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = validate_email(&self.email) {
            return Some(msg);
        }
        if self.otp.trim().is_empty() {
            return Some("OTP is required".to_string());
        }
        None
    }
}

fn validate_email(email: &str) -> Option<String> {
    if email.is_empty() {
        return Some("Email is required".to_string());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Some(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        ));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            None
        }
        _ => Some("Invalid email format".to_string()),
    }
}
