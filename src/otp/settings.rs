//! OTP Settings
//!
//! Validated code length, lifetime and attempt budget.

use std::time::Duration;

use crate::error::{OtpError, Result};

/// Longest code the verifier will issue
pub const MAX_CODE_LENGTH: usize = 32;

// == OTP Settings ==
/// Parameters fixed when an `OtpVerifier` is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSettings {
    code_length: usize,
    ttl: chrono::Duration,
    max_attempts: u32,
}

impl OtpSettings {
    /// Validates and builds settings.
    ///
    /// # Arguments
    /// * `code_length` - Number of digits, 1 to `MAX_CODE_LENGTH`
    /// * `expiry` - Lifetime of an issued code, must be non-zero
    /// * `max_attempts` - Failed comparisons tolerated before the code is dropped
    ///
    /// # Errors
    /// `OtpError::Config` if any value is zero or out of range.
    pub fn new(code_length: usize, expiry: Duration, max_attempts: u32) -> Result<Self> {
        if code_length == 0 || code_length > MAX_CODE_LENGTH {
            return Err(OtpError::Config(format!(
                "code length must be between 1 and {}, got {}",
                MAX_CODE_LENGTH, code_length
            )));
        }
        if expiry.is_zero() {
            return Err(OtpError::Config("expiry must be positive".to_string()));
        }
        if max_attempts == 0 {
            return Err(OtpError::Config("max attempts must be positive".to_string()));
        }

        let ttl = chrono::Duration::from_std(expiry)
            .map_err(|e| OtpError::Config(format!("expiry out of range: {}", e)))?;

        Ok(Self {
            code_length,
            ttl,
            max_attempts,
        })
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Lifetime of an issued code.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl: chrono::Duration::minutes(5),
            max_attempts: 3,
        }
    }
}
