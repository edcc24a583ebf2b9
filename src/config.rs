//! Configuration Module
//!
//! Handles loading and validating service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{OtpError, Result};
use crate::otp::OtpSettings;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of digits in an issued code
    pub code_length: usize,
    /// Lifetime of an issued code in seconds
    pub expiry_seconds: u64,
    /// Failed comparisons tolerated before a code is dropped
    pub max_attempts: u32,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `OTP_CODE_LENGTH` - Digits per code (default: 6)
    /// - `OTP_EXPIRY_SECONDS` - Code lifetime in seconds (default: 300)
    /// - `OTP_MAX_ATTEMPTS` - Allowed failed attempts (default: 3)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    ///
    /// # Errors
    /// `OtpError::Config` if a variable is set but cannot be parsed, or if the
    /// resulting configuration fails [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            code_length: env_or("OTP_CODE_LENGTH", defaults.code_length)?,
            expiry_seconds: env_or("OTP_EXPIRY_SECONDS", defaults.expiry_seconds)?,
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts)?,
            server_port: env_or("SERVER_PORT", defaults.server_port)?,
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every value the service cannot run with.
    ///
    /// # Errors
    /// `OtpError::Config` for invalid OTP settings or a zero cleanup interval.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval == 0 {
            return Err(OtpError::Config(
                "cleanup interval must be at least 1 second".to_string(),
            ));
        }
        self.otp_settings().map(|_| ())
    }

    /// Builds validated verifier settings.
    ///
    /// # Errors
    /// `OtpError::Config` if any OTP value is zero or out of range.
    pub fn otp_settings(&self) -> Result<OtpSettings> {
        OtpSettings::new(
            self.code_length,
            Duration::from_secs(self.expiry_seconds),
            self.max_attempts,
        )
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| OtpError::Config(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            code_length: 6,
            expiry_seconds: 300,
            max_attempts: 3,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
