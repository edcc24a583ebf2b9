//! OTP Cache - One-time-code issuance and verification
//!
//! Issues short-lived numeric codes bound to an identity, stores them in an
//! in-memory expiring cache, and verifies them under a bounded attempt budget.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod otp;
pub mod tasks;

pub use api::AppState;
pub use cache::ExpiringCache;
pub use config::Config;
pub use error::{OtpError, Result};
pub use otp::{OtpVerifier, Verification};
pub use tasks::spawn_cleanup_task;
