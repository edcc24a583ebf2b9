//! OTP Module
//!
//! One-time-code issuance and verification on top of the expiring cache.

mod code;
mod notifier;
mod record;
mod settings;
mod verifier;


pub use code::{codes_match, generate_numeric_code};
pub use notifier::{compose_message, LogNotifier, Notifier, SUBJECT};
pub use record::OtpRecord;
pub use settings::{OtpSettings, MAX_CODE_LENGTH};
pub use verifier::{cache_key, OtpVerifier, Verification, KEY_PREFIX};
