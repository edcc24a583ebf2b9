//! OTP Record
//!
//! One outstanding verification challenge for an identity.

use chrono::{DateTime, Utc};

// == OTP Record ==
/// Code, attempt counter and deadline stored in the cache per identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    /// The issued code, never changed after creation
    pub code: String,
    /// Validation calls charged against this record so far
    pub attempts: u32,
    /// Deadline fixed at creation, never extended
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Creates a fresh record with no attempts charged.
    pub fn new(code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            attempts: 0,
            expires_at,
        }
    }

    /// True once `now` is strictly past the deadline.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
