//! OTP Verifier
//!
//! Issues numeric codes bound to an identity and verifies them against a
//! bounded attempt budget and a fixed deadline.
//!
//! Every validation charges one attempt before anything else is checked, so a
//! call against a record that is already over budget or past its deadline
//! still counts. The whole fetch, increment, check and write sequence runs
//! inside a single `ExpiringCache::update`, which serializes concurrent
//! validations of the same identity.
//!
//! Records stay in the cache for `EXPIRED_RETENTION_SECS` past their own
//! deadline. Within that window a late submission is reported as `Expired`;
//! after it the record is purged and reads as `Absent`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{EntryAction, ExpiringCache};
use crate::error::{OtpError, Result};
use crate::otp::code::{codes_match, generate_numeric_code};
use crate::otp::notifier::{compose_message, Notifier};
use crate::otp::{OtpRecord, OtpSettings};

/// Namespace for OTP entries in a shared cache
pub const KEY_PREFIX: &str = "OTP_";

/// Seconds an expired record is kept before the cache drops it
pub const EXPIRED_RETENTION_SECS: i64 = 300;

/// Cache key holding the challenge for `identity`.
pub fn cache_key(identity: &str) -> String {
    format!("{}{}", KEY_PREFIX, identity)
}

// == Verification Outcome ==
/// Result of checking a submitted code.
///
/// Only `Verified` is a success; every other variant is an ordinary business
/// outcome rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No live challenge for the identity
    Absent,
    /// This call pushed the attempt count past the budget; challenge dropped
    Exhausted,
    /// The challenge outlived its deadline; challenge dropped
    Expired,
    /// Wrong code; challenge stays live with one attempt consumed
    Mismatch,
    /// Correct code; challenge consumed
    Verified,
}

impl Verification {
    pub fn is_verified(self) -> bool {
        self == Verification::Verified
    }
}

// == OTP Verifier ==
/// Generates and validates one-time codes stored in an injected cache.
pub struct OtpVerifier {
    settings: OtpSettings,
    cache: Arc<ExpiringCache<OtpRecord>>,
    notifier: Arc<dyn Notifier>,
}

impl OtpVerifier {
    /// Creates a verifier over `cache`, delivering codes through `notifier`.
    ///
    /// The cache's clock is the verifier's only time source.
    pub fn new(
        settings: OtpSettings,
        cache: Arc<ExpiringCache<OtpRecord>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            cache,
            notifier,
        }
    }

    // == Generate ==
    /// Issues a new code for `identity` and sends it through the notifier.
    ///
    /// Any outstanding challenge for the identity is replaced. If delivery
    /// fails the error is returned but the stored challenge stays live.
    ///
    /// # Returns
    /// The issued code.
    pub async fn generate(&self, identity: &str) -> Result<String> {
        let overflow = || OtpError::Config("expiry overflows the clock".to_string());
        let code = generate_numeric_code(self.settings.code_length());
        let expires_at = self
            .cache
            .now()
            .checked_add_signed(self.settings.ttl())
            .ok_or_else(overflow)?;
        let retained_until = expires_at
            .checked_add_signed(chrono::Duration::seconds(EXPIRED_RETENTION_SECS))
            .ok_or_else(overflow)?;

        self.cache.set(
            cache_key(identity),
            OtpRecord::new(code.clone(), expires_at),
            retained_until,
        )?;
        debug!(identity, %expires_at, "Issued OTP");

        let (subject, body) = compose_message(&code, self.settings.ttl());
        self.notifier
            .send(identity, &subject, &body)
            .await
            .map_err(OtpError::Delivery)?;

        Ok(code)
    }

    // == Validate ==
    /// Returns true only if `submitted` matches the live code for `identity`.
    ///
    /// Wrong, expired, exhausted and missing codes all yield `Ok(false)`;
    /// errors are reserved for cache failures.
    pub fn validate(&self, identity: &str, submitted: &str) -> Result<bool> {
        self.check(identity, submitted)
            .map(Verification::is_verified)
    }

    // == Check ==
    /// Applies one validation attempt and reports why it passed or failed.
    pub fn check(&self, identity: &str, submitted: &str) -> Result<Verification> {
        let max_attempts = self.settings.max_attempts();

        let outcome = self
            .cache
            .update(&cache_key(identity), |record, now| {
                record.attempts = record.attempts.saturating_add(1);

                if record.attempts > max_attempts {
                    (EntryAction::Remove, Verification::Exhausted)
                } else if record.is_expired_at(now) {
                    (EntryAction::Remove, Verification::Expired)
                } else if !codes_match(&record.code, submitted) {
                    (EntryAction::Keep, Verification::Mismatch)
                } else {
                    (EntryAction::Remove, Verification::Verified)
                }
            })?
            .unwrap_or(Verification::Absent);

        match outcome {
            Verification::Absent => warn!(identity, "OTP not found or expired"),
            Verification::Exhausted => warn!(identity, "Maximum OTP attempts exceeded"),
            Verification::Expired => warn!(identity, "OTP expired"),
            Verification::Mismatch => warn!(identity, "Invalid OTP attempt"),
            Verification::Verified => debug!(identity, "OTP verified"),
        }

        Ok(outcome)
    }
}

impl fmt::Debug for OtpVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpVerifier")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<(String, String, String)>>,
        should_fail: bool,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, destination: &str, subject: &str, body: &str) -> anyhow::Result<()> {
            if self.should_fail {
                anyhow::bail!("mail server unreachable");
            }
            self.sent.lock().unwrap().push((
                destination.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        cache: Arc<ExpiringCache<OtpRecord>>,
        notifier: Arc<MockNotifier>,
        verifier: OtpVerifier,
    }

    fn fixture_with(settings: OtpSettings, notifier: MockNotifier) -> Fixture {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(ExpiringCache::with_clock(clock.clone()));
        let notifier = Arc::new(notifier);
        let verifier = OtpVerifier::new(settings, cache.clone(), notifier.clone());
        Fixture {
            clock,
            cache,
            notifier,
            verifier,
        }
    }

    fn fixture(max_attempts: u32) -> Fixture {
        let settings = OtpSettings::new(6, std::time::Duration::from_secs(300), max_attempts).unwrap();
        fixture_with(settings, MockNotifier::default())
    }

    fn wrong(code: &str) -> String {
        code.chars()
            .map(|c| char::from(b'0' + (c as u8 - b'0' + 1) % 10))
            .collect()
    }

    const EMAIL: &str = "user@example.com";

    #[test]
    fn test_validate_without_challenge() {
        let f = fixture(3);
        assert!(!f.verifier.validate(EMAIL, "123456").unwrap());
        assert_eq!(
            f.verifier.check(EMAIL, "123456").unwrap(),
            Verification::Absent
        );
    }

    #[tokio::test]
    async fn test_generate_stores_fresh_record() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        let record = f.cache.get(&cache_key(EMAIL)).unwrap().unwrap();
        assert_eq!(record.code, code);
        assert_eq!(record.attempts, 0);
        assert_eq!(record.expires_at, f.clock.now() + Duration::seconds(300));
    }

    #[tokio::test]
    async fn test_generate_delivers_code() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        let sent = f.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, EMAIL);
        assert_eq!(sent[0].1, "Your Verification Code");
        assert!(sent[0].2.contains(&code));
    }

    #[tokio::test]
    async fn test_correct_code_is_consumed() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        assert!(f.verifier.validate(EMAIL, &code).unwrap());
        assert!(!f.verifier.validate(EMAIL, &code).unwrap());
        assert!(f.cache.get(&cache_key(EMAIL)).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mismatch_keeps_record_and_counts_attempt() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        assert_eq!(
            f.verifier.check(EMAIL, &wrong(&code)).unwrap(),
            Verification::Mismatch
        );

        let record = f.cache.get(&cache_key(EMAIL)).unwrap().unwrap();
        assert_eq!(record.attempts, 1);
        assert_eq!(record.code, code);
    }

    #[tokio::test]
    async fn test_attempt_budget_boundary() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();
        let bad = wrong(&code);

        for _ in 0..3 {
            assert_eq!(
                f.verifier.check(EMAIL, &bad).unwrap(),
                Verification::Mismatch
            );
        }

        // Fourth call trips the budget even with the right code.
        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Exhausted
        );
        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Absent
        );
    }

    #[tokio::test]
    async fn test_last_allowed_attempt_can_succeed() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();
        let bad = wrong(&code);

        assert!(!f.verifier.validate(EMAIL, &bad).unwrap());
        assert!(!f.verifier.validate(EMAIL, &bad).unwrap());
        assert!(f.verifier.validate(EMAIL, &code).unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_fails() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        f.clock.advance(Duration::seconds(301));

        assert!(!f.verifier.validate(EMAIL, &code).unwrap());
        assert!(f.cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_reports_expired() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        f.clock.advance(Duration::seconds(301));

        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Expired
        );
        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Absent
        );
    }

    #[tokio::test]
    async fn test_expired_check_charges_attempt_first() {
        let f = fixture(1);
        let code = f.verifier.generate(EMAIL).await.unwrap();
        f.verifier.check(EMAIL, &wrong(&code)).unwrap();

        f.clock.advance(Duration::seconds(301));

        // Over budget wins over expiry because the attempt is charged first.
        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Exhausted
        );
    }

    #[tokio::test]
    async fn test_code_valid_at_exact_deadline() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        f.clock.advance(Duration::seconds(300));

        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Verified
        );
    }

    #[tokio::test]
    async fn test_expired_record_purged_after_retention() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        f.clock
            .advance(Duration::seconds(300 + EXPIRED_RETENTION_SECS));

        assert_eq!(
            f.verifier.check(EMAIL, &code).unwrap(),
            Verification::Absent
        );
    }

    #[tokio::test]
    async fn test_code_valid_until_just_before_deadline() {
        let f = fixture(3);
        let code = f.verifier.generate(EMAIL).await.unwrap();

        f.clock.advance(Duration::seconds(299));

        assert!(f.verifier.validate(EMAIL, &code).unwrap());
    }

    #[tokio::test]
    async fn test_regenerate_invalidates_previous_code() {
        let f = fixture(3);
        let first = f.verifier.generate(EMAIL).await.unwrap();
        let second = loop {
            let code = f.verifier.generate(EMAIL).await.unwrap();
            if code != first {
                break code;
            }
        };

        assert!(!f.verifier.validate(EMAIL, &first).unwrap());
        assert!(f.verifier.validate(EMAIL, &second).unwrap());
    }

    #[tokio::test]
    async fn test_regenerate_resets_attempts() {
        let f = fixture(2);
        let code = f.verifier.generate(EMAIL).await.unwrap();
        f.verifier.validate(EMAIL, &wrong(&code)).unwrap();
        f.verifier.validate(EMAIL, &wrong(&code)).unwrap();

        let code = f.verifier.generate(EMAIL).await.unwrap();
        let record = f.cache.get(&cache_key(EMAIL)).unwrap().unwrap();
        assert_eq!(record.attempts, 0);
        assert!(f.verifier.validate(EMAIL, &code).unwrap());
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let f = fixture(3);
        let code_a = f.verifier.generate("a@example.com").await.unwrap();
        let _code_b = f.verifier.generate("b@example.com").await.unwrap();

        assert!(!f.verifier.validate("b@example.com", &wrong(&code_a)).unwrap());
        assert!(f.verifier.validate("a@example.com", &code_a).unwrap());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_challenge() {
        let notifier = MockNotifier {
            should_fail: true,
            ..Default::default()
        };
        let f = fixture_with(OtpSettings::default(), notifier);

        let result = f.verifier.generate(EMAIL).await;
        assert!(matches!(result, Err(OtpError::Delivery(_))));

        let record = f.cache.get(&cache_key(EMAIL)).unwrap().unwrap();
        assert!(f.verifier.validate(EMAIL, &record.code).unwrap());
    }

    #[tokio::test]
    async fn test_generated_code_length_follows_settings() {
        let settings = OtpSettings::new(9, std::time::Duration::from_secs(60), 1).unwrap();
        let f = fixture_with(settings, MockNotifier::default());

        let code = f.verifier.generate(EMAIL).await.unwrap();
        assert_eq!(code.len(), 9);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_cache_key_is_namespaced() {
        assert_eq!(cache_key(EMAIL), "OTP_user@example.com");
    }
}
