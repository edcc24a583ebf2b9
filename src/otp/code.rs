//! Code Generation
//!
//! Numeric one-time codes drawn from the operating system's CSPRNG.

use constant_time_eq::constant_time_eq;
use rand::rngs::OsRng;
use rand::Rng;

/// Generates a code of `length` decimal digits.
///
/// Each digit is drawn uniformly from `0..=9`, so leading zeros are kept and
/// the result is always exactly `length` characters long.
pub fn generate_numeric_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Compares a stored code against a submitted one in constant time.
pub fn codes_match(expected: &str, submitted: &str) -> bool {
    constant_time_eq(expected.as_bytes(), submitted.as_bytes())
}
