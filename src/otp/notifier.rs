//! Code Delivery
//!
//! Out-of-band delivery of issued codes. The mail transport itself lives
//! outside this crate; `LogNotifier` stands in for it during development.

use async_trait::async_trait;
use tracing::{debug, info};

/// Subject line of the verification message
pub const SUBJECT: &str = "Your Verification Code";

// == Notifier Trait ==
/// Sends a message to a destination such as an email address.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `body` to `destination`. Transport failures are returned as-is.
    async fn send(&self, destination: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

// == Log Notifier ==
/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(destination, subject, "Delivering message");
        debug!(body, "Message body");
        Ok(())
    }
}

// == Message Composition ==
/// Builds the subject and HTML body for a verification message.
pub fn compose_message(code: &str, ttl: chrono::Duration) -> (String, String) {
    let body = format!(
        "<html>\
           <body style='font-family: Arial, sans-serif;'>\
             <h2>Email Verification</h2>\
             <p>Your verification code is: <strong style='font-size: 20px;'>{}</strong></p>\
             <p>This code will expire in {}.</p>\
             <p>If you didn't request this code, please ignore this email.</p>\
           </body>\
         </html>",
        code,
        describe_ttl(ttl)
    );
    (SUBJECT.to_string(), body)
}

fn describe_ttl(ttl: chrono::Duration) -> String {
    let secs = ttl.num_seconds();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 0 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}
