//! API Module
//!
//! HTTP handlers and routing for the OTP service.
//!
//! # Endpoints
//! - `POST /otp/generate` - Issue and send a code
//! - `POST /otp/verify` - Check a submitted code
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
