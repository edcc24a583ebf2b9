//! Cache Module
//!
//! Provides a generic in-memory cache with per-entry absolute expiration.

mod entry;
mod stats;
mod store;


// Re-export public types
pub(crate) use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{EntryAction, ExpiringCache};
