//! Data models
//!
//! Shared between aqua-server and the mobile core (via API).
//! All IDs are `i64` snowflakes.

pub mod client;

// Re-exports
pub use client::*;
