//! Common types for the shared crate

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Resource identifier (snowflake, see [`crate::util::snowflake_id`])
pub type Id = i64;
