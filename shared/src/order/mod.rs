//! Order Module
//!
//! - Types: order record, status machine, pay forms, products
//! - Events: committed transitions and the push payload derived from them

pub mod event;
pub mod types;

// Re-exports
pub use event::{OrderEvent, PushPayload, StatusPush};
pub use types::*;
