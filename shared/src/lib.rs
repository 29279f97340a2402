//! Shared types for the Aqua water-delivery system
//!
//! Domain types used by both the backend (`aqua-server`) and the mobile-side
//! core (`aqua-client`): client accounts, orders, push payloads, the pure
//! ledger arithmetic, unified error codes and response envelopes.

pub mod error;
pub mod ledger;
pub mod models;
pub mod order;
pub mod request;
pub mod response;
pub mod types;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use ledger::{AppliedCharge, FundsPolicy, LedgerError};
pub use models::{Address, ClientAccount, PaymentPreference};
pub use order::{OpForm, Order, OrderEvent, OrderStatus, Products, PushPayload};
pub use types::{Id, Timestamp};
