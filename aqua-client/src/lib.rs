//! Aqua Client - mobile-side core for the water-delivery backend
//!
//! - [`HttpClient`]: typed calls to the REST API
//! - [`check_funds`]: balance and bottle-credit check before placing an order
//! - [`reconcile`]: keeps the locally held orders in step with status pushes

pub mod checkout;
pub mod config;
pub mod error;
pub mod http;
pub mod reconcile;

pub use checkout::check_funds;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use reconcile::{ApplyOutcome, OrderBook, OrderSource, OrderSync, apply_status_event};

// Re-export shared types for convenience
pub use shared::{ApiResponse, ClientAccount, Order, OrderStatus, PushPayload};
