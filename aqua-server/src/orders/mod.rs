//! Order lifecycle
//!
//! - **manager**: [`OrdersManager`] places, cancels and updates orders, drives
//!   the ledger inside the same write transaction and broadcasts every
//!   committed transition
//!
//! # Architecture
//!
//! ```text
//! HTTP handler → OrdersManager → redb txn (order + client + settlement)
//!                      ↓
//!                  broadcast OrderEvent
//!                      ↓
//!               PushDispatcher → client device
//! ```

pub mod manager;

pub use manager::{AdminNotifier, ManagerError, ManagerResult, OrderRules, OrdersManager};
