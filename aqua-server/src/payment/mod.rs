//! Payment Settlement Adapter
//!
//! Bridge to the external card gateway for balance top-ups.
//!
//! - **gateway**: [`PaymentGateway`] seam and the reqwest-backed [`HttpGateway`]
//! - **signing**: HMAC-SHA256 over the canonical field form
//! - **callback**: [`CallbackPayload`] extractor (form, multipart, JSON)
//! - **service**: [`PaymentService`], the only place a payment reaches the ledger

pub mod callback;
pub mod error;
pub mod gateway;
pub mod service;
pub mod signing;

pub use callback::{CallbackNotice, CallbackPayload};
pub use error::{GatewayError, PaymentError, PaymentResult};
pub use gateway::{HttpGateway, PaymentGateway};
pub use service::{CallbackOutcome, PaymentService};
