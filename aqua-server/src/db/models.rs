//! Server-only persisted records

use serde::{Deserialize, Serialize};
use shared::types::{Id, Timestamp};

/// Kind of ledger mutation recorded under an idempotency key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Charge,
    Refund,
    TopUp,
    Adjustment,
}

/// One applied ledger mutation
///
/// Keys: `"{order_id}:charge"`, `"{order_id}:refund"`, `"topup:{transaction_id}"`,
/// `"adjust:{request_id}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub key: String,
    pub kind: SettlementKind,
    pub client_id: Id,
    /// Signed balance delta as applied (negative for debits)
    pub balance_delta: f64,
    pub bottles12_delta: i64,
    pub bottles19_delta: i64,
    pub created_at: Timestamp,
}

impl SettlementRecord {
    pub fn charge_key(order_id: Id) -> String {
        format!("{}:charge", order_id)
    }

    pub fn refund_key(order_id: Id) -> String {
        format!("{}:refund", order_id)
    }

    pub fn top_up_key(transaction_id: &str) -> String {
        format!("topup:{}", transaction_id)
    }

    pub fn adjust_key(request_id: &str) -> String {
        format!("adjust:{}", request_id)
    }
}

/// Gateway payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Link created, waiting for the gateway callback
    Pending,
    /// Confirmed and credited to the balance
    Succeeded,
    Failed,
}

/// Top-up attempt keyed by gateway transaction id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub client_id: Id,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Tokenized card stored for direct charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCard {
    pub client_id: Id,
    /// Gateway card token, never returned to clients
    pub token: String,
    pub masked_pan: String,
    pub expiry: Option<String>,
    pub created_at: Timestamp,
}
