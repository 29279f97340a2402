//! Response payloads carried in `ApiResponse::data`

use crate::models::ClientAccount;
use crate::order::Order;
use serde::{Deserialize, Serialize};

/// `{order}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// `{orders: [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

/// `{client}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub client: ClientAccount,
}

/// `{paymentUrl}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    pub payment_url: String,
    pub transaction_id: String,
}

/// Result of a saved-card charge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpResult {
    pub transaction_id: String,
    pub balance: f64,
}

/// Saved card as shown to the client; the token never leaves the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCardView {
    pub masked_pan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
