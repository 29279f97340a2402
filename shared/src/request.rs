//! Request types
//!
//! Bodies accepted by the REST surface. Field names follow the mobile
//! client (`mail`, `opForm`, `orderId`, ...).

use crate::ledger::LedgerAdjustment;
use crate::models::{AddressInput, ClientUpdate};
use crate::order::{AddressSnapshot, DeliveryDate, OpForm, OrderUpdate, Products};
use crate::types::Id;
use serde::{Deserialize, Serialize};

/// Pagination query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /// Page number (1-based, default: 1)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page (default: 20, max: 100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationQuery {
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) as usize * self.limit()
    }

    /// Clamped to 1..=100
    pub fn limit(&self) -> usize {
        self.per_page.clamp(1, 100) as usize
    }
}

// ========== Registration ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeRequest {
    pub mail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmCodeRequest {
    pub mail: String,
    pub code: String,
}

// ========== Client ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientLookup {
    pub mail: String,
}

/// `{mail, field, value}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClientRequest {
    pub mail: String,
    #[serde(flatten)]
    pub update: ClientUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAddressRequest {
    pub mail: String,
    pub address: AddressInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub mail: String,
    pub address_id: Id,
    pub address: AddressInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAddressRequest {
    pub mail: String,
    pub address_id: Id,
}

/// Staff-side balance / credit correction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustLedgerRequest {
    pub mail: String,
    /// Caller-chosen idempotency id
    pub request_id: String,
    #[serde(flatten)]
    pub adjustment: LedgerAdjustment,
    #[serde(default)]
    pub note: Option<String>,
}

// ========== Orders ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub mail: String,
    pub address: AddressSnapshot,
    pub products: Products,
    pub date: DeliveryDate,
    pub op_form: OpForm,
    #[serde(default)]
    pub need_call: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatOrderRequest {
    pub mail: String,
    pub date: DeliveryDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub order_id: Id,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLookup {
    pub order_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOrdersRequest {
    pub mail: String,
    #[serde(flatten)]
    pub page: PaginationQuery,
}

/// `{orderId, field, value}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_id: Id,
    #[serde(flatten)]
    pub update: OrderUpdate,
}

// ========== Payments ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentLinkRequest {
    pub sum: f64,
    pub mail: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSavedCardRequest {
    pub client_id: Id,
    pub amount: f64,
}
