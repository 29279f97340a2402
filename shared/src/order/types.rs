//! Order types

use crate::ledger::AppliedCharge;
use crate::models::{Address, GeoPoint};
use crate::types::{Id, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// Payment Form
// ============================================================================

/// How an order's cost is settled (`opForm` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpForm {
    /// Cash on delivery
    Fakt,
    /// Card on delivery
    Card,
    /// Wallet balance
    Credit,
    /// Prepaid bottle credits
    Coupon,
}

impl OpForm {
    /// Whether this form is settled through the ledger
    pub fn uses_ledger(&self) -> bool {
        matches!(self, OpForm::Credit | OpForm::Coupon)
    }
}

impl std::fmt::Display for OpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OpForm::Fakt => "fakt",
            OpForm::Card => "card",
            OpForm::Credit => "credit",
            OpForm::Coupon => "coupon",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Status
// ============================================================================

/// Order status
///
/// Forward chain: awaitingOrder -> confirmed -> preparing -> onTheWay -> delivered.
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    AwaitingOrder,
    Confirmed,
    Preparing,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::AwaitingOrder => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::OnTheWay => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 5,
        }
    }

    /// Forward moves (skips allowed) and cancellation from any non-terminal status
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingOrder => "awaitingOrder",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OnTheWay => "onTheWay",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order parts
// ============================================================================

/// Bottle quantities per size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Products {
    #[serde(default)]
    pub b12: u32,
    #[serde(default)]
    pub b19: u32,
}

impl Products {
    /// Both sizes together, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        self.b12.saturating_add(self.b19)
    }
}

/// Scheduled delivery date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDate {
    /// `YYYY-MM-DD`
    pub d: String,
    #[serde(default)]
    pub time: String,
}

/// Address copied onto the order at creation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub actual: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl AddressSnapshot {
    pub fn has_geo(&self) -> bool {
        self.point.is_some()
    }
}

impl From<&Address> for AddressSnapshot {
    fn from(address: &Address) -> Self {
        Self {
            actual: address.actual.clone(),
            name: address.name.clone(),
            phone: address.phone.clone(),
            point: address.point,
            link: address.link.clone(),
        }
    }
}

// ============================================================================
// Order
// ============================================================================

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Id,
    /// Owning client id
    pub client: Id,
    pub client_mail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub franchise: Option<String>,
    pub address: AddressSnapshot,
    pub products: Products,
    pub date: DeliveryDate,
    /// `b12 * price12 + b19 * price19` at creation; never recomputed
    pub sum: f64,
    pub op_form: OpForm,
    pub status: OrderStatus,
    #[serde(default)]
    pub need_call: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Cancellation reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_aggregator: Option<String>,
    /// Exactly what the ledger debited at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_charge: Option<AppliedCharge>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Whether `other` occupies the same (date, address) slot
    pub fn same_slot(&self, date: &str, actual: &str) -> bool {
        self.date.d == date && self.address.actual == actual
    }
}

/// Allowed order edits
///
/// Wire shape is `{"field": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum OrderUpdate {
    Status(OrderStatus),
    Courier(Option<String>),
    CourierAggregator(Option<String>),
    Comment(String),
}
