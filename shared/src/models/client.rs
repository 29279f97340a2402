//! Client Account Model

use crate::types::{Id, Timestamp};
use serde::{Deserialize, Serialize};

/// How "pay from account" settles for this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentPreference {
    /// Settle against the monetary balance
    #[default]
    Balance,
    /// Settle against prepaid bottle credits
    Coupon,
}

impl std::fmt::Display for PaymentPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentPreference::Balance => write!(f, "balance"),
            PaymentPreference::Coupon => write!(f, "coupon"),
        }
    }
}

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Named delivery address held in the client's address book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id,
    pub name: String,
    /// Street line, used as the address identity for the one-order-per-date rule
    pub actual: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Create / replace address payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressInput {
    pub name: String,
    pub actual: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub point: Option<GeoPoint>,
    #[serde(default)]
    pub link: Option<String>,
}

impl AddressInput {
    pub fn into_address(self, id: Id) -> Address {
        Address {
            id,
            name: self.name,
            actual: self.actual,
            phone: self.phone,
            point: self.point,
            link: self.link,
        }
    }
}

/// Client account entity
///
/// Field names are part of the mobile compatibility surface and are kept
/// verbatim (`paidBootlesFor12`, `paidBootles`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAccount {
    pub id: Id,
    /// Lower-cased email, the primary lookup key
    pub mail: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    /// Prepaid money for the `credit` pay form
    pub balance: f64,
    pub paid_bootles_for12: i64,
    pub paid_bootles_for19: i64,
    /// Legacy combined counter, always `paidBootlesFor12 + paidBootlesFor19`
    pub paid_bootles: i64,
    pub payment_preference: PaymentPreference,
    pub price12: f64,
    pub price19: f64,
    /// Loyalty points
    pub bonus: i64,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub franchise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ClientAccount {
    /// New account with zeroed ledger fields
    pub fn new(id: Id, mail: String, price12: f64, price19: f64, now: Timestamp) -> Self {
        Self {
            id,
            mail,
            full_name: String::new(),
            phone: String::new(),
            balance: 0.0,
            paid_bootles_for12: 0,
            paid_bootles_for19: 0,
            paid_bootles: 0,
            payment_preference: PaymentPreference::Balance,
            price12,
            price19,
            bonus: 0,
            addresses: Vec::new(),
            franchise: None,
            push_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn address(&self, id: Id) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    /// Recompute the legacy `paidBootles` counter from the per-size counters
    pub fn sync_legacy_bottles(&mut self) {
        self.paid_bootles = self.paid_bootles_for12 + self.paid_bootles_for19;
    }
}

/// Allowed profile edits
///
/// Wire shape is `{"field": "...", "value": ...}`. Ledger fields (balance,
/// bottle credits, prices, bonus) are not reachable through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ClientUpdate {
    FullName(String),
    Phone(String),
    PaymentPreference(PaymentPreference),
    PushToken(Option<String>),
}

impl ClientUpdate {
    pub fn apply(self, account: &mut ClientAccount) {
        match self {
            ClientUpdate::FullName(name) => account.full_name = name,
            ClientUpdate::Phone(phone) => account.phone = phone,
            ClientUpdate::PaymentPreference(pref) => account.payment_preference = pref,
            ClientUpdate::PushToken(token) => account.push_token = token,
        }
    }
}
