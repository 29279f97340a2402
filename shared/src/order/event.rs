//! Order events and push payloads

use super::types::OrderStatus;
use crate::types::{Id, Timestamp};
use serde::{Deserialize, Serialize};

/// Committed order transition, broadcast by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: Id,
    pub client_id: Id,
    pub status: OrderStatus,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: Timestamp,
}

/// Body of a status push: `{"newStatus": ..., "orderId": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPush {
    pub new_status: OrderStatus,
    pub order_id: Id,
}

/// Push notification payload: `{"data": {"newStatus", "orderId"}}`
///
/// A hint only. Receivers re-fetch the order before applying anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub data: StatusPush,
}

impl From<&OrderEvent> for PushPayload {
    fn from(event: &OrderEvent) -> Self {
        Self {
            data: StatusPush {
                new_status: event.status,
                order_id: event.order_id,
            },
        }
    }
}
