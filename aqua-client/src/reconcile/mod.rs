//! Order reconciliation
//!
//! Status pushes are hints: every event is resolved by re-fetching the order
//! from the server, so duplicated or out-of-order pushes converge on the
//! server's current state.
//!
//! - [`OrderBook`]: locally held orders, newest first
//! - [`apply_status_event`]: fetch then merge one push
//! - [`OrderSync`]: background loop over incoming pushes

mod book;
mod sync;

pub use book::{ApplyOutcome, OrderBook};
pub use sync::{OrderSync, SharedOrderBook, apply_status_event};

use async_trait::async_trait;
use shared::types::Id;

use crate::{ClientResult, HttpClient, Order};

/// Where authoritative order state comes from
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Full detail of one order
    async fn fetch_order(&self, order_id: Id) -> ClientResult<Order>;

    /// Non-terminal orders of a client, newest first
    async fn fetch_active(&self, mail: &str) -> ClientResult<Vec<Order>>;
}

#[async_trait]
impl OrderSource for HttpClient {
    async fn fetch_order(&self, order_id: Id) -> ClientResult<Order> {
        self.get_order(order_id).await
    }

    async fn fetch_active(&self, mail: &str) -> ClientResult<Vec<Order>> {
        self.active_orders(mail).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use shared::order::{AddressSnapshot, DeliveryDate, OpForm, Products};
    use shared::OrderStatus;

    use super::*;
    use crate::ClientError;

    pub fn order(id: Id, status: OrderStatus) -> Order {
        Order {
            id,
            client: 1,
            client_mail: "client@mail.kz".into(),
            franchise: None,
            address: AddressSnapshot {
                actual: format!("Samal-{id}"),
                ..Default::default()
            },
            products: Products { b12: 2, b19: 0 },
            date: DeliveryDate {
                d: "2024-06-01".into(),
                time: String::new(),
            },
            sum: 1800.0,
            op_form: OpForm::Fakt,
            status,
            need_call: false,
            comment: None,
            reason: None,
            courier: None,
            courier_aggregator: None,
            applied_charge: None,
            created_at: id,
            updated_at: id,
        }
    }

    /// In-memory server state; unknown ids fail like a network error would
    #[derive(Default)]
    pub struct StubSource {
        orders: Mutex<HashMap<Id, Order>>,
        fetches: Mutex<Vec<Id>>,
    }

    impl StubSource {
        pub fn with(orders: impl IntoIterator<Item = Order>) -> Self {
            let source = Self::default();
            for order in orders {
                source.put(order);
            }
            source
        }

        pub fn put(&self, order: Order) {
            self.orders.lock().unwrap().insert(order.id, order);
        }

        pub fn fetches(&self) -> Vec<Id> {
            self.fetches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderSource for StubSource {
        async fn fetch_order(&self, order_id: Id) -> ClientResult<Order> {
            self.fetches.lock().unwrap().push(order_id);
            self.orders
                .lock()
                .unwrap()
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ClientError::Server("connection reset".into()))
        }

        async fn fetch_active(&self, _mail: &str) -> ClientResult<Vec<Order>> {
            let mut active: Vec<Order> = self
                .orders
                .lock()
                .unwrap()
                .values()
                .filter(|o| o.status.is_active())
                .cloned()
                .collect();
            active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(active)
        }
    }
}
