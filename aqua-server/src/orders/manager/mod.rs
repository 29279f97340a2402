//! OrdersManager - order lifecycle and settlement
//!
//! Every transition runs as one redb write transaction:
//!
//! ```text
//! place_order(req)
//!     ├─ 1. Validate input (quantity, date, address, text limits)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Load client
//!     ├─ 4. Reject a second live order for the same date + address
//!     ├─ 5. Build order under an unused id, compute sum
//!     ├─ 6. Ledger charge (+ bonus, idempotency record)
//!     ├─ 7. Persist order
//!     ├─ 8. Commit
//!     ├─ 9. Broadcast OrderEvent
//!     └─ 10. Spawn admin mail when the address has no coordinates
//! ```
//!
//! Cancellation follows the same shape with a refund instead of a charge.
//! An order that is already cancelled is returned unchanged.

mod error;
pub use error::*;

use std::sync::Arc;

use chrono::NaiveDate;
use redb::WriteTransaction;
use shared::ledger::order_sum;
use shared::models::ClientAccount;
use shared::order::{Order, OrderEvent, OrderStatus, OrderUpdate};
use shared::request::{PaginationQuery, PlaceOrderRequest};
use shared::types::Id;
use shared::util::{normalize_email, now_millis, snowflake_id};
use tokio::sync::broadcast;

use crate::db::{Storage, StorageError};
use crate::ledger::LedgerService;
use crate::notify::Mailer;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN,
    parse_delivery_date, validate_email, validate_optional_text, validate_required_text,
    validate_text_len,
};

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Upper bound on `b12 + b19` for a single order
pub const MAX_BOTTLES_PER_ORDER: u32 = 1000;

/// Canonical stored form of `date.d`
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Who gets told about orders that cannot be placed on a map
#[derive(Debug, Clone)]
pub struct AdminNotifier {
    mailer: Arc<dyn Mailer>,
    admin_email: String,
}

impl AdminNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, admin_email: impl Into<String>) -> Self {
        Self {
            mailer,
            admin_email: admin_email.into(),
        }
    }

    async fn missing_geo(self, order: Order) {
        let subject = format!("Order {} has no coordinates", order.id);
        let body = format!(
            "Client: {}\nAddress: {}\nDate: {} {}\nProducts: 12L x{}, 19L x{}\nMap link: {}",
            order.client_mail,
            order.address.actual,
            order.date.d,
            order.date.time,
            order.products.b12,
            order.products.b19,
            order.address.link.as_deref().unwrap_or("-"),
        );
        if let Err(e) = self.mailer.send(&self.admin_email, &subject, &body).await {
            tracing::warn!(order_id = order.id, error = %e, "Admin mail for order without coordinates failed");
        }
    }
}

/// Order lifecycle rules that come from configuration
#[derive(Debug, Clone, Copy)]
pub struct OrderRules {
    /// Minimum `b12 + b19` for a client-placed order
    pub min_bottles: u32,
}

impl Default for OrderRules {
    fn default() -> Self {
        Self { min_bottles: 2 }
    }
}

/// OrdersManager for order placement, cancellation and status updates
pub struct OrdersManager {
    storage: Storage,
    ledger: LedgerService,
    rules: OrderRules,
    event_tx: broadcast::Sender<OrderEvent>,
    admin: Option<AdminNotifier>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<Storage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("rules", &self.rules)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(storage: Storage, ledger: LedgerService, rules: OrderRules) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            ledger,
            rules,
            event_tx,
            admin: None,
        }
    }

    /// Mail the admin about orders placed without coordinates
    pub fn set_admin_notifier(&mut self, admin: AdminNotifier) {
        self.admin = Some(admin);
    }

    /// Subscribe to committed order transitions
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn broadcast(&self, order: &Order) {
        let event = OrderEvent {
            order_id: order.id,
            client_id: order.client,
            status: order.status,
            timestamp: order.updated_at,
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!(order_id = order.id, "Event broadcast skipped: no active receivers");
        }
    }

    fn load_client(&self, txn: &WriteTransaction, mail: &str) -> ManagerResult<ClientAccount> {
        self.storage
            .find_client_by_email_txn(txn, mail)?
            .ok_or_else(|| ManagerError::ClientNotFound(mail.to_string()))
    }

    fn load_order(&self, txn: &WriteTransaction, order_id: Id) -> ManagerResult<Order> {
        self.storage
            .get_order_txn(txn, order_id)?
            .ok_or(ManagerError::OrderNotFound(order_id))
    }

    /// Draw ids until one is not taken by a stored order
    fn unused_order_id(&self, txn: &WriteTransaction, mut next: impl FnMut() -> Id) -> ManagerResult<Id> {
        loop {
            let id = next();
            if self.storage.get_order_txn(txn, id)?.is_none() {
                return Ok(id);
            }
            tracing::warn!(order_id = id, "Order id already taken, drawing another");
        }
    }

    /// Check the request and return the parsed delivery date
    fn validate_placement(&self, req: &PlaceOrderRequest) -> ManagerResult<NaiveDate> {
        validate_email(&req.mail)?;
        validate_required_text(&req.address.actual, "address", MAX_ADDRESS_LEN)?;
        validate_text_len(&req.address.name, "address.name", MAX_NAME_LEN)?;
        validate_text_len(&req.address.phone, "address.phone", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&req.address.link, "address.link", MAX_URL_LEN)?;
        validate_optional_text(&req.comment, "comment", MAX_NOTE_LEN)?;
        let date = parse_delivery_date(&req.date.d)?;

        let total = req.products.total();
        if total < self.rules.min_bottles {
            return Err(ManagerError::InsufficientQuantity {
                total,
                min: self.rules.min_bottles,
            });
        }
        if total > MAX_BOTTLES_PER_ORDER {
            return Err(ManagerError::TooManyBottles {
                total,
                max: MAX_BOTTLES_PER_ORDER,
            });
        }
        Ok(date)
    }

    /// Create an order and settle it against the client's ledger
    pub fn place_order(&self, mut req: PlaceOrderRequest) -> ManagerResult<Order> {
        let date = self.validate_placement(&req)?;
        // `2024-6-1` and `2024-06-01` are the same slot
        req.date.d = date.format(DATE_FORMAT).to_string();
        let mail = normalize_email(&req.mail);

        let txn = self.storage.begin_write()?;
        let mut client = self.load_client(&txn, &mail)?;

        let actual = req.address.actual.trim().to_string();
        let taken = self
            .storage
            .client_orders_txn(&txn, client.id)?
            .iter()
            .any(|o| o.status != OrderStatus::Cancelled && o.same_slot(&req.date.d, &actual));
        if taken {
            tracing::info!(client = %mail, date = %req.date.d, address = %actual, "Duplicate order rejected");
            return Err(ManagerError::OrderAlreadyExists {
                date: req.date.d,
                address: actual,
            });
        }

        let id = self.unused_order_id(&txn, snowflake_id)?;
        let now = now_millis();
        let mut address = req.address;
        address.actual = actual;
        let mut order = Order {
            id,
            client: client.id,
            client_mail: client.mail.clone(),
            franchise: client.franchise.clone(),
            address,
            sum: order_sum(&req.products, client.price12, client.price19),
            products: req.products,
            date: req.date,
            op_form: req.op_form,
            status: OrderStatus::AwaitingOrder,
            need_call: req.need_call,
            comment: req.comment.filter(|c| !c.trim().is_empty()),
            reason: None,
            courier: None,
            courier_aggregator: None,
            applied_charge: None,
            created_at: now,
            updated_at: now,
        };

        self.ledger.charge_for_order(&txn, &mut client, &mut order)?;
        self.storage.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = order.id,
            client = %order.client_mail,
            date = %order.date.d,
            sum = order.sum,
            op_form = %order.op_form,
            "Order placed"
        );
        self.broadcast(&order);
        self.notify_missing_geo(&order);
        Ok(order)
    }

    fn notify_missing_geo(&self, order: &Order) {
        if order.address.has_geo() {
            return;
        }
        let Some(admin) = self.admin.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(admin.missing_geo(order.clone()));
            }
            Err(_) => {
                tracing::warn!(order_id = order.id, "No runtime for admin mail, skipped");
            }
        }
    }

    /// Cancel an order and refund what its charge debited
    ///
    /// Cancelling an already cancelled order returns it unchanged and
    /// refunds nothing.
    pub fn cancel_order(&self, order_id: Id, reason: Option<String>) -> ManagerResult<Order> {
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_order(&txn, order_id)?;

        match order.status {
            OrderStatus::Cancelled => {
                tracing::debug!(order_id, "Order already cancelled");
                return Ok(order);
            }
            OrderStatus::Delivered => return Err(ManagerError::OrderAlreadyDelivered(order_id)),
            _ => {}
        }

        order.status = OrderStatus::Cancelled;
        order.reason = reason.filter(|r| !r.trim().is_empty());
        order.updated_at = now_millis();

        self.ledger.refund_for_cancelled_order(&txn, &order)?;
        self.storage.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id, client = %order.client_mail, "Order cancelled");
        self.broadcast(&order);
        Ok(order)
    }

    /// Apply a staff/dispatch edit
    ///
    /// `Status(cancelled)` goes through [`Self::cancel_order`]. Other status
    /// moves carry no ledger effect.
    pub fn update_order(&self, order_id: Id, update: OrderUpdate) -> ManagerResult<Order> {
        if let OrderUpdate::Status(OrderStatus::Cancelled) = update {
            return self.cancel_order(order_id, None);
        }

        let txn = self.storage.begin_write()?;
        let mut order = self.load_order(&txn, order_id)?;

        match update {
            OrderUpdate::Status(next) => {
                if order.status == next {
                    return Ok(order);
                }
                if !order.status.can_transition_to(next) {
                    return Err(ManagerError::InvalidTransition {
                        from: order.status,
                        to: next,
                    });
                }
                order.status = next;
            }
            OrderUpdate::Courier(courier) => {
                validate_optional_text(&courier, "courier", MAX_SHORT_TEXT_LEN)?;
                order.courier = courier;
            }
            OrderUpdate::CourierAggregator(courier) => {
                validate_optional_text(&courier, "courierAggregator", MAX_SHORT_TEXT_LEN)?;
                order.courier_aggregator = courier;
            }
            OrderUpdate::Comment(comment) => {
                validate_text_len(&comment, "comment", MAX_NOTE_LEN)?;
                order.comment = Some(comment).filter(|c| !c.trim().is_empty());
            }
        }
        order.updated_at = now_millis();

        self.storage.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id, status = %order.status, "Order updated");
        self.broadcast(&order);
        Ok(order)
    }

    /// Place the client's most recent order again for a new date
    pub fn repeat_last_order(
        &self,
        mail: &str,
        date: shared::order::DeliveryDate,
    ) -> ManagerResult<Order> {
        let mail = normalize_email(mail);
        let client = self
            .storage
            .find_client_by_email(&mail)?
            .ok_or_else(|| ManagerError::ClientNotFound(mail.clone()))?;
        let last = self
            .storage
            .client_orders(client.id)?
            .into_iter()
            .next()
            .ok_or_else(|| ManagerError::NoPreviousOrder(mail.clone()))?;

        self.place_order(PlaceOrderRequest {
            mail,
            address: last.address,
            products: last.products,
            date,
            op_form: last.op_form,
            need_call: last.need_call,
            comment: None,
        })
    }

    pub fn get_order(&self, order_id: Id) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or(ManagerError::OrderNotFound(order_id))
    }

    fn orders_of(&self, mail: &str) -> ManagerResult<Vec<Order>> {
        let mail = normalize_email(mail);
        let client = self
            .storage
            .find_client_by_email(&mail)?
            .ok_or(ManagerError::ClientNotFound(mail))?;
        Ok(self.storage.client_orders(client.id)?)
    }

    /// Non-terminal orders, newest first
    pub fn active_orders(&self, mail: &str) -> ManagerResult<Vec<Order>> {
        Ok(self
            .orders_of(mail)?
            .into_iter()
            .filter(|o| o.status.is_active())
            .collect())
    }

    /// Full history, newest first
    pub fn list_client_orders(&self, mail: &str, page: &PaginationQuery) -> ManagerResult<Vec<Order>> {
        Ok(self
            .orders_of(mail)?
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect())
    }
}

#[cfg(test)]
mod tests;
