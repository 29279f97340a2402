use std::sync::Arc;

use serde_json::Value;
use shared::order::StatusPush;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{ApplyOutcome, OrderBook, OrderSource};
use crate::{ClientResult, Order, PushPayload};

/// Book shared between the sync loop and the UI
pub type SharedOrderBook = Arc<RwLock<OrderBook>>;

/// Authoritative order for a push, or `None` when it cannot be fetched
async fn resolve(source: &dyn OrderSource, push: &StatusPush) -> Option<Order> {
    match source.fetch_order(push.order_id).await {
        Ok(order) => {
            if order.status != push.new_status {
                tracing::debug!(
                    order_id = push.order_id,
                    pushed = %push.new_status,
                    current = %order.status,
                    "Push is stale, using server status"
                );
            }
            Some(order)
        }
        Err(e) => {
            tracing::warn!(order_id = push.order_id, error = %e, "Order fetch failed, push dropped");
            None
        }
    }
}

/// Fetch the pushed order and merge it into `book`
///
/// Never applies the pushed status on its own: if the fetch fails the book
/// is left untouched.
pub async fn apply_status_event(book: &mut OrderBook, source: &dyn OrderSource, push: &StatusPush) -> ApplyOutcome {
    match resolve(source, push).await {
        Some(order) => book.merge(order),
        None => ApplyOutcome::Dropped,
    }
}

/// Keeps a [`SharedOrderBook`] in step with push notifications
#[derive(Clone)]
pub struct OrderSync {
    source: Arc<dyn OrderSource>,
    mail: String,
    book: SharedOrderBook,
}

impl OrderSync {
    pub fn new(source: Arc<dyn OrderSource>, mail: impl Into<String>) -> Self {
        Self {
            source,
            mail: mail.into(),
            book: Arc::new(RwLock::new(OrderBook::new())),
        }
    }

    pub fn book(&self) -> SharedOrderBook {
        self.book.clone()
    }

    pub async fn snapshot(&self) -> OrderBook {
        self.book.read().await.clone()
    }

    /// Handle one raw push payload (`{"data": {"newStatus", "orderId"}}`)
    pub async fn handle_push(&self, raw: Value) -> ApplyOutcome {
        let payload: PushPayload = match serde_json::from_value(raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable push payload ignored");
                return ApplyOutcome::Dropped;
            }
        };

        // Fetch outside the lock so readers never wait on the network
        let Some(order) = resolve(self.source.as_ref(), &payload.data).await else {
            return ApplyOutcome::Dropped;
        };
        let outcome = self.book.write().await.merge(order);
        tracing::debug!(order_id = payload.data.order_id, ?outcome, "Push applied");
        outcome
    }

    /// Pull fallback: replace the active view with the server's listing
    ///
    /// Returns the number of active orders now held.
    pub async fn refresh_active(&self) -> ClientResult<usize> {
        let active = self.source.fetch_active(&self.mail).await?;
        let count = active.len();
        self.book.write().await.replace_active(active);
        tracing::debug!(client = %self.mail, count, "Active orders refreshed");
        Ok(count)
    }

    /// Apply pushes until `shutdown` fires or every sender is dropped
    pub async fn run(self, mut events: mpsc::Receiver<Value>, shutdown: CancellationToken) {
        tracing::info!(client = %self.mail, "Order sync started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(raw) => {
                        self.handle_push(raw).await;
                    }
                    None => break,
                },
            }
        }
        tracing::info!(client = %self.mail, "Order sync stopped");
    }

    pub fn spawn(self, events: mpsc::Receiver<Value>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(events, shutdown))
    }
}
