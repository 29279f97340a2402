//! Order status pushes
//!
//! [`PushDispatcher`] listens on the order event channel and sends the
//! `{data: {newStatus, orderId}}` payload to the owning client's push token.
//! Delivery is best effort; failures are logged and never retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shared::order::{OrderEvent, OrderStatus, PushPayload};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::NotifyError;
use crate::db::Storage;

#[async_trait]
pub trait PushSender: Send + Sync + std::fmt::Debug {
    async fn send(&self, token: &str, payload: &PushPayload) -> Result<(), NotifyError>;
}

/// Expo-compatible push endpoint
#[derive(Debug, Clone)]
pub struct ExpoPushSender {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ExpoMessage<'a> {
    to: &'a str,
    title: &'static str,
    body: String,
    data: &'a shared::order::StatusPush,
}

impl ExpoPushSender {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

fn status_text(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::AwaitingOrder => "Your order has been received",
        OrderStatus::Confirmed => "Your order is confirmed",
        OrderStatus::Preparing => "Your order is being prepared",
        OrderStatus::OnTheWay => "The courier is on the way",
        OrderStatus::Delivered => "Your order has been delivered",
        OrderStatus::Cancelled => "Your order has been cancelled",
    }
}

#[async_trait]
impl PushSender for ExpoPushSender {
    async fn send(&self, token: &str, payload: &PushPayload) -> Result<(), NotifyError> {
        let message = ExpoMessage {
            to: token,
            title: "Order update",
            body: status_text(payload.data.new_status).to_string(),
            data: &payload.data,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {text}")));
        }
        Ok(())
    }
}

/// Logs pushes instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(&self, token: &str, payload: &PushPayload) -> Result<(), NotifyError> {
        tracing::info!(
            token = token,
            order_id = payload.data.order_id,
            status = %payload.data.new_status,
            "Push (log only)"
        );
        Ok(())
    }
}

/// Turns committed order transitions into pushes
pub struct PushDispatcher {
    storage: Storage,
    sender: Arc<dyn PushSender>,
    events: broadcast::Receiver<OrderEvent>,
}

impl PushDispatcher {
    pub fn new(
        storage: Storage,
        sender: Arc<dyn PushSender>,
        events: broadcast::Receiver<OrderEvent>,
    ) -> Self {
        Self {
            storage,
            sender,
            events,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Push dispatcher started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Push dispatcher stopping");
                    break;
                }
                received = self.events.recv() => match received {
                    Ok(event) => self.dispatch(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Push dispatcher lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Order event channel closed");
                        break;
                    }
                }
            }
        }
    }

    async fn dispatch(&self, event: &OrderEvent) {
        let token = match self.storage.get_client(event.client_id) {
            Ok(Some(client)) => client.push_token,
            Ok(None) => {
                tracing::warn!(client_id = event.client_id, "Push skipped: client not found");
                return;
            }
            Err(e) => {
                tracing::error!(client_id = event.client_id, error = %e, "Push skipped: storage error");
                return;
            }
        };
        let Some(token) = token else {
            tracing::debug!(client_id = event.client_id, "Push skipped: no push token");
            return;
        };

        let payload = PushPayload::from(event);
        if let Err(e) = self.sender.send(&token, &payload).await {
            tracing::warn!(order_id = event.order_id, error = %e, "Push delivery failed");
        }
    }
}
