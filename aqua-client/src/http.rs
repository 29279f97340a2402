//! HTTP client for the REST API

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::models::{AddressInput, ClientUpdate};
use shared::order::{DeliveryDate, OrderUpdate};
use shared::request::{
    AddAddressRequest, CancelOrderRequest, ChargeSavedCardRequest, ClientLookup, ConfirmCodeRequest,
    CreatePaymentLinkRequest, PlaceOrderRequest, RepeatOrderRequest, SendCodeRequest, UpdateClientRequest,
    UpdateOrderRequest,
};
use shared::response::{
    ClientEnvelope, HealthResponse, OrderEnvelope, OrderList, PaymentLink, SavedCardView, TopUpResult,
};
use shared::types::Id;

use crate::checkout::check_funds;
use crate::{ApiResponse, ClientAccount, ClientConfig, ClientError, ClientResult, Order};

/// HTTP client for the water-delivery backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self
            .authorize(self.client.post(self.url(path)).json(body))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.authorize(self.client.delete(self.url(path))).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            // Error bodies use the same envelope; fall back to the raw text
            let (code, message) = match serde_json::from_str::<ApiResponse<serde_json::Value>>(&text) {
                Ok(envelope) => (envelope.code.unwrap_or(status.as_u16()), envelope.message),
                Err(_) => (status.as_u16(), text),
            };
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                s if s.is_client_error() => ClientError::Rejected { code, message },
                _ => ClientError::Server(message),
            });
        }

        Ok(response.json().await?)
    }

    /// Unwrap the `data` field of a successful envelope
    fn data<T>(response: ApiResponse<T>, what: &str) -> ClientResult<T> {
        response
            .data
            .ok_or_else(|| ClientError::InvalidResponse(format!("Missing {what} data")))
    }

    // ========== Health ==========

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        Self::data(self.get("/health").await?, "health")
    }

    // ========== Clients ==========

    /// Ask the server to mail a confirmation code
    pub async fn send_code(&self, mail: &str) -> ClientResult<()> {
        let req = SendCodeRequest { mail: mail.to_string() };
        self.post::<ApiResponse<()>, _>("/api/clients/send-code", &req).await?;
        Ok(())
    }

    /// Confirm the mailed code; creates the account on first login
    pub async fn confirm_code(&self, mail: &str, code: &str) -> ClientResult<ClientAccount> {
        let req = ConfirmCodeRequest {
            mail: mail.to_string(),
            code: code.to_string(),
        };
        let envelope: ClientEnvelope = Self::data(self.post("/api/clients/confirm-code", &req).await?, "client")?;
        Ok(envelope.client)
    }

    pub async fn get_client(&self, mail: &str) -> ClientResult<ClientAccount> {
        let req = ClientLookup { mail: mail.to_string() };
        let envelope: ClientEnvelope = Self::data(self.post("/api/clients/get", &req).await?, "client")?;
        Ok(envelope.client)
    }

    pub async fn update_client(&self, mail: &str, update: ClientUpdate) -> ClientResult<ClientAccount> {
        let req = UpdateClientRequest {
            mail: mail.to_string(),
            update,
        };
        let envelope: ClientEnvelope = Self::data(self.post("/api/clients/update", &req).await?, "client")?;
        Ok(envelope.client)
    }

    pub async fn add_address(&self, mail: &str, address: AddressInput) -> ClientResult<ClientAccount> {
        let req = AddAddressRequest {
            mail: mail.to_string(),
            address,
        };
        let envelope: ClientEnvelope =
            Self::data(self.post("/api/clients/addresses", &req).await?, "client")?;
        Ok(envelope.client)
    }

    // ========== Orders ==========

    pub async fn place_order(&self, req: &PlaceOrderRequest) -> ClientResult<Order> {
        let envelope: OrderEnvelope = Self::data(self.post("/api/orders/place", req).await?, "order")?;
        Ok(envelope.order)
    }

    /// Place an order only if `account` can pay for it
    pub async fn place_order_checked(&self, account: &ClientAccount, req: &PlaceOrderRequest) -> ClientResult<Order> {
        check_funds(account, req)?;
        self.place_order(req).await
    }

    pub async fn cancel_order(&self, order_id: Id, reason: Option<String>) -> ClientResult<Order> {
        let req = CancelOrderRequest { order_id, reason };
        let envelope: OrderEnvelope = Self::data(self.post("/api/orders/cancel", &req).await?, "order")?;
        Ok(envelope.order)
    }

    pub async fn repeat_order(&self, mail: &str, date: DeliveryDate) -> ClientResult<Order> {
        let req = RepeatOrderRequest {
            mail: mail.to_string(),
            date,
        };
        let envelope: OrderEnvelope = Self::data(self.post("/api/orders/repeat", &req).await?, "order")?;
        Ok(envelope.order)
    }

    /// Staff edit; the client must carry the staff token
    pub async fn update_order(&self, order_id: Id, update: OrderUpdate) -> ClientResult<Order> {
        let req = UpdateOrderRequest { order_id, update };
        let envelope: OrderEnvelope = Self::data(self.post("/api/orders/update", &req).await?, "order")?;
        Ok(envelope.order)
    }

    /// Full order detail
    pub async fn get_order(&self, order_id: Id) -> ClientResult<Order> {
        let envelope: OrderEnvelope = Self::data(self.get(&format!("/api/orders/{order_id}")).await?, "order")?;
        Ok(envelope.order)
    }

    /// Non-terminal orders, newest first
    pub async fn active_orders(&self, mail: &str) -> ClientResult<Vec<Order>> {
        let req = ClientLookup { mail: mail.to_string() };
        let list: OrderList = Self::data(self.post("/api/orders/active", &req).await?, "orders")?;
        Ok(list.orders)
    }

    /// One page of the full history, newest first
    pub async fn order_history(&self, mail: &str, page: u32, per_page: u32) -> ClientResult<Vec<Order>> {
        let body = json!({ "mail": mail, "page": page, "perPage": per_page });
        let list: OrderList = Self::data(self.post("/api/orders/history", &body).await?, "orders")?;
        Ok(list.orders)
    }

    // ========== Payments ==========

    /// Hosted payment page for a balance top-up
    pub async fn create_payment_link(&self, sum: f64, mail: &str, phone: &str) -> ClientResult<PaymentLink> {
        let req = CreatePaymentLinkRequest {
            sum,
            mail: mail.to_string(),
            phone: phone.to_string(),
        };
        Self::data(self.post("/api/payments/link", &req).await?, "payment link")
    }

    pub async fn charge_saved_card(&self, client_id: Id, amount: f64) -> ClientResult<TopUpResult> {
        let req = ChargeSavedCardRequest { client_id, amount };
        Self::data(self.post("/api/payments/saved-card/charge", &req).await?, "top-up")
    }

    pub async fn saved_card(&self, client_id: Id) -> ClientResult<SavedCardView> {
        Self::data(self.get(&format!("/api/payments/saved-card/{client_id}")).await?, "saved card")
    }

    pub async fn delete_saved_card(&self, client_id: Id) -> ClientResult<()> {
        self.delete::<ApiResponse<()>>(&format!("/api/payments/saved-card/{client_id}"))
            .await?;
        Ok(())
    }
}
