//! Card gateway client
//!
//! The gateway exposes three form-encoded endpoints, each signed with the
//! merchant secret (see [`super::signing`]):
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `POST {base}/payments/link` | Hosted payment page for a top-up |
//! | `POST {base}/cards/charge` | Direct charge of a tokenized card |
//! | `POST {base}/cards/delete` | Forget a tokenized card |
//!
//! Responses are JSON: `{"success": bool, "paymentUrl"?: string, "message"?: string}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::error::GatewayError;
use super::signing;
use crate::core::PaymentConfig;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Top-up link request
#[derive(Debug, Clone)]
pub struct LinkRequest<'a> {
    pub transaction_id: &'a str,
    pub amount: f64,
    pub mail: &'a str,
    pub phone: &'a str,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    /// Request a hosted payment page; returns its URL
    async fn create_link(&self, request: &LinkRequest<'_>) -> Result<String, GatewayError>;

    /// Charge a tokenized card without redirect
    async fn charge_token(&self, token: &str, amount: f64, transaction_id: &str) -> Result<(), GatewayError>;

    async fn delete_card(&self, token: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayResponse {
    success: bool,
    #[serde(default)]
    payment_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl GatewayResponse {
    fn into_result(self) -> Result<Self, GatewayError> {
        if self.success {
            Ok(self)
        } else {
            Err(GatewayError::Declined(
                self.message.unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}

/// Amounts go over the wire with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// reqwest-backed gateway
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl HttpGateway {
    pub fn new(config: PaymentConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.gateway_url.trim_end_matches('/'), path)
    }

    /// Add merchant id and signature, post, and decode
    async fn post_signed(&self, path: &str, mut fields: Vec<(&str, String)>) -> Result<GatewayResponse, GatewayError> {
        fields.push(("merchant_id", self.config.merchant_id.clone()));
        let signature = signing::sign(
            &self.config.secret_key,
            fields.iter().map(|(k, v)| (*k, v.as_str())),
        );
        fields.push((signing::SIGNATURE_FIELD, signature));

        let resp = self.client.post(self.url(path)).form(&fields).send().await?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(GatewayError::Transport(format!("gateway returned {status}")));
        }
        let body: GatewayResponse = resp.json().await?;
        tracing::debug!(path = path, success = body.success, "Gateway response");
        body.into_result()
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_link(&self, request: &LinkRequest<'_>) -> Result<String, GatewayError> {
        let fields = vec![
            ("transaction_id", request.transaction_id.to_string()),
            ("amount", format_amount(request.amount)),
            ("mail", request.mail.to_string()),
            ("phone", request.phone.to_string()),
            ("return_url", self.config.return_url.clone()),
            ("save_card", "true".to_string()),
        ];
        let resp = self.post_signed("payments/link", fields).await?;
        resp.payment_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("missing paymentUrl".to_string()))
    }

    async fn charge_token(&self, token: &str, amount: f64, transaction_id: &str) -> Result<(), GatewayError> {
        let fields = vec![
            ("token", token.to_string()),
            ("amount", format_amount(amount)),
            ("transaction_id", transaction_id.to_string()),
        ];
        self.post_signed("cards/charge", fields).await.map(|_| ())
    }

    async fn delete_card(&self, token: &str) -> Result<(), GatewayError> {
        self.post_signed("cards/delete", vec![("token", token.to_string())])
            .await
            .map(|_| ())
    }
}
