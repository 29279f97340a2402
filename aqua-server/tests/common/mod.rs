//! Shared harness: in-memory state, stub integrations, oneshot requests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use aqua_server::core::{Config, Integrations, ServerState};
use aqua_server::notify::{LogPushSender, Mailer, NotifyError};
use aqua_server::payment::gateway::LinkRequest;
use aqua_server::payment::{GatewayError, PaymentGateway, signing};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Keeps mails so tests can read confirmation codes
#[derive(Debug, Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingMailer {
    pub fn code_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.iter().rev().find(|(addr, _)| addr == to)?;
        let rest = body.split("code is: ").nth(1)?;
        Some(rest.chars().take_while(|c| c.is_ascii_digit()).collect())
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Gateway that accepts everything
#[derive(Debug, Default)]
pub struct AcceptingGateway;

#[async_trait]
impl PaymentGateway for AcceptingGateway {
    async fn create_link(&self, request: &LinkRequest<'_>) -> Result<String, GatewayError> {
        Ok(format!("https://pay.test/{}", request.transaction_id))
    }

    async fn charge_token(&self, _token: &str, _amount: f64, _transaction_id: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn delete_card(&self, _token: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

pub struct TestApp {
    pub state: ServerState,
    pub router: Router,
    pub mailer: Arc<CapturingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mailer = Arc::new(CapturingMailer::default());
        let integrations = Integrations {
            gateway: Arc::new(AcceptingGateway),
            mailer: mailer.clone(),
            push: Arc::new(LogPushSender),
        };
        let state = ServerState::in_memory(config, integrations).unwrap();
        let router = aqua_server::api::build_app(state.clone());
        Self { state, router, mailer }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_with_token(uri, body, None).await
    }

    /// POST with the configured staff token
    pub async fn post_as_staff(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let token = self.state.config.staff_token.clone();
        self.post_with_token(uri, body, Some(&token)).await
    }

    pub async fn post_with_token(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.send(req).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_raw(&self, uri: &str, content_type: &str, body: String) -> StatusCode {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.router.clone().oneshot(req).await.unwrap().status()
    }

    /// Full confirmation-code flow; returns the created client
    pub async fn register(&self, mail: &str) -> Value {
        let (status, _) = self.post("/api/clients/send-code", json!({ "mail": mail })).await;
        assert_eq!(status, StatusCode::OK);
        let code = self.mailer.code_for(mail).expect("code mailed");
        let (status, body) = self
            .post("/api/clients/confirm-code", json!({ "mail": mail, "code": code }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["client"].clone()
    }

    pub async fn client(&self, mail: &str) -> Value {
        let (status, body) = self.post("/api/clients/get", json!({ "mail": mail })).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["client"].clone()
    }

    pub async fn adjust(&self, mail: &str, request_id: &str, delta: Value) {
        let mut body = json!({ "mail": mail, "requestId": request_id });
        if let (Some(target), Some(fields)) = (body.as_object_mut(), delta.as_object()) {
            target.extend(fields.clone());
        }
        let (status, resp) = self.post_as_staff("/api/clients/adjust", body).await;
        assert_eq!(status, StatusCode::OK, "{resp}");
    }

    pub fn callback_secret(&self) -> String {
        self.state.config.payment.callback_secret.clone()
    }

    /// Url-encoded callback body signed with the configured secret
    pub fn signed_form(&self, fields: &[(&str, &str)]) -> String {
        let signature = signing::sign(&self.callback_secret(), fields.iter().copied());
        let mut parts: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        parts.push(format!("signature={signature}"));
        parts.join("&")
    }
}

pub fn place_body(mail: &str, actual: &str, date: &str, b12: u32, b19: u32, op_form: &str) -> Value {
    json!({
        "mail": mail,
        "address": { "actual": actual, "name": "Home", "phone": "+77010000000", "point": { "lat": 43.23, "lon": 76.95 } },
        "products": { "b12": b12, "b19": b19 },
        "date": { "d": date, "time": "10:00-12:00" },
        "opForm": op_form,
        "needCall": false
    })
}
