//! Gateway callback payload
//!
//! The gateway posts the outcome of a hosted payment as url-encoded form,
//! multipart form or JSON depending on its configuration. [`CallbackPayload`]
//! flattens all three into one string map, which is also what the signature
//! is computed over.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;

use super::error::{PaymentError, PaymentResult};
use super::signing;

/// Raw callback fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackPayload {
    fields: BTreeMap<String, String>,
}

impl CallbackPayload {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Flatten a JSON object; nulls are dropped, nested values kept as JSON text
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, Value> = serde_json::from_slice(body)?;
        let fields = object
            .into_iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    Value::Null => return None,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((k, value))
            })
            .collect();
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Constant-time check of the `signature` field against the callback secret
    pub fn verify_signature(&self, secret: &str) -> PaymentResult<()> {
        let signature = self.get(signing::SIGNATURE_FIELD).unwrap_or_default();
        signing::verify(secret, self.pairs(), signature).map_err(|reason| {
            crate::security_log!(
                WARN,
                "callback_signature_invalid",
                reason = reason,
                transaction_id = self.get("transaction_id").unwrap_or("-")
            );
            PaymentError::InvalidSignature
        })
    }

    /// Interpret the verified fields
    pub fn notice(&self) -> PaymentResult<CallbackNotice> {
        let transaction_id = self
            .get("transaction_id")
            .ok_or(PaymentError::MissingField("transaction_id"))?
            .to_string();
        let status = self.get("status").ok_or(PaymentError::MissingField("status"))?;
        let succeeded = matches!(
            status.to_ascii_lowercase().as_str(),
            "success" | "succeeded" | "paid" | "approved"
        );
        let amount = match self.get("amount") {
            None => None,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => return Err(PaymentError::MissingField("amount")),
            },
        };

        let card = self.get("card_token").map(|token| CardDetails {
            token: token.to_string(),
            masked_pan: self.get("card_mask").unwrap_or("****").to_string(),
            expiry: self.get("card_expiry").map(str::to_string),
        });

        Ok(CallbackNotice {
            transaction_id,
            succeeded,
            amount,
            card,
        })
    }
}

/// Outcome reported by the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackNotice {
    pub transaction_id: String,
    pub succeeded: bool,
    pub amount: Option<f64>,
    /// Present when the payer agreed to save the card
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub token: String,
    pub masked_pan: String,
    pub expiry: Option<String>,
}

impl<S> FromRequest<S> for CallbackPayload
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?;
            return Self::from_json(&body).map_err(|e| {
                tracing::warn!(error = %e, "Failed to parse JSON payment callback");
                StatusCode::BAD_REQUEST
            });
        }

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?;
            let mut fields = BTreeMap::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                fields.insert(name, value);
            }
            return Ok(Self { fields });
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<BTreeMap<String, String>>::from_request(req, state)
                .await
                .map_err(|_| StatusCode::BAD_REQUEST)?;
            return Ok(Self { fields });
        }

        tracing::warn!(content_type = %content_type, "Unsupported payment callback content type");
        Err(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }
}
