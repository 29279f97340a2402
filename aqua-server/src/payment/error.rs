use shared::types::Id;
use thiserror::Error;

use crate::db::StorageError;
use crate::ledger::SettlementError;
use crate::utils::{AppError, ErrorCode};

/// Failure talking to the card gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Callback signature verification failed")]
    InvalidSignature,

    #[error("Callback is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown payment transaction: {0}")]
    UnknownTransaction(String),

    #[error("Callback amount {received} does not match payment amount {expected}")]
    AmountMismatch { expected: f64, received: f64 },

    #[error("No saved card for client {0}")]
    SavedCardNotFound(Id),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type PaymentResult<T> = Result<T, PaymentError>;

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => AppError::new(ErrorCode::InvalidSignature),
            PaymentError::MissingField(field) => {
                AppError::with_message(ErrorCode::RequiredField, err.to_string()).with_detail("field", field)
            }
            PaymentError::UnknownTransaction(_) => AppError::with_message(ErrorCode::NotFound, err.to_string()),
            PaymentError::AmountMismatch { .. } => AppError::with_message(ErrorCode::PaymentFailed, err.to_string()),
            PaymentError::SavedCardNotFound(_) => {
                AppError::with_message(ErrorCode::SavedCardNotFound, err.to_string())
            }
            PaymentError::ClientNotFound(_) => AppError::with_message(ErrorCode::ClientNotFound, err.to_string()),
            PaymentError::Gateway(GatewayError::Declined(reason)) => {
                AppError::with_message(ErrorCode::PaymentFailed, format!("Payment declined: {reason}"))
            }
            PaymentError::Gateway(e) => AppError::gateway(e.to_string()),
            PaymentError::Settlement(e) => e.into(),
            PaymentError::Storage(e) => e.into(),
        }
    }
}
