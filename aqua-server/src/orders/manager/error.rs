use shared::order::OrderStatus;
use shared::types::Id;
use thiserror::Error;

use crate::db::StorageError;
use crate::ledger::SettlementError;
use crate::utils::{AppError, ErrorCode};

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Input rejected before anything was persisted
    #[error(transparent)]
    Rejected(#[from] AppError),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(Id),

    #[error("Order already exists for this date ({date}) and address ({address})")]
    OrderAlreadyExists { date: String, address: String },

    #[error("Order already delivered: {0}")]
    OrderAlreadyDelivered(Id),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("At least {min} bottles are required per order, got {total}")]
    InsufficientQuantity { total: u32, min: u32 },

    #[error("At most {max} bottles are allowed per order, got {total}")]
    TooManyBottles { total: u32, max: u32 },

    #[error("No previous order for {0}")]
    NoPreviousOrder(String),
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => e.into(),
            ManagerError::Settlement(e) => e.into(),
            ManagerError::Rejected(e) => e,
            ManagerError::ClientNotFound(mail) => {
                AppError::with_message(ErrorCode::ClientNotFound, format!("Client not found: {mail}"))
                    .with_detail("mail", mail)
            }
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {id}"))
                    .with_detail("order_id", id)
            }
            e @ ManagerError::OrderAlreadyExists { .. } => {
                AppError::with_message(ErrorCode::OrderAlreadyExists, e.to_string())
            }
            ManagerError::OrderAlreadyDelivered(id) => AppError::with_message(
                ErrorCode::OrderAlreadyDelivered,
                format!("Order already delivered: {id}"),
            )
            .with_detail("order_id", id),
            e @ ManagerError::InvalidTransition { .. } => {
                AppError::with_message(ErrorCode::InvalidStatusTransition, e.to_string())
            }
            e @ ManagerError::InsufficientQuantity { .. } => {
                AppError::with_message(ErrorCode::InsufficientQuantity, e.to_string())
            }
            e @ ManagerError::TooManyBottles { .. } => {
                AppError::with_message(ErrorCode::ValueOutOfRange, e.to_string())
                    .with_detail("field", "products")
            }
            ManagerError::NoPreviousOrder(mail) => AppError::with_message(
                ErrorCode::NoPreviousOrder,
                format!("No previous order for {mail}"),
            ),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
