//! Database Module
//!
//! Embedded redb store for clients, orders and settlement bookkeeping.

pub mod models;
pub mod storage;

pub use models::{PaymentRecord, PaymentStatus, SavedCard, SettlementKind, SettlementRecord};
pub use storage::{Storage, StorageError, StorageResult};

use crate::utils::{AppError, ErrorCode};

/// Map a storage failure to an application error code
///
/// redb reports most failures through generic variants, so disk-full and
/// corruption are recognised from the message text.
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) => return ErrorCode::InternalError,
        StorageError::EmailTaken(_) => return ErrorCode::AlreadyExists,
        _ => {}
    }

    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    ErrorCode::DatabaseError
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let code = classify_storage_error(&err);
        tracing::error!(error = %err, error_code = %code, "Storage error occurred");
        AppError::with_message(code, err.to_string())
    }
}
