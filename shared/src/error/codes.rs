//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / confirmation-code errors
//! - 3xxx: Client account errors
//! - 4xxx: Order errors
//! - 5xxx: Payment and ledger errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire so the mobile client can switch on it
/// without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Verification code expired
    VerificationCodeExpired = 1010,
    /// Verification code invalid
    VerificationCodeInvalid = 1011,
    /// Too many verification attempts
    TooManyAttempts = 1012,
    /// A code was sent recently, resend is on cooldown
    CodeResendCooldown = 1013,
    /// A code for this email is being sent right now
    CodeSendInProgress = 1014,

    // ==================== 3xxx: Client ====================
    /// Client account not found
    ClientNotFound = 3001,
    /// Delivery address not found
    AddressNotFound = 3002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// An active order already exists for this date and address
    OrderAlreadyExists = 4002,
    /// Order has already been delivered
    OrderAlreadyDelivered = 4004,
    /// Status transition is not allowed
    InvalidStatusTransition = 4005,
    /// Not enough bottles in the order
    InsufficientQuantity = 4006,
    /// Payment form is not enabled for this client
    PaymentMethodMismatch = 4007,
    /// Client has no previous order to repeat
    NoPreviousOrder = 4008,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Balance or bottle credits do not cover the charge
    InsufficientFunds = 5002,
    /// Gateway signature did not verify
    InvalidSignature = 5004,
    /// Payment gateway unreachable or returned an error
    GatewayUnavailable = 5005,
    /// No saved card for this client
    SavedCardNotFound = 5006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,

    // ==================== 94xx: Storage ====================
    /// Storage is full
    StorageFull = 9401,
    /// Storage is corrupted
    StorageCorrupted = 9403,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default plain-language message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::VerificationCodeExpired => "Verification code has expired",
            ErrorCode::VerificationCodeInvalid => "Invalid verification code",
            ErrorCode::TooManyAttempts => "Too many attempts",
            ErrorCode::CodeResendCooldown => "Please wait before requesting a new code",
            ErrorCode::CodeSendInProgress => "A code is already being sent",

            // Client
            ErrorCode::ClientNotFound => "Client not found",
            ErrorCode::AddressNotFound => "Address not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyExists => "Order already exists for this date",
            ErrorCode::OrderAlreadyDelivered => "Order has already been delivered",
            ErrorCode::InvalidStatusTransition => "Order status change is not allowed",
            ErrorCode::InsufficientQuantity => "Not enough bottles in the order",
            ErrorCode::PaymentMethodMismatch => "Payment method is not available",
            ErrorCode::NoPreviousOrder => "No previous order to repeat",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::InsufficientFunds => "Insufficient balance or bottle credits",
            ErrorCode::InvalidSignature => "Invalid payment signature",
            ErrorCode::GatewayUnavailable => "Payment service is unavailable",
            ErrorCode::SavedCardNotFound => "No saved card",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::StorageFull => "Storage is full",
            ErrorCode::StorageCorrupted => "Storage is corrupted",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1010 => Ok(ErrorCode::VerificationCodeExpired),
            1011 => Ok(ErrorCode::VerificationCodeInvalid),
            1012 => Ok(ErrorCode::TooManyAttempts),
            1013 => Ok(ErrorCode::CodeResendCooldown),
            1014 => Ok(ErrorCode::CodeSendInProgress),

            3001 => Ok(ErrorCode::ClientNotFound),
            3002 => Ok(ErrorCode::AddressNotFound),

            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyExists),
            4004 => Ok(ErrorCode::OrderAlreadyDelivered),
            4005 => Ok(ErrorCode::InvalidStatusTransition),
            4006 => Ok(ErrorCode::InsufficientQuantity),
            4007 => Ok(ErrorCode::PaymentMethodMismatch),
            4008 => Ok(ErrorCode::NoPreviousOrder),

            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::InsufficientFunds),
            5004 => Ok(ErrorCode::InvalidSignature),
            5005 => Ok(ErrorCode::GatewayUnavailable),
            5006 => Ok(ErrorCode::SavedCardNotFound),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
