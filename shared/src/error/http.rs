//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ClientNotFound
            | Self::AddressNotFound
            | Self::OrderNotFound
            | Self::NoPreviousOrder
            | Self::SavedCardNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderAlreadyExists
            | Self::OrderAlreadyDelivered
            | Self::InvalidStatusTransition
            | Self::CodeSendInProgress => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::InvalidSignature => StatusCode::UNAUTHORIZED,

            // 402 Payment Required
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,

            // 429 Too Many Requests
            Self::TooManyAttempts | Self::CodeResendCooldown => StatusCode::TOO_MANY_REQUESTS,

            // 502 Bad Gateway
            Self::GatewayUnavailable | Self::PaymentFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::StorageFull
            | Self::StorageCorrupted
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation / business rule)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
