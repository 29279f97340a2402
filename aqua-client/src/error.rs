//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (includes timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected input or business rule (4xx other than the above)
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// Server-side or gateway failure (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// Client cannot pay for the order; nothing was sent
    #[error("Order cannot be paid: {0}")]
    Funds(#[from] shared::LedgerError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Business error code from the response envelope, when there is one
    pub fn code(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
