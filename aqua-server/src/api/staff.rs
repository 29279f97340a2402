//! Staff access for dispatch and ledger routes
//!
//! [`identify_staff`] runs for every request and marks it with [`StaffAccess`]
//! when `Authorization: Bearer <token>` carries the configured staff token.
//! [`require_staff`] is layered onto the staff-only routes and rejects
//! requests without the mark.
//!
//! # Errors
//!
//! | Case | HTTP status |
//! |------|-------------|
//! | No or wrong staff token | 401 Unauthorized (`NotAuthenticated`) |

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::core::ServerState;
use crate::utils::{AppError, ErrorCode};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_LABEL: &[u8] = b"aqua-staff-token";

/// Request extension set for callers holding the staff token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffAccess;

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Compare two tokens in constant time
fn tokens_match(expected: &str, provided: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    mac.update(TOKEN_LABEL);
    let tag = mac.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(provided.as_bytes()) else {
        return false;
    };
    mac.update(TOKEN_LABEL);
    mac.verify_slice(&tag).is_ok()
}

/// Mark requests that carry the staff token; never rejects
pub async fn identify_staff(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let is_staff = bearer(&req).is_some_and(|token| tokens_match(&state.config.staff_token, token));
    if is_staff {
        req.extensions_mut().insert(StaffAccess);
    }
    next.run(req).await
}

/// Reject requests that were not marked by [`identify_staff`]
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<StaffAccess>().is_none() {
        crate::security_log!(
            WARN,
            "staff_access_denied",
            method = %req.method(),
            uri = %req.uri(),
            token_present = bearer(&req).is_some()
        );
        return Err(AppError::with_message(
            ErrorCode::NotAuthenticated,
            "Staff token required",
        ));
    }
    Ok(next.run(req).await)
}
