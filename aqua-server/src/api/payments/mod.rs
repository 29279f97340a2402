//! Payment API
//!
//! | Path | Method | Body | Data |
//! |------|--------|------|------|
//! | /api/payments/link | POST | `{sum, mail, phone}` | `{paymentUrl, transactionId}` |
//! | /api/payments/callback | POST | gateway-defined (form, multipart, JSON) | bare status |
//! | /api/payments/saved-card/charge | POST | `{clientId, amount}` | `{transactionId, balance}` |
//! | /api/payments/saved-card/{client_id} | GET / DELETE | - | `{maskedPan, expiry}` / - |
//!
//! The callback is authenticated by the gateway signature, not by a session.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/link", post(handler::create_link))
        .route("/callback", post(handler::callback))
        .route("/saved-card/charge", post(handler::charge_saved_card))
        .route(
            "/saved-card/{client_id}",
            get(handler::get_saved_card).delete(handler::delete_saved_card),
        )
}
