//! Client API
//!
//! | Path | Method | Body | Data |
//! |------|--------|------|------|
//! | /api/clients/send-code | POST | `{mail}` | - |
//! | /api/clients/confirm-code | POST | `{mail, code}` | `{client}` |
//! | /api/clients/get | POST | `{mail}` | `{client}` |
//! | /api/clients/update | POST | `{mail, field, value}` | `{client}` |
//! | /api/clients/addresses | POST / PUT / DELETE | address book edits | `{client}` |
//! | /api/clients/adjust | POST | staff balance / credit delta (staff token) | `{client}` |

mod handler;

use axum::{Router, middleware, routing::post};

use crate::api::staff::require_staff;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/clients", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/send-code", post(handler::send_code))
        .route("/confirm-code", post(handler::confirm_code))
        .route("/get", post(handler::get_client))
        .route("/update", post(handler::update_client))
        .route(
            "/addresses",
            post(handler::add_address)
                .put(handler::update_address)
                .delete(handler::remove_address),
        )
        .route(
            "/adjust",
            post(handler::adjust_ledger).layer(middleware::from_fn(require_staff)),
        )
}
