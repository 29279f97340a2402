//! Order API Module
//!
//! | Path | Method | Body | Data |
//! |------|--------|------|------|
//! | /api/orders/place | POST | place order | `{order}` |
//! | /api/orders/cancel | POST | `{orderId, reason}` | `{order}` |
//! | /api/orders/active | POST | `{mail}` | `{orders}` (non-terminal) |
//! | /api/orders/history | POST | `{mail, page, perPage}` | `{orders}` (newest first) |
//! | /api/orders/update | POST | `{orderId, field, value}` (staff token) | `{order}` |
//! | /api/orders/repeat | POST | `{mail, date}` | `{order}` |
//! | /api/orders/get | POST | `{orderId}` | `{order}` |
//! | /api/orders/{id} | GET | - | `{order}` |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::api::staff::require_staff;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/place", post(handler::place_order))
        .route("/cancel", post(handler::cancel_order))
        .route("/active", post(handler::active_orders))
        .route("/history", post(handler::order_history))
        .route(
            "/update",
            post(handler::update_order).layer(middleware::from_fn(require_staff)),
        )
        .route("/repeat", post(handler::repeat_order))
        .route("/get", post(handler::get_order))
        .route("/{id}", get(handler::get_by_id))
}
