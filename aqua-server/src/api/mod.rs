//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness
//! - [`clients`] - confirmation codes, profile, address book, staff adjustments
//! - [`orders`] - placement, cancellation, views, field updates
//! - [`payments`] - payment links, gateway callback, saved cards
//!
//! Staff-only routes (`/api/clients/adjust`, `/api/orders/update`) sit behind
//! [`staff::require_staff`].
//!
//! Every handler returns `ApiResponse<T>` (`{success, code, message, data}`)
//! except the gateway callback, which answers with a bare status code.

pub mod clients;
pub mod health;
pub mod middleware;
pub mod orders;
pub mod payments;
pub mod staff;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(clients::router())
        .merge(orders::router())
        .merge(payments::router())
}

/// Fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    let timeout = state.config.request_timeout();
    build_router()
        .layer(axum::middleware::from_fn_with_state(state.clone(), staff::identify_staff))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
