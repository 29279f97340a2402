//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::request::{
    CancelOrderRequest, ClientLookup, ClientOrdersRequest, OrderLookup, PlaceOrderRequest,
    RepeatOrderRequest, UpdateOrderRequest,
};
use shared::response::{OrderEnvelope, OrderList};
use shared::types::Id;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

type OrderResponse = AppResult<Json<ApiResponse<OrderEnvelope>>>;
type OrderListResponse = AppResult<Json<ApiResponse<OrderList>>>;

pub async fn place_order(State(state): State<ServerState>, Json(req): Json<PlaceOrderRequest>) -> OrderResponse {
    let order = state.orders.place_order(req)?;
    Ok(ok_with_message(OrderEnvelope { order }, "Order placed"))
}

/// Cancelling an already cancelled order returns it unchanged
pub async fn cancel_order(State(state): State<ServerState>, Json(req): Json<CancelOrderRequest>) -> OrderResponse {
    let order = state.orders.cancel_order(req.order_id, req.reason)?;
    Ok(ok_with_message(OrderEnvelope { order }, "Order cancelled"))
}

pub async fn active_orders(State(state): State<ServerState>, Json(req): Json<ClientLookup>) -> OrderListResponse {
    let orders = state.orders.active_orders(&req.mail)?;
    Ok(ok(OrderList { orders }))
}

pub async fn order_history(State(state): State<ServerState>, Json(req): Json<ClientOrdersRequest>) -> OrderListResponse {
    let orders = state.orders.list_client_orders(&req.mail, &req.page)?;
    Ok(ok(OrderList { orders }))
}

pub async fn update_order(State(state): State<ServerState>, Json(req): Json<UpdateOrderRequest>) -> OrderResponse {
    let order = state.orders.update_order(req.order_id, req.update)?;
    Ok(ok_with_message(OrderEnvelope { order }, "Order updated"))
}

pub async fn repeat_order(State(state): State<ServerState>, Json(req): Json<RepeatOrderRequest>) -> OrderResponse {
    let order = state.orders.repeat_last_order(&req.mail, req.date)?;
    Ok(ok_with_message(OrderEnvelope { order }, "Order placed"))
}

pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<Id>) -> OrderResponse {
    let order = state.orders.get_order(id)?;
    Ok(ok(OrderEnvelope { order }))
}

pub async fn get_order(State(state): State<ServerState>, Json(req): Json<OrderLookup>) -> OrderResponse {
    let order = state.orders.get_order(req.order_id)?;
    Ok(ok(OrderEnvelope { order }))
}
