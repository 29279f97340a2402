//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::request::{ChargeSavedCardRequest, CreatePaymentLinkRequest};
use shared::response::{PaymentLink, SavedCardView, TopUpResult};
use shared::types::Id;

use crate::core::ServerState;
use crate::payment::{CallbackOutcome, CallbackPayload, PaymentError};
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

pub async fn create_link(
    State(state): State<ServerState>,
    Json(req): Json<CreatePaymentLinkRequest>,
) -> AppResult<Json<ApiResponse<PaymentLink>>> {
    let link = state.payments.create_payment_link(&req).await?;
    Ok(ok(link))
}

/// Gateway callback
///
/// Answers 200 for settled and duplicate deliveries so the gateway stops
/// retrying; storage failures answer 500 so it retries later.
pub async fn callback(State(state): State<ServerState>, payload: CallbackPayload) -> StatusCode {
    match state.payments.handle_callback(&payload) {
        Ok(CallbackOutcome::Credited(balance)) => {
            tracing::info!(balance, "Payment callback settled");
            StatusCode::OK
        }
        Ok(CallbackOutcome::Failed | CallbackOutcome::Duplicate) => StatusCode::OK,
        Err(PaymentError::InvalidSignature) => StatusCode::UNAUTHORIZED,
        Err(e @ (PaymentError::MissingField(_) | PaymentError::AmountMismatch { .. })) => {
            tracing::warn!(error = %e, "Rejected payment callback");
            StatusCode::BAD_REQUEST
        }
        Err(e @ PaymentError::UnknownTransaction(_)) => {
            tracing::warn!(error = %e, "Payment callback for unknown transaction");
            StatusCode::NOT_FOUND
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to settle payment callback");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn charge_saved_card(
    State(state): State<ServerState>,
    Json(req): Json<ChargeSavedCardRequest>,
) -> AppResult<Json<ApiResponse<TopUpResult>>> {
    let result = state.payments.charge_saved_card(req.client_id, req.amount).await?;
    Ok(ok_with_message(result, "Balance topped up"))
}

pub async fn get_saved_card(
    State(state): State<ServerState>,
    Path(client_id): Path<Id>,
) -> AppResult<Json<ApiResponse<SavedCardView>>> {
    Ok(ok(state.payments.get_saved_card(client_id)?))
}

pub async fn delete_saved_card(
    State(state): State<ServerState>,
    Path(client_id): Path<Id>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.payments.delete_saved_card(client_id).await?;
    Ok(Json(ApiResponse::success_with_message("Saved card deleted", ())))
}
