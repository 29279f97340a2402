//! Client API Handlers

use axum::{Json, extract::State};
use shared::request::{
    AddAddressRequest, AdjustLedgerRequest, ClientLookup, ConfirmCodeRequest, RemoveAddressRequest,
    SendCodeRequest, UpdateAddressRequest, UpdateClientRequest,
};
use shared::response::ClientEnvelope;

use crate::core::ServerState;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

type ClientResponse = AppResult<Json<ApiResponse<ClientEnvelope>>>;

pub async fn send_code(
    State(state): State<ServerState>,
    Json(req): Json<SendCodeRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.registration.send_code(&req.mail).await?;
    Ok(Json(ApiResponse::success_with_message("Verification code sent", ())))
}

pub async fn confirm_code(State(state): State<ServerState>, Json(req): Json<ConfirmCodeRequest>) -> ClientResponse {
    let client = state.registration.confirm_code(&req.mail, &req.code)?;
    Ok(ok(ClientEnvelope { client }))
}

pub async fn get_client(State(state): State<ServerState>, Json(req): Json<ClientLookup>) -> ClientResponse {
    let client = state.clients.get_client(&req.mail)?;
    Ok(ok(ClientEnvelope { client }))
}

pub async fn update_client(State(state): State<ServerState>, Json(req): Json<UpdateClientRequest>) -> ClientResponse {
    let client = state.clients.update_client(&req.mail, req.update)?;
    Ok(ok_with_message(ClientEnvelope { client }, "Client updated"))
}

pub async fn add_address(State(state): State<ServerState>, Json(req): Json<AddAddressRequest>) -> ClientResponse {
    let client = state.clients.add_address(&req.mail, req.address)?;
    Ok(ok_with_message(ClientEnvelope { client }, "Address added"))
}

pub async fn update_address(State(state): State<ServerState>, Json(req): Json<UpdateAddressRequest>) -> ClientResponse {
    let client = state
        .clients
        .update_address(&req.mail, req.address_id, req.address)?;
    Ok(ok_with_message(ClientEnvelope { client }, "Address updated"))
}

pub async fn remove_address(State(state): State<ServerState>, Json(req): Json<RemoveAddressRequest>) -> ClientResponse {
    let client = state.clients.remove_address(&req.mail, req.address_id)?;
    Ok(ok_with_message(ClientEnvelope { client }, "Address removed"))
}

/// Staff-side balance / bottle-credit correction
pub async fn adjust_ledger(State(state): State<ServerState>, Json(req): Json<AdjustLedgerRequest>) -> ClientResponse {
    validate_required_text(&req.request_id, "requestId", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;
    let client = state
        .ledger
        .adjust(&req.mail, &req.request_id, &req.adjustment, req.note.as_deref())?;
    Ok(ok_with_message(ClientEnvelope { client }, "Ledger adjusted"))
}
