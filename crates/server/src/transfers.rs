//! Transfers API endpoints

use api_types::transfer::{TransferListResponse, TransferNew, TransferUpdate, TransferView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{LedgerTarget, NewTransferCmd, TransferStatus, UpdateTransferCmd};
use uuid::Uuid;

use crate::{ServerError, parse_optional, server::ServerState, user, utc};

fn map_transfer(transfer: engine::Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        amount_minor: transfer.amount_minor,
        currency_code: transfer.currency,
        transfer_date: transfer.transfer_date,
        from_account_id: transfer.from_account_id,
        to_account_id: transfer.destination.account_id(),
        to_card_id: transfer.destination.card_id(),
        status: transfer.status.as_str().to_string(),
        description: transfer.description,
        notes: transfer.notes,
        created_at: transfer.created_at,
        updated_at: transfer.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<TransferListResponse>, ServerError> {
    let transfers = state
        .engine
        .list_transfers(&user.username)
        .await?
        .into_iter()
        .map(map_transfer)
        .collect();
    Ok(Json(TransferListResponse { transfers }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let destination = LedgerTarget::from_pair(payload.to_account_id, payload.to_card_id)?;
    let mut cmd = NewTransferCmd::new(
        &user.username,
        payload.from_account_id,
        destination,
        payload.amount_minor,
        payload.currency_code,
        utc(payload.transfer_date),
    );
    if let Some(status) = parse_optional::<TransferStatus>(payload.status.as_deref())? {
        cmd = cmd.status(status);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let transfer = state.engine.create_transfer(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_transfer(transfer))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransferView>, ServerError> {
    let transfer = state.engine.transfer(id, &user.username).await?;
    Ok(Json(map_transfer(transfer)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransferUpdate>,
) -> Result<Json<TransferView>, ServerError> {
    let cmd = UpdateTransferCmd {
        amount_minor: payload.amount_minor,
        currency: payload.currency_code,
        transfer_date: payload.transfer_date.map(utc),
        status: parse_optional::<TransferStatus>(payload.status.as_deref())?,
        description: payload.description,
        notes: payload.notes,
    };

    let transfer = state
        .engine
        .update_transfer(id, &user.username, cmd)
        .await?;
    Ok(Json(map_transfer(transfer)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transfer(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
