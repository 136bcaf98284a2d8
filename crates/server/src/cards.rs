//! Cards API endpoints.

use api_types::{
    ArchivedQuery,
    card::{CardListResponse, CardNew, CardUpdate, CardView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{FieldPatch, NewCardCmd, UpdateCardCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user, uuid_patch};

fn map_card(card: engine::Card) -> CardView {
    CardView {
        id: card.id,
        name: card.name,
        bank_name: card.bank_name,
        currency_code: card.currency,
        credit_limit_minor: card.credit_limit_minor,
        balance_minor: card.balance_minor,
        billing_cycle_day: card.billing_cycle_day,
        payment_due_day: card.payment_due_day,
        linked_account_id: card.linked_account_id,
        archived: card.archived,
        created_at: card.created_at,
        updated_at: card.updated_at,
    }
}

fn set_if_present<T>(value: Option<T>) -> FieldPatch<T> {
    value.map_or(FieldPatch::Keep, FieldPatch::Set)
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ArchivedQuery>,
) -> Result<Json<CardListResponse>, ServerError> {
    let cards = state
        .engine
        .list_cards(&user.username, query.include_archived.unwrap_or(false))
        .await?
        .into_iter()
        .map(map_card)
        .collect();
    Ok(Json(CardListResponse { cards }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CardNew>,
) -> Result<(StatusCode, Json<CardView>), ServerError> {
    let cmd = NewCardCmd {
        bank_name: payload.bank_name,
        credit_limit_minor: payload.credit_limit_minor,
        billing_cycle_day: payload.billing_cycle_day,
        payment_due_day: payload.payment_due_day,
        linked_account_id: payload.linked_account_id,
        ..NewCardCmd::new(&user.username, payload.name, payload.currency_code)
    };

    let card = state.engine.create_card(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_card(card))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CardView>, ServerError> {
    let card = state.engine.card(id, &user.username).await?;
    Ok(Json(map_card(card)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CardUpdate>,
) -> Result<Json<CardView>, ServerError> {
    let cmd = UpdateCardCmd {
        name: payload.name,
        bank_name: payload.bank_name,
        credit_limit_minor: set_if_present(payload.credit_limit_minor),
        billing_cycle_day: set_if_present(payload.billing_cycle_day),
        payment_due_day: set_if_present(payload.payment_due_day),
        linked_account_id: uuid_patch(payload.linked_account_id),
    };
    let card = state.engine.update_card(id, &user.username, cmd).await?;
    Ok(Json(map_card(card)))
}

pub async fn archive(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CardView>, ServerError> {
    let card = state.engine.archive_card(id, &user.username).await?;
    Ok(Json(map_card(card)))
}

pub async fn unarchive(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CardView>, ServerError> {
    let card = state.engine.unarchive_card(id, &user.username).await?;
    Ok(Json(map_card(card)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_card(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
