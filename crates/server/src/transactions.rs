//! Transactions API endpoints

use api_types::transaction::{
    TransactionList, TransactionListResponse, TransactionNew, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    EntryType, LedgerTarget, NewTransactionCmd, SortOrder, TransactionListFilter,
    TransactionStatus, UpdateTransactionCmd,
};
use uuid::Uuid;

use crate::{ServerError, parse_optional, ref_filter, server::ServerState, user, utc, uuid_patch};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

fn page_size(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

fn map_transaction(view: engine::TransactionView) -> TransactionView {
    let tx = view.transaction;
    TransactionView {
        id: tx.id,
        description: tx.description,
        amount_minor: tx.amount_minor,
        currency_code: tx.currency,
        transaction_date: tx.transaction_date,
        status: tx.status.as_str().to_string(),
        entry_type: tx.entry_type.as_str().to_string(),
        category_id: tx.category_id,
        account_id: tx.target.account_id(),
        card_id: tx.target.card_id(),
        notes: tx.notes,
        attachment_count: view.attachment_count,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

fn list_filter(query: &TransactionList) -> Result<TransactionListFilter, ServerError> {
    let order = match query.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("desc") => SortOrder::Desc,
        Some("asc") => SortOrder::Asc,
        Some(other) => {
            return Err(ServerError::Generic(format!(
                "invalid order: {other}. Allowed values are asc, desc"
            )));
        }
    };

    Ok(TransactionListFilter {
        from: query.start_date.map(utc),
        to: query.end_date.map(utc),
        entry_type: parse_optional::<EntryType>(query.entry_type.as_deref())?,
        category: ref_filter(query.category_id),
        account: ref_filter(query.account_id),
        card: ref_filter(query.card_id),
        status: parse_optional::<TransactionStatus>(query.status.as_deref())?,
        description: query.description.clone(),
        order,
    })
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = list_filter(&query)?;
    let limit = page_size(query.limit);

    let (transactions, next_cursor) = state
        .engine
        .list_transactions_page(&user.username, limit, query.cursor.as_deref(), &filter)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(map_transaction).collect(),
        next_cursor,
    }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let target = LedgerTarget::from_pair(payload.account_id, payload.card_id)?;
    let entry_type = EntryType::try_from(payload.entry_type.as_str())?;

    let mut cmd = NewTransactionCmd::new(
        &user.username,
        target,
        entry_type,
        payload.amount_minor,
        payload.currency_code,
        utc(payload.transaction_date),
    );
    if let Some(status) = parse_optional::<TransactionStatus>(payload.status.as_deref())? {
        cmd = cmd.status(status);
    }
    if let Some(category_id) = payload.category_id {
        cmd = cmd.category(category_id);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let view = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_transaction(view))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let view = state.engine.transaction(id, &user.username).await?;
    Ok(Json(map_transaction(view)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let cmd = UpdateTransactionCmd {
        description: payload.description,
        amount_minor: payload.amount_minor,
        transaction_date: payload.transaction_date.map(utc),
        category_id: uuid_patch(payload.category_id),
        notes: payload.notes,
    };

    let view = state
        .engine
        .update_transaction(id, &user.username, cmd)
        .await?;
    Ok(Json(map_transaction(view)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let view = state.engine.approve_transaction(id, &user.username).await?;
    Ok(Json(map_transaction(view)))
}

pub async fn reject(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let view = state.engine.reject_transaction(id, &user.username).await?;
    Ok(Json(map_transaction(view)))
}

pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let view = state.engine.cancel_transaction(id, &user.username).await?;
    Ok(Json(map_transaction(view)))
}
