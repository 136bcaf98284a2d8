//! Accounts and account types API endpoints.

use api_types::{
    ArchivedQuery,
    account::{
        AccountListResponse, AccountNew, AccountTypeListResponse, AccountTypeNew,
        AccountTypeUpdate, AccountTypeView, AccountUpdate, AccountView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewAccountCmd, UpdateAccountCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        account_type_id: account.account_type_id,
        currency_code: account.currency,
        initial_balance_minor: account.initial_balance_minor,
        balance_minor: account.balance_minor,
        bank_name: account.bank_name,
        include_in_net_worth: account.include_in_net_worth,
        archived: account.archived,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

fn map_account_type(account_type: engine::AccountType) -> AccountTypeView {
    AccountTypeView {
        id: account_type.id,
        name: account_type.name,
        icon: account_type.icon,
        predefined: account_type.predefined,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ArchivedQuery>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(&user.username, query.include_archived.unwrap_or(false))
        .await?
        .into_iter()
        .map(map_account)
        .collect();
    Ok(Json(AccountListResponse { accounts }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let mut cmd = NewAccountCmd::new(
        &user.username,
        payload.name,
        payload.account_type_id,
        payload.currency_code,
    )
    .initial_balance(payload.initial_balance_minor);
    if let Some(bank_name) = payload.bank_name {
        cmd = cmd.bank_name(bank_name);
    }
    if let Some(include) = payload.include_in_net_worth {
        cmd = cmd.include_in_net_worth(include);
    }

    let account = state.engine.create_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_account(account))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(id, &user.username).await?;
    Ok(Json(map_account(account)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let cmd = UpdateAccountCmd {
        name: payload.name,
        account_type_id: payload.account_type_id,
        bank_name: payload.bank_name,
        include_in_net_worth: payload.include_in_net_worth,
    };
    let account = state.engine.update_account(id, &user.username, cmd).await?;
    Ok(Json(map_account(account)))
}

pub async fn archive(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.archive_account(id, &user.username).await?;
    Ok(Json(map_account(account)))
}

pub async fn unarchive(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.unarchive_account(id, &user.username).await?;
    Ok(Json(map_account(account)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_types(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<AccountTypeListResponse>, ServerError> {
    let account_types = state
        .engine
        .list_account_types(&user.username)
        .await?
        .into_iter()
        .map(map_account_type)
        .collect();
    Ok(Json(AccountTypeListResponse { account_types }))
}

pub async fn create_type(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountTypeNew>,
) -> Result<(StatusCode, Json<AccountTypeView>), ServerError> {
    let account_type = state
        .engine
        .create_account_type(&user.username, &payload.name, payload.icon.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(map_account_type(account_type))))
}

pub async fn update_type(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountTypeUpdate>,
) -> Result<Json<AccountTypeView>, ServerError> {
    if payload.name.is_none() && payload.icon.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name or icon".to_string(),
        ));
    }

    let account_type = state
        .engine
        .update_account_type(
            id,
            &user.username,
            payload.name.as_deref(),
            payload.icon.as_deref(),
        )
        .await?;
    Ok(Json(map_account_type(account_type)))
}

pub async fn delete_type(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account_type(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
