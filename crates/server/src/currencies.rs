//! Currency registry API endpoints. The registry is shared by every user.

use api_types::currency::{
    CurrencyListQuery, CurrencyListResponse, CurrencyNew, CurrencyUpdate, CurrencyView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewCurrencyCmd, UpdateCurrencyCmd};

use crate::{ServerError, server::ServerState};

fn map_currency(currency: engine::Currency) -> CurrencyView {
    CurrencyView {
        code: currency.code,
        name: currency.name,
        symbol: currency.symbol,
        exchange_rate: currency.exchange_rate,
        is_base: currency.is_base,
        active: currency.active,
        last_updated_rate: currency.last_updated_rate,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<CurrencyListQuery>,
) -> Result<Json<CurrencyListResponse>, ServerError> {
    let currencies = state
        .engine
        .list_currencies(query.active_only.unwrap_or(false))
        .await?
        .into_iter()
        .map(map_currency)
        .collect();
    Ok(Json(CurrencyListResponse { currencies }))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CurrencyNew>,
) -> Result<(StatusCode, Json<CurrencyView>), ServerError> {
    let cmd = NewCurrencyCmd {
        exchange_rate: payload.exchange_rate,
        is_base: payload.is_base,
        ..NewCurrencyCmd::new(payload.code, payload.name, payload.symbol)
    };
    let currency = state.engine.create_currency(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_currency(currency))))
}

pub async fn base(State(state): State<ServerState>) -> Result<Json<CurrencyView>, ServerError> {
    let currency = state.engine.base_currency().await?;
    Ok(Json(map_currency(currency)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<CurrencyView>, ServerError> {
    let currency = state.engine.currency(&code).await?;
    Ok(Json(map_currency(currency)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(code): Path<String>,
    Json(payload): Json<CurrencyUpdate>,
) -> Result<Json<CurrencyView>, ServerError> {
    let cmd = UpdateCurrencyCmd {
        name: payload.name,
        symbol: payload.symbol,
        exchange_rate: payload.exchange_rate,
        active: payload.active,
    };
    let currency = state.engine.update_currency(&code, cmd).await?;
    Ok(Json(map_currency(currency)))
}

pub async fn set_base(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<CurrencyView>, ServerError> {
    let currency = state.engine.set_base_currency(&code).await?;
    Ok(Json(map_currency(currency)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_currency(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
