//! Budgets API endpoints

use api_types::budget::{BudgetListQuery, BudgetListResponse, BudgetNew, BudgetUpdate, BudgetView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{BudgetPeriod, FieldPatch, NewBudgetCmd, UpdateBudgetCmd};
use uuid::Uuid;

use crate::{ServerError, parse_optional, server::ServerState, user};

fn map_budget(view: engine::BudgetView) -> BudgetView {
    let budget = view.budget;
    BudgetView {
        id: budget.id,
        name: budget.name,
        amount_limit_minor: budget.amount_limit_minor,
        currency_code: budget.currency,
        period: budget.period.as_str().to_string(),
        start_date: budget.start_date,
        end_date: budget.end_date,
        active: budget.active,
        notes: budget.notes,
        category_ids: budget.category_ids,
        spent_minor: view.spent_minor,
        remaining_minor: view.remaining_minor,
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetListQuery>,
) -> Result<Json<BudgetListResponse>, ServerError> {
    let budgets = if query.active_only.unwrap_or(false) {
        state.engine.list_active_budgets(&user.username).await?
    } else {
        state.engine.list_budgets(&user.username).await?
    };
    Ok(Json(BudgetListResponse {
        budgets: budgets.into_iter().map(map_budget).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let period = BudgetPeriod::try_from(payload.period.as_str())?;
    let mut cmd = NewBudgetCmd::new(
        &user.username,
        payload.name,
        payload.amount_limit_minor,
        payload.currency_code,
        period,
        payload.start_date,
    )
    .categories(payload.category_ids);
    if let Some(end_date) = payload.end_date {
        cmd = cmd.end_date(end_date);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let view = state.engine.create_budget(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_budget(view))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let view = state.engine.budget(id, &user.username).await?;
    Ok(Json(map_budget(view)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let end_date = match (payload.clear_end_date, payload.end_date) {
        (true, _) => FieldPatch::Clear,
        (false, Some(date)) => FieldPatch::Set(date),
        (false, None) => FieldPatch::Keep,
    };
    let cmd = UpdateBudgetCmd {
        name: payload.name,
        amount_limit_minor: payload.amount_limit_minor,
        currency: payload.currency_code,
        period: parse_optional::<BudgetPeriod>(payload.period.as_deref())?,
        start_date: payload.start_date,
        end_date,
        notes: payload.notes,
        category_ids: payload.category_ids,
    };

    let view = state.engine.update_budget(id, &user.username, cmd).await?;
    Ok(Json(map_budget(view)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_category(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BudgetView>, ServerError> {
    let view = state
        .engine
        .add_budget_category(id, category_id, &user.username)
        .await?;
    Ok(Json(map_budget(view)))
}

pub async fn remove_category(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BudgetView>, ServerError> {
    let view = state
        .engine
        .remove_budget_category(id, category_id, &user.username)
        .await?;
    Ok(Json(map_budget(view)))
}

pub async fn toggle_status(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let view = state.engine.toggle_budget_status(id, &user.username).await?;
    Ok(Json(map_budget(view)))
}
