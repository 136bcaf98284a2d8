//! Categories API endpoints.

use api_types::category::{
    CategoryListQuery, CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CategoryType, NewCategoryCmd, UpdateCategoryCmd};
use uuid::Uuid;

use crate::{ServerError, parse_optional, server::ServerState, user};

fn map_category(category: engine::Category) -> CategoryView {
    let global = category.is_global();
    CategoryView {
        id: category.id,
        name: category.name,
        kind: category.kind.as_str().to_string(),
        icon: category.icon,
        color: category.color,
        archived: category.archived,
        global,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let kind = parse_optional::<CategoryType>(query.kind.as_deref())?;
    let categories = state
        .engine
        .list_categories(&user.username, kind, query.include_archived.unwrap_or(false))
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let kind = CategoryType::try_from(payload.kind.as_str())?;
    let mut cmd = NewCategoryCmd::new(&user.username, payload.name, kind);
    if let Some(icon) = payload.icon {
        cmd = cmd.icon(icon);
    }
    if let Some(color) = payload.color {
        cmd = cmd.color(color);
    }

    let category = state.engine.create_category(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(id, &user.username).await?;
    Ok(Json(map_category(category)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_none() && payload.icon.is_none() && payload.color.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name, icon or color".to_string(),
        ));
    }

    let cmd = UpdateCategoryCmd {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
    };
    let category = state
        .engine
        .update_category(id, &user.username, cmd)
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn toggle_archived(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .toggle_category_archived(id, &user.username)
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
