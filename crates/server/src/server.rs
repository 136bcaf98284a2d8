use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{
    accounts, attachments, balances, budgets, cards, categories, currencies, reports,
    transactions, transfers, user,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        tracing::debug!(username = auth_header.username(), "rejected credentials");
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Every route of the API, behind Basic authentication.
pub fn router(engine: Engine, db: DatabaseConnection) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    Router::new()
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/api/transactions/summary/categories",
            get(reports::category_summaries),
        )
        .route(
            "/api/transactions/summary/over-time",
            get(reports::summary_over_time),
        )
        .route("/api/transactions/summary/cash-flow", get(reports::cash_flow))
        .route(
            "/api/transactions/summary/financial-statistics",
            get(reports::financial_statistics),
        )
        .route(
            "/api/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/api/transactions/{id}/approve", patch(transactions::approve))
        .route("/api/transactions/{id}/reject", patch(transactions::reject))
        .route("/api/transactions/{id}/cancel", patch(transactions::cancel))
        .route(
            "/api/transactions/{id}/attachments",
            get(attachments::list).post(attachments::create),
        )
        .route(
            "/api/attachments/{id}",
            get(attachments::get)
                .put(attachments::update)
                .delete(attachments::delete),
        )
        .route("/api/transfers", get(transfers::list).post(transfers::create))
        .route(
            "/api/transfers/{id}",
            get(transfers::get)
                .put(transfers::update)
                .delete(transfers::delete),
        )
        .route("/api/budgets", get(budgets::list).post(budgets::create))
        .route(
            "/api/budgets/{id}",
            get(budgets::get).put(budgets::update).delete(budgets::delete),
        )
        .route(
            "/api/budgets/{id}/categories/{category_id}",
            post(budgets::add_category).delete(budgets::remove_category),
        )
        .route("/api/budgets/{id}/toggle-status", patch(budgets::toggle_status))
        .route("/api/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/api/accounts/{id}",
            get(accounts::get)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        .route("/api/accounts/{id}/archive", patch(accounts::archive))
        .route("/api/accounts/{id}/unarchive", patch(accounts::unarchive))
        .route("/api/accounts/{id}/balance-audit", get(balances::account_audit))
        .route(
            "/api/account-types",
            get(accounts::list_types).post(accounts::create_type),
        )
        .route(
            "/api/account-types/{id}",
            put(accounts::update_type).delete(accounts::delete_type),
        )
        .route("/api/cards", get(cards::list).post(cards::create))
        .route(
            "/api/cards/{id}",
            get(cards::get).put(cards::update).delete(cards::delete),
        )
        .route("/api/cards/{id}/archive", patch(cards::archive))
        .route("/api/cards/{id}/unarchive", patch(cards::unarchive))
        .route("/api/cards/{id}/balance-audit", get(balances::card_audit))
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/api/categories/{id}/toggle-archive",
            patch(categories::toggle_archived),
        )
        .route(
            "/api/currencies",
            get(currencies::list).post(currencies::create),
        )
        .route("/api/currencies/base", get(currencies::base))
        .route(
            "/api/currencies/{code}",
            get(currencies::get)
                .put(currencies::update)
                .delete(currencies::delete),
        )
        .route("/api/currencies/{code}/base", patch(currencies::set_base))
        .route("/api/reconcile", post(balances::reconcile))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine, db)).await
}
