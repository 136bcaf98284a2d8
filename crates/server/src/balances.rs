//! Balance audits and reconciliation.

use api_types::balance::{BalanceAuditView, ReconcileQuery, ReconcileResponse};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::BalanceAudit;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_audit(audit: BalanceAudit) -> BalanceAuditView {
    BalanceAuditView {
        account_id: audit.target.account_id(),
        card_id: audit.target.card_id(),
        stored_minor: audit.stored_minor,
        ledger_minor: audit.ledger_minor,
        settled_minor: audit.settled_minor,
        consistent: audit.is_consistent(),
    }
}

pub async fn account_audit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceAuditView>, ServerError> {
    let audit = state
        .engine
        .account_balance_audit(id, &user.username)
        .await?;
    Ok(Json(map_audit(audit)))
}

pub async fn card_audit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceAuditView>, ServerError> {
    let audit = state.engine.card_balance_audit(id, &user.username).await?;
    Ok(Json(map_audit(audit)))
}

pub async fn reconcile(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ReconcileQuery>,
) -> Result<Json<ReconcileResponse>, ServerError> {
    let repair = query.repair.unwrap_or(false);
    let drifting = state
        .engine
        .reconcile_balances(&user.username, repair)
        .await?;
    if !drifting.is_empty() {
        tracing::warn!(
            user = %user.username,
            count = drifting.len(),
            repair,
            "balances out of step with the ledger"
        );
    }
    Ok(Json(ReconcileResponse {
        repaired: repair && !drifting.is_empty(),
        drifting: drifting.into_iter().map(map_audit).collect(),
    }))
}
