use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, FixedOffset, Utc};
use engine::{EngineError, FieldPatch, RefFilter};
use uuid::Uuid;

use serde::Serialize;
pub use server::{router, run_with_listener};

mod accounts;
mod attachments;
mod balances;
mod budgets;
mod cards;
mod categories;
mod currencies;
mod reports;
mod server;
mod transactions;
mod transfers;
mod user;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::OperationNotAllowed(_)
        | EngineError::CurrencyMismatch(_)
        | EngineError::InvalidAmount(_)
        | EngineError::Validation(_)
        | EngineError::InvalidCursor(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

fn utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

/// The nil UUID selects rows where the reference is absent.
fn ref_filter(value: Option<Uuid>) -> RefFilter {
    match value {
        None => RefFilter::Any,
        Some(id) if id.is_nil() => RefFilter::IsNull,
        Some(id) => RefFilter::Is(id),
    }
}

/// The nil UUID clears the reference.
fn uuid_patch(value: Option<Uuid>) -> FieldPatch<Uuid> {
    match value {
        None => FieldPatch::Keep,
        Some(id) if id.is_nil() => FieldPatch::Clear,
        Some(id) => FieldPatch::Set(id),
    }
}

fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = EngineError>,
{
    value.map(T::try_from).transpose().map_err(ServerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn business_rule_violations_map_to_422() {
        for err in [
            EngineError::OperationNotAllowed("x".to_string()),
            EngineError::CurrencyMismatch("x".to_string()),
            EngineError::InvalidAmount("x".to_string()),
            EngineError::Validation("x".to_string()),
            EngineError::InvalidCursor("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn database_error_maps_to_500() {
        let err = || EngineError::Database(sea_orm::DbErr::Custom("disk full".to_string()));
        assert_eq!(message_for_engine_error(err()), "internal server error");
        let res = ServerError::from(err()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn nil_uuid_is_the_absent_sentinel() {
        let id = Uuid::new_v4();
        assert_eq!(ref_filter(None), RefFilter::Any);
        assert_eq!(ref_filter(Some(Uuid::nil())), RefFilter::IsNull);
        assert_eq!(ref_filter(Some(id)), RefFilter::Is(id));
        assert_eq!(uuid_patch(Some(Uuid::nil())), FieldPatch::Clear);
        assert_eq!(uuid_patch(Some(id)), FieldPatch::Set(id));
    }
}
