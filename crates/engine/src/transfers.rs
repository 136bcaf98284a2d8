//! Transfers between one source account and one destination account or card.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, ledger::LedgerTarget};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferStatus {
    Pending,
    Completed,
    Cancelled,
    Failed,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }
}

impl TryFrom<&str> for TransferStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "FAILED" => Ok(Self::Failed),
            other => Err(EngineError::Validation(format!(
                "invalid transfer status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub transfer_date: DateTime<Utc>,
    pub from_account_id: Uuid,
    pub destination: LedgerTarget,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejects a destination that is the source account itself.
pub(crate) fn ensure_distinct_endpoints(
    from_account_id: Uuid,
    destination: LedgerTarget,
) -> ResultEngine<()> {
    if destination == LedgerTarget::Account(from_account_id) {
        return Err(EngineError::OperationNotAllowed(
            "source and destination account must differ".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
    pub currency_code: String,
    pub transfer_date: DateTimeUtc,
    pub from_account_id: Uuid,
    pub to_account_id: Option<Uuid>,
    pub to_card_id: Option<Uuid>,
    pub status: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(value: &Transfer) -> Self {
        let (to_account_id, to_card_id) = value.destination.into_pair();
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            currency_code: ActiveValue::Set(value.currency.clone()),
            transfer_date: ActiveValue::Set(value.transfer_date),
            from_account_id: ActiveValue::Set(value.from_account_id),
            to_account_id: ActiveValue::Set(to_account_id),
            to_card_id: ActiveValue::Set(to_card_id),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            description: ActiveValue::Set(value.description.clone()),
            notes: ActiveValue::Set(value.notes.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            amount_minor: model.amount_minor,
            currency: model.currency_code,
            transfer_date: model.transfer_date,
            from_account_id: model.from_account_id,
            destination: LedgerTarget::from_pair(model.to_account_id, model.to_card_id)?,
            status: TransferStatus::try_from(model.status.as_str())?,
            description: model.description,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
