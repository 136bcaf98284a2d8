//! Transaction primitives.
//!
//! A `Transaction` moves the balance of exactly one account or card. The
//! amount is always a positive magnitude; the direction comes from the
//! `EntryType` and the kind of target (see [`transaction_delta`]).
//!
//! [`transaction_delta`]: crate::ledger::transaction_delta

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    ledger::{EntryType, LedgerTarget},
    util::fold_text,
};

/// Approval state of a transaction.
///
/// ```text
/// PENDING_APPROVAL ──► APPROVED ──► CANCELLED
///        │
///        └──────────► REJECTED
/// ```
///
/// Status changes never touch balances: the delta is applied once, when the
/// transaction is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns the status reached by moving to `next`, or an error when the
    /// transition is not part of the state machine.
    pub fn transition(self, next: TransactionStatus) -> ResultEngine<TransactionStatus> {
        let allowed = matches!(
            (self, next),
            (Self::PendingApproval, Self::Approved)
                | (Self::PendingApproval, Self::Rejected)
                | (Self::Approved, Self::Cancelled)
        );
        if !allowed {
            return Err(EngineError::OperationNotAllowed(format!(
                "cannot move transaction from {} to {}",
                self.as_str(),
                next.as_str()
            )));
        }
        Ok(next)
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING_APPROVAL" => Ok(Self::PendingApproval),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub transaction_date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub entry_type: EntryType,
    pub category_id: Option<Uuid>,
    pub target: LedgerTarget,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this transaction on its target's balance.
    pub fn balance_delta(&self) -> i64 {
        crate::ledger::transaction_delta(self.target, self.entry_type, self.amount_minor)
    }
}

/// A transaction together with the number of attachments it carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub transaction: Transaction,
    pub attachment_count: u64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub description: Option<String>,
    /// Case and accent folded `description`, searched by the list filter.
    pub description_norm: Option<String>,
    pub amount_minor: i64,
    pub currency_code: String,
    pub transaction_date: DateTimeUtc,
    pub status: String,
    pub entry_type: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        let (account_id, card_id) = tx.target.into_pair();
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            description_norm: ActiveValue::Set(tx.description.as_deref().map(fold_text)),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency_code: ActiveValue::Set(tx.currency.clone()),
            transaction_date: ActiveValue::Set(tx.transaction_date),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            entry_type: ActiveValue::Set(tx.entry_type.as_str().to_string()),
            category_id: ActiveValue::Set(tx.category_id),
            account_id: ActiveValue::Set(account_id),
            card_id: ActiveValue::Set(card_id),
            notes: ActiveValue::Set(tx.notes.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            description: model.description,
            amount_minor: model.amount_minor,
            currency: model.currency_code,
            transaction_date: model.transaction_date,
            status: TransactionStatus::try_from(model.status.as_str())?,
            entry_type: EntryType::try_from(model.entry_type.as_str())?,
            category_id: model.category_id,
            target: LedgerTarget::from_pair(model.account_id, model.card_id)?,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_approved_or_rejected() {
        let pending = TransactionStatus::PendingApproval;
        assert_eq!(
            pending.transition(TransactionStatus::Approved).unwrap(),
            TransactionStatus::Approved
        );
        assert_eq!(
            pending.transition(TransactionStatus::Rejected).unwrap(),
            TransactionStatus::Rejected
        );
    }

    #[test]
    fn only_approved_can_be_cancelled() {
        assert!(
            TransactionStatus::Approved
                .transition(TransactionStatus::Cancelled)
                .is_ok()
        );
        assert!(
            TransactionStatus::PendingApproval
                .transition(TransactionStatus::Cancelled)
                .is_err()
        );
        assert!(
            TransactionStatus::Rejected
                .transition(TransactionStatus::Cancelled)
                .is_err()
        );
    }

    #[test]
    fn terminal_states_do_not_move() {
        for status in [TransactionStatus::Rejected, TransactionStatus::Cancelled] {
            assert!(status.transition(TransactionStatus::Approved).is_err());
        }
        assert!(
            TransactionStatus::Approved
                .transition(TransactionStatus::Approved)
                .is_err()
        );
    }
}
