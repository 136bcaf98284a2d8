//! The module contains the `Card` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::normalize_name_key};

/// A credit card.
///
/// The balance tracks debt: purchases (DEBIT) increase it, payments and
/// refunds (CREDIT) decrease it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub currency: String,
    pub credit_limit_minor: Option<i64>,
    pub balance_minor: i64,
    pub billing_cycle_day: Option<u8>,
    pub payment_due_day: Option<u8>,
    /// Account the card is usually paid from.
    pub linked_account_id: Option<Uuid>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validates a day-of-month field (1..=31).
pub(crate) fn validate_day_of_month(day: Option<u8>, label: &str) -> ResultEngine<()> {
    match day {
        Some(day) if !(1..=31).contains(&day) => Err(EngineError::Validation(format!(
            "{label} must be between 1 and 31"
        ))),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    /// Folded form of `name` used for uniqueness checks.
    pub name_norm: String,
    pub bank_name: Option<String>,
    pub currency_code: String,
    pub credit_limit_minor: Option<i64>,
    pub balance_minor: i64,
    pub billing_cycle_day: Option<i32>,
    pub payment_due_day: Option<i32>,
    pub linked_account_id: Option<Uuid>,
    pub archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::LinkedAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    LinkedAccount,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkedAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Card> for ActiveModel {
    fn from(value: &Card) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)),
            bank_name: ActiveValue::Set(value.bank_name.clone()),
            currency_code: ActiveValue::Set(value.currency.clone()),
            credit_limit_minor: ActiveValue::Set(value.credit_limit_minor),
            balance_minor: ActiveValue::Set(value.balance_minor),
            billing_cycle_day: ActiveValue::Set(value.billing_cycle_day.map(i32::from)),
            payment_due_day: ActiveValue::Set(value.payment_due_day.map(i32::from)),
            linked_account_id: ActiveValue::Set(value.linked_account_id),
            archived: ActiveValue::Set(value.archived),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

fn stored_day(value: Option<i32>, label: &str) -> ResultEngine<Option<u8>> {
    value
        .map(|day| {
            u8::try_from(day)
                .map_err(|_| EngineError::Validation(format!("invalid {label} stored: {day}")))
        })
        .transpose()
}

impl TryFrom<Model> for Card {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            bank_name: model.bank_name,
            currency: model.currency_code,
            credit_limit_minor: model.credit_limit_minor,
            balance_minor: model.balance_minor,
            billing_cycle_day: stored_day(model.billing_cycle_day, "billing cycle day")?,
            payment_due_day: stored_day(model.payment_due_day, "payment due day")?,
            linked_account_id: model.linked_account_id,
            archived: model.archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
