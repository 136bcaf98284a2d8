//! The module contains the `Account` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::normalize_name_key};

/// A bank account, a cash drawer or anything else where money is kept.
///
/// `balance_minor` is a running total maintained by the ledger:
/// `initial_balance_minor` plus every transaction and transfer delta that
/// touched the account. It is never recomputed on the write path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub account_type_id: Uuid,
    pub currency: String,
    pub initial_balance_minor: i64,
    pub balance_minor: i64,
    pub bank_name: Option<String>,
    pub include_in_net_worth: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    /// Folded form of `name` used for uniqueness checks.
    pub name_norm: String,
    pub account_type_id: Uuid,
    pub currency_code: String,
    pub initial_balance_minor: i64,
    pub balance_minor: i64,
    pub bank_name: Option<String>,
    pub include_in_net_worth: bool,
    pub archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currencies::Entity",
        from = "Column::CurrencyCode",
        to = "super::currencies::Column::Code",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Currency,
    #[sea_orm(
        belongs_to = "super::account_types::Entity",
        from = "Column::AccountTypeId",
        to = "super::account_types::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AccountType,
}

impl Related<super::currencies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currency.def()
    }
}

impl Related<super::account_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)),
            account_type_id: ActiveValue::Set(value.account_type_id),
            currency_code: ActiveValue::Set(value.currency.clone()),
            initial_balance_minor: ActiveValue::Set(value.initial_balance_minor),
            balance_minor: ActiveValue::Set(value.balance_minor),
            bank_name: ActiveValue::Set(value.bank_name.clone()),
            include_in_net_worth: ActiveValue::Set(value.include_in_net_worth),
            archived: ActiveValue::Set(value.archived),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            account_type_id: model.account_type_id,
            currency: model.currency_code,
            initial_balance_minor: model.initial_balance_minor,
            balance_minor: model.balance_minor,
            bank_name: model.bank_name,
            include_in_net_worth: model.include_in_net_worth,
            archived: model.archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
