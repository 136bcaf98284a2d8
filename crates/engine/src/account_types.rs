//! Account types (checking, savings, cash, ...).
//!
//! Predefined types have no owner and are shared by every user.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::normalize_name_key};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountType {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub name: String,
    pub icon: Option<String>,
    pub predefined: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<String>,
    pub name: String,
    /// Folded form of `name` used for uniqueness checks.
    pub name_norm: String,
    pub icon: Option<String>,
    pub predefined: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AccountType> for ActiveModel {
    fn from(value: &AccountType) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)),
            icon: ActiveValue::Set(value.icon.clone()),
            predefined: ActiveValue::Set(value.predefined),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for AccountType {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            icon: model.icon,
            predefined: model.predefined,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
