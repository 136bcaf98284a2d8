//! Attachment metadata.
//!
//! Blobs live in external storage; a row only keeps the opaque path. An
//! attachment points at its transaction, the transaction never lists its
//! attachments.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub description: Option<String>,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transaction,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Attachment> for ActiveModel {
    fn from(value: &Attachment) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            transaction_id: ActiveValue::Set(value.transaction_id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            file_name: ActiveValue::Set(value.file_name.clone()),
            file_path: ActiveValue::Set(value.file_path.clone()),
            file_type: ActiveValue::Set(value.file_type.clone()),
            file_size: ActiveValue::Set(value.file_size),
            description: ActiveValue::Set(value.description.clone()),
            uploaded_at: ActiveValue::Set(value.uploaded_at),
        }
    }
}

impl TryFrom<Model> for Attachment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            transaction_id: model.transaction_id,
            user_id: model.user_id,
            file_name: model.file_name,
            file_path: model.file_path,
            file_type: model.file_type,
            file_size: model.file_size,
            description: model.description,
            uploaded_at: model.uploaded_at,
        })
    }
}
