use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Attachment, EngineError, NewAttachmentCmd, ResultEngine, attachments};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Records attachment metadata for one of the user's transactions.
    pub async fn add_attachment(&self, cmd: NewAttachmentCmd) -> ResultEngine<Attachment> {
        let file_name = normalize_required_name(&cmd.file_name, "file")?;
        let file_path = cmd.file_path.trim().to_string();
        if file_path.is_empty() {
            return Err(EngineError::Validation(
                "file path must not be empty".to_string(),
            ));
        }
        if matches!(cmd.file_size, Some(size) if size < 0) {
            return Err(EngineError::Validation(
                "file size must be >= 0".to_string(),
            ));
        }
        let user_id = cmd.user_id.as_str();

        with_tx!(self, |db_tx| {
            self.require_transaction(&db_tx, cmd.transaction_id, user_id)
                .await?;

            let attachment = Attachment {
                id: Uuid::new_v4(),
                transaction_id: cmd.transaction_id,
                user_id: user_id.to_string(),
                file_name,
                file_path,
                file_type: normalize_optional_text(cmd.file_type.as_deref()),
                file_size: cmd.file_size,
                description: normalize_optional_text(cmd.description.as_deref()),
                uploaded_at: Utc::now(),
            };
            attachments::ActiveModel::from(&attachment)
                .insert(&db_tx)
                .await?;
            tracing::info!(attachment_id = %attachment.id, transaction_id = %attachment.transaction_id, "attachment added");
            Ok(attachment)
        })
    }

    /// Attachments of a transaction, oldest first.
    pub async fn list_attachments(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<Attachment>> {
        with_tx!(self, |db_tx| {
            self.require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let models = attachments::Entity::find()
                .filter(attachments::Column::TransactionId.eq(transaction_id))
                .order_by_asc(attachments::Column::UploadedAt)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Attachment::try_from).collect()
        })
    }

    pub async fn attachment(&self, attachment_id: Uuid, user_id: &str) -> ResultEngine<Attachment> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_attachment(&db_tx, attachment_id, user_id)
                .await?;
            Attachment::try_from(model)
        })
    }

    /// Sets or clears (with a blank string) the description.
    pub async fn update_attachment_description(
        &self,
        attachment_id: Uuid,
        user_id: &str,
        description: &str,
    ) -> ResultEngine<Attachment> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_attachment(&db_tx, attachment_id, user_id)
                .await?;
            let mut attachment = Attachment::try_from(model)?;
            attachment.description = normalize_optional_text(Some(description));
            attachments::ActiveModel {
                id: ActiveValue::Set(attachment.id),
                description: ActiveValue::Set(attachment.description.clone()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(attachment)
        })
    }

    /// Removes the metadata row. The blob itself is the caller's concern.
    pub async fn delete_attachment(&self, attachment_id: Uuid, user_id: &str) -> ResultEngine<Attachment> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_attachment(&db_tx, attachment_id, user_id)
                .await?;
            let attachment = Attachment::try_from(model)?;
            attachments::Entity::delete_by_id(attachment.id)
                .exec(&db_tx)
                .await?;
            tracing::info!(%attachment_id, user_id, "attachment deleted");
            Ok(attachment)
        })
    }
}
