use chrono::Utc;
use sea_orm::{Condition, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AccountType, EngineError, ResultEngine, account_types, accounts, util::normalize_name_key,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Creates a user-owned account type.
    ///
    /// The name must not clash with a predefined type or another of the
    /// user's types.
    pub async fn create_account_type(
        &self,
        user_id: &str,
        name: &str,
        icon: Option<&str>,
    ) -> ResultEngine<AccountType> {
        let name = normalize_required_name(name, "account type")?;
        with_tx!(self, |db_tx| {
            let exists = account_types::Entity::find()
                .filter(
                    Condition::any()
                        .add(account_types::Column::UserId.eq(user_id))
                        .add(account_types::Column::Predefined.eq(true)),
                )
                .filter(account_types::Column::NameNorm.eq(normalize_name_key(&name)))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let now = Utc::now();
            let account_type = AccountType {
                id: Uuid::new_v4(),
                user_id: Some(user_id.to_string()),
                name,
                icon: normalize_optional_text(icon),
                predefined: false,
                created_at: now,
                updated_at: now,
            };
            account_types::ActiveModel::from(&account_type)
                .insert(&db_tx)
                .await?;
            Ok(account_type)
        })
    }

    /// Predefined types first, then the user's own, each by name.
    pub async fn list_account_types(&self, user_id: &str) -> ResultEngine<Vec<AccountType>> {
        let models = account_types::Entity::find()
            .filter(
                Condition::any()
                    .add(account_types::Column::UserId.eq(user_id))
                    .add(account_types::Column::Predefined.eq(true)),
            )
            .order_by_desc(account_types::Column::Predefined)
            .order_by_asc(account_types::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(AccountType::try_from).collect()
    }

    /// Renames or re-icons one of the user's account types.
    pub async fn update_account_type(
        &self,
        id: Uuid,
        user_id: &str,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> ResultEngine<AccountType> {
        with_tx!(self, |db_tx| {
            let model = self.require_own_account_type(&db_tx, id, user_id).await?;
            let mut account_type = AccountType::try_from(model)?;

            if let Some(name) = name {
                let name = normalize_required_name(name, "account type")?;
                let clash = account_types::Entity::find()
                    .filter(
                        Condition::any()
                            .add(account_types::Column::UserId.eq(user_id))
                            .add(account_types::Column::Predefined.eq(true)),
                    )
                    .filter(account_types::Column::NameNorm.eq(normalize_name_key(&name)))
                    .filter(account_types::Column::Id.ne(id))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if clash {
                    return Err(EngineError::ExistingKey(name));
                }
                account_type.name = name;
            }
            account_type.icon = apply_optional_text_patch(account_type.icon, icon);
            account_type.updated_at = Utc::now();

            account_types::ActiveModel::from(&account_type)
                .update(&db_tx)
                .await?;
            Ok(account_type)
        })
    }

    /// Deletes one of the user's account types if no account uses it.
    pub async fn delete_account_type(&self, id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_own_account_type(&db_tx, id, user_id).await?;
            let in_use = accounts::Entity::find()
                .filter(accounts::Column::AccountTypeId.eq(model.id))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "account type '{}' is used by {in_use} account(s)",
                    model.name
                )));
            }
            account_types::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
