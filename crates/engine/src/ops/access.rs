//! Ownership-checked lookups.
//!
//! Every lookup filters by the requesting user. A row owned by someone else
//! is reported exactly like a missing row, so callers cannot discover foreign ids.

use sea_orm::{Condition, DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, account_types, accounts, attachments, budgets, cards, categories,
    currencies, transactions, transfers,
};

use super::Engine;

/// Generates a `require_*` method that loads a row by id and user.
macro_rules! impl_require_owned {
    ($require_fn:ident, $entity:path, $model:ty, $user_col:expr, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
            user_id: &str,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .filter($user_col.eq(user_id))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_owned!(
        require_account,
        accounts::Entity,
        accounts::Model,
        accounts::Column::UserId,
        "account not exists"
    );

    impl_require_owned!(
        require_card,
        cards::Entity,
        cards::Model,
        cards::Column::UserId,
        "card not exists"
    );

    impl_require_owned!(
        require_transaction,
        transactions::Entity,
        transactions::Model,
        transactions::Column::UserId,
        "transaction not exists"
    );

    impl_require_owned!(
        require_transfer,
        transfers::Entity,
        transfers::Model,
        transfers::Column::UserId,
        "transfer not exists"
    );

    impl_require_owned!(
        require_budget,
        budgets::Entity,
        budgets::Model,
        budgets::Column::UserId,
        "budget not exists"
    );

    impl_require_owned!(
        require_attachment,
        attachments::Entity,
        attachments::Model,
        attachments::Column::UserId,
        "attachment not exists"
    );

    impl_require_owned!(
        require_own_category,
        categories::Entity,
        categories::Model,
        categories::Column::UserId,
        "category not exists"
    );

    impl_require_owned!(
        require_own_account_type,
        account_types::Entity,
        account_types::Model,
        account_types::Column::UserId,
        "account type not exists"
    );

    /// Loads a category the user may reference: one of their own or a global
    /// one.
    pub(super) async fn require_visible_category(
        &self,
        db: &DatabaseTransaction,
        id: Uuid,
        user_id: &str,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(id)
            .filter(
                Condition::any()
                    .add(categories::Column::UserId.eq(user_id))
                    .add(categories::Column::UserId.is_null()),
            )
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    /// Like [`Engine::require_visible_category`] but also rejects archived
    /// categories, for new assignments.
    pub(super) async fn require_assignable_category(
        &self,
        db: &DatabaseTransaction,
        id: Uuid,
        user_id: &str,
    ) -> ResultEngine<categories::Model> {
        let category = self.require_visible_category(db, id, user_id).await?;
        if category.archived {
            return Err(EngineError::OperationNotAllowed(format!(
                "category '{}' is archived",
                category.name
            )));
        }
        Ok(category)
    }

    pub(super) async fn require_visible_account_type(
        &self,
        db: &DatabaseTransaction,
        id: Uuid,
        user_id: &str,
    ) -> ResultEngine<account_types::Model> {
        account_types::Entity::find_by_id(id)
            .filter(
                Condition::any()
                    .add(account_types::Column::UserId.eq(user_id))
                    .add(account_types::Column::Predefined.eq(true)),
            )
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account type not exists".to_string()))
    }

    pub(super) async fn require_currency(
        &self,
        db: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<currencies::Model> {
        let code = currencies::normalize_currency_code(code)?;
        currencies::Entity::find_by_id(code)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("currency not exists".to_string()))
    }

    /// Loads a currency that new rows may be denominated in.
    pub(super) async fn require_active_currency(
        &self,
        db: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<currencies::Model> {
        let currency = self.require_currency(db, code).await?;
        if !currency.active {
            return Err(EngineError::OperationNotAllowed(format!(
                "currency {} is not active",
                currency.code
            )));
        }
        Ok(currency)
    }
}
