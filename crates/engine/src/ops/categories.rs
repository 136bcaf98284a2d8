use chrono::Utc;
use sea_orm::{
    Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, CategoryType, EngineError, NewCategoryCmd, ResultEngine, UpdateCategoryCmd,
    budget_categories, categories, transactions, util::normalize_name_key,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Fails when the user already sees a category of the same kind whose
    /// normalized name matches.
    async fn ensure_category_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        kind: CategoryType,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(
                Condition::any()
                    .add(categories::Column::UserId.eq(user_id))
                    .add(categories::Column::UserId.is_null()),
            )
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::NameNorm.eq(normalize_name_key(name)));
        if let Some(id) = exclude {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    pub async fn create_category(&self, cmd: NewCategoryCmd) -> ResultEngine<Category> {
        let name = normalize_required_name(&cmd.name, "category")?;
        if normalize_name_key(&name).is_empty() {
            return Err(EngineError::Validation(format!(
                "category name has no letters or digits: {name}"
            )));
        }
        let user_id = cmd.user_id.as_str();

        with_tx!(self, |db_tx| {
            self.ensure_category_name_free(&db_tx, user_id, &name, cmd.kind, None)
                .await?;

            let now = Utc::now();
            let category = Category {
                id: Uuid::new_v4(),
                user_id: Some(user_id.to_string()),
                name,
                kind: cmd.kind,
                icon: normalize_optional_text(cmd.icon.as_deref()),
                color: normalize_optional_text(cmd.color.as_deref()),
                archived: false,
                created_at: now,
                updated_at: now,
            };
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            tracing::info!(category_id = %category.id, user_id, kind = category.kind.as_str(), "category created");
            Ok(category)
        })
    }

    /// Returns a category visible to the user (own or global).
    pub async fn category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_visible_category(&db_tx, category_id, user_id)
                .await?;
            Category::try_from(model)
        })
    }

    /// Global and own categories, by kind then name.
    pub async fn list_categories(
        &self,
        user_id: &str,
        kind: Option<CategoryType>,
        include_archived: bool,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find().filter(
            Condition::any()
                .add(categories::Column::UserId.eq(user_id))
                .add(categories::Column::UserId.is_null()),
        );
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        if !include_archived {
            query = query.filter(categories::Column::Archived.eq(false));
        }
        let models = query
            .order_by_asc(categories::Column::Kind)
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Updates one of the user's categories. Global ones are not reachable.
    pub async fn update_category(
        &self,
        category_id: Uuid,
        user_id: &str,
        cmd: UpdateCategoryCmd,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_own_category(&db_tx, category_id, user_id)
                .await?;
            let mut category = Category::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "category")?;
                self.ensure_category_name_free(
                    &db_tx,
                    user_id,
                    &name,
                    category.kind,
                    Some(category_id),
                )
                .await?;
                category.name = name;
            }
            category.icon = apply_optional_text_patch(category.icon, cmd.icon.as_deref());
            category.color = apply_optional_text_patch(category.color, cmd.color.as_deref());
            category.updated_at = Utc::now();

            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Flips the archived flag of one of the user's categories.
    pub async fn toggle_category_archived(
        &self,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_own_category(&db_tx, category_id, user_id)
                .await?;
            let mut category = Category::try_from(model)?;
            category.archived = !category.archived;
            category.updated_at = Utc::now();
            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Deletes one of the user's categories if no transaction or budget
    /// refers to it.
    pub async fn delete_category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_own_category(&db_tx, category_id, user_id)
                .await?;

            let tx_count = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if tx_count > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "category '{}' is used by {tx_count} transaction(s)",
                    model.name
                )));
            }

            let budget_count = budget_categories::Entity::find()
                .filter(budget_categories::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if budget_count > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "category '{}' is used by {budget_count} budget(s)",
                    model.name
                )));
            }

            categories::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            tracing::info!(%category_id, user_id, "category deleted");
            Ok(())
        })
    }
}
