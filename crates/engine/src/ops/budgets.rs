use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetView, EngineError, EntryType, NewBudgetCmd, ResultEngine, TransactionStatus,
    UpdateBudgetCmd, budget_categories, budgets, transactions,
    util::normalize_name_key,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, normalize_required_name, with_tx};

fn validate_limit(amount_limit_minor: i64) -> ResultEngine<()> {
    if amount_limit_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "budget limit must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_dates(start: NaiveDate, end: Option<NaiveDate>) -> ResultEngine<()> {
    if let Some(end) = end
        && end < start
    {
        return Err(EngineError::Validation(format!(
            "budget end date {end} is before start date {start}"
        )));
    }
    Ok(())
}

impl Engine {
    async fn ensure_budget_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::NameNorm.eq(normalize_name_key(name)));
        if let Some(id) = exclude {
            query = query.filter(budgets::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    async fn budget_category_ids(
        &self,
        db_tx: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<Vec<Uuid>> {
        Ok(budget_categories::Entity::find()
            .filter(budget_categories::Column::BudgetId.eq(budget_id))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|row| row.category_id)
            .collect())
    }

    async fn load_budget(&self, db_tx: &DatabaseTransaction, model: budgets::Model) -> ResultEngine<Budget> {
        let mut budget = Budget::try_from(model)?;
        budget.category_ids = self.budget_category_ids(db_tx, budget.id).await?;
        Ok(budget)
    }

    /// Replaces the category set of a budget.
    async fn replace_budget_categories(
        &self,
        db_tx: &DatabaseTransaction,
        budget_id: Uuid,
        user_id: &str,
        category_ids: &[Uuid],
    ) -> ResultEngine<Vec<Uuid>> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(category_ids.len());
        for id in category_ids {
            if !unique.contains(id) {
                self.require_assignable_category(db_tx, *id, user_id).await?;
                unique.push(*id);
            }
        }

        budget_categories::Entity::delete_many()
            .filter(budget_categories::Column::BudgetId.eq(budget_id))
            .exec(db_tx)
            .await?;
        if !unique.is_empty() {
            budget_categories::Entity::insert_many(unique.iter().map(|category_id| {
                budget_categories::ActiveModel {
                    budget_id: ActiveValue::Set(budget_id),
                    category_id: ActiveValue::Set(*category_id),
                }
            }))
            .exec(db_tx)
            .await?;
        }
        Ok(unique)
    }

    /// Sums approved DEBIT transactions of the budget's categories inside
    /// its current window.
    ///
    /// The window end is exclusive at midnight after the last day, so every
    /// time of day on the last day counts.
    pub(super) async fn budget_spending(
        &self,
        db_tx: &DatabaseTransaction,
        budget: &Budget,
        today: NaiveDate,
    ) -> ResultEngine<i64> {
        if budget.category_ids.is_empty() {
            return Ok(0);
        }
        let Some(window) = budget.spending_window(today)? else {
            return Ok(0);
        };

        let total: Option<Option<i64>> = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::AmountMinor.sum(), "spent")
            .filter(transactions::Column::UserId.eq(budget.user_id.as_str()))
            .filter(transactions::Column::EntryType.eq(EntryType::Debit.as_str()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Approved.as_str()))
            .filter(transactions::Column::CategoryId.is_in(budget.category_ids.iter().copied()))
            .filter(transactions::Column::TransactionDate.gte(window.start))
            .filter(transactions::Column::TransactionDate.lt(window.end))
            .into_tuple()
            .one(db_tx)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    async fn budget_view(
        &self,
        db_tx: &DatabaseTransaction,
        budget: Budget,
        today: NaiveDate,
    ) -> ResultEngine<BudgetView> {
        let spent_minor = self.budget_spending(db_tx, &budget, today).await?;
        Ok(BudgetView {
            remaining_minor: budget.amount_limit_minor - spent_minor,
            spent_minor,
            budget,
        })
    }

    pub async fn create_budget(&self, cmd: NewBudgetCmd) -> ResultEngine<BudgetView> {
        let name = normalize_required_name(&cmd.name, "budget")?;
        validate_limit(cmd.amount_limit_minor)?;
        validate_dates(cmd.start_date, cmd.end_date)?;
        let user_id = cmd.user_id.as_str();

        with_tx!(self, |db_tx| {
            self.ensure_budget_name_free(&db_tx, user_id, &name, None)
                .await?;
            let currency = self.require_active_currency(&db_tx, &cmd.currency).await?;

            let now = Utc::now();
            let mut budget = Budget {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                name,
                amount_limit_minor: cmd.amount_limit_minor,
                currency: currency.code,
                period: cmd.period,
                start_date: cmd.start_date,
                end_date: cmd.end_date,
                active: true,
                notes: normalize_optional_text(cmd.notes.as_deref()),
                category_ids: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            budgets::ActiveModel::from(&budget).insert(&db_tx).await?;
            budget.category_ids = self
                .replace_budget_categories(&db_tx, budget.id, user_id, &cmd.category_ids)
                .await?;

            tracing::info!(budget_id = %budget.id, user_id, period = budget.period.as_str(), "budget created");
            self.budget_view(&db_tx, budget, now.date_naive()).await
        })
    }

    /// Returns a budget with its spending for the window that contains today.
    pub async fn budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<BudgetView> {
        self.budget_on(budget_id, user_id, Utc::now().date_naive())
            .await
    }

    /// Like [`Engine::budget`] with an explicit current day.
    pub async fn budget_on(
        &self,
        budget_id: Uuid,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id, user_id).await?;
            let budget = self.load_budget(&db_tx, model).await?;
            self.budget_view(&db_tx, budget, today).await
        })
    }

    /// All budgets of the user, active first, then by name.
    pub async fn list_budgets(&self, user_id: &str) -> ResultEngine<Vec<BudgetView>> {
        let today = Utc::now().date_naive();
        with_tx!(self, |db_tx| {
            let models = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id))
                .order_by_desc(budgets::Column::Active)
                .order_by_asc(budgets::Column::Name)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let budget = self.load_budget(&db_tx, model).await?;
                out.push(self.budget_view(&db_tx, budget, today).await?);
            }
            Ok(out)
        })
    }

    /// Active budgets, most recent start first, then by name.
    pub async fn list_active_budgets(&self, user_id: &str) -> ResultEngine<Vec<BudgetView>> {
        let today = Utc::now().date_naive();
        with_tx!(self, |db_tx| {
            let models = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id))
                .filter(budgets::Column::Active.eq(true))
                .order_by_desc(budgets::Column::StartDate)
                .order_by_asc(budgets::Column::Name)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let budget = self.load_budget(&db_tx, model).await?;
                out.push(self.budget_view(&db_tx, budget, today).await?);
            }
            Ok(out)
        })
    }

    /// Updates a budget. A given category list replaces the whole set.
    pub async fn update_budget(
        &self,
        budget_id: Uuid,
        user_id: &str,
        cmd: UpdateBudgetCmd,
    ) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id, user_id).await?;
            let mut budget = self.load_budget(&db_tx, model).await?;

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "budget")?;
                self.ensure_budget_name_free(&db_tx, user_id, &name, Some(budget_id))
                    .await?;
                budget.name = name;
            }
            if let Some(limit) = cmd.amount_limit_minor {
                validate_limit(limit)?;
                budget.amount_limit_minor = limit;
            }
            if let Some(currency) = cmd.currency.as_deref() {
                budget.currency = self.require_active_currency(&db_tx, currency).await?.code;
            }
            if let Some(period) = cmd.period {
                budget.period = period;
            }
            if let Some(start_date) = cmd.start_date {
                budget.start_date = start_date;
            }
            budget.end_date = cmd.end_date.apply(budget.end_date);
            validate_dates(budget.start_date, budget.end_date)?;
            budget.notes = apply_optional_text_patch(budget.notes, cmd.notes.as_deref());
            budget.updated_at = Utc::now();

            budgets::ActiveModel::from(&budget).update(&db_tx).await?;
            if let Some(category_ids) = cmd.category_ids.as_deref() {
                budget.category_ids = self
                    .replace_budget_categories(&db_tx, budget_id, user_id, category_ids)
                    .await?;
            }

            tracing::info!(%budget_id, user_id, "budget updated");
            self.budget_view(&db_tx, budget, Utc::now().date_naive())
                .await
        })
    }

    pub async fn delete_budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id, user_id).await?;
            budget_categories::Entity::delete_many()
                .filter(budget_categories::Column::BudgetId.eq(model.id))
                .exec(&db_tx)
                .await?;
            budgets::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(%budget_id, user_id, "budget deleted");
            Ok(())
        })
    }

    /// Adds a category to the budget. Adding a member again is a no-op.
    pub async fn add_budget_category(
        &self,
        budget_id: Uuid,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id, user_id).await?;
            self.require_assignable_category(&db_tx, category_id, user_id)
                .await?;
            let mut budget = self.load_budget(&db_tx, model).await?;

            if !budget.category_ids.contains(&category_id) {
                budget_categories::ActiveModel {
                    budget_id: ActiveValue::Set(budget_id),
                    category_id: ActiveValue::Set(category_id),
                }
                .insert(&db_tx)
                .await?;
                budget.category_ids.push(category_id);
            }
            self.budget_view(&db_tx, budget, Utc::now().date_naive())
                .await
        })
    }

    /// Removes a category from the budget. Removing a non-member is a no-op.
    pub async fn remove_budget_category(
        &self,
        budget_id: Uuid,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id, user_id).await?;
            budget_categories::Entity::delete_many()
                .filter(budget_categories::Column::BudgetId.eq(budget_id))
                .filter(budget_categories::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            let budget = self.load_budget(&db_tx, model).await?;
            self.budget_view(&db_tx, budget, Utc::now().date_naive())
                .await
        })
    }

    /// Flips the active flag.
    pub async fn toggle_budget_status(
        &self,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id, user_id).await?;
            let mut budget = self.load_budget(&db_tx, model).await?;
            budget.active = !budget.active;
            budget.updated_at = Utc::now();
            budgets::ActiveModel {
                id: ActiveValue::Set(budget.id),
                active: ActiveValue::Set(budget.active),
                updated_at: ActiveValue::Set(budget.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(%budget_id, user_id, active = budget.active, "budget status toggled");
            self.budget_view(&db_tx, budget, Utc::now().date_naive())
                .await
        })
    }
}
