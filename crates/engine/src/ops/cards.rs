use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Card, EngineError, EntryType, LedgerTarget, NewCardCmd, ResultEngine, UpdateCardCmd,
    cards::{self, validate_day_of_month},
    transactions, transfers,
    util::normalize_name_key,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, normalize_required_name, with_tx};

fn validate_credit_limit(limit: Option<i64>) -> ResultEngine<()> {
    if matches!(limit, Some(value) if value < 0) {
        return Err(EngineError::InvalidAmount(
            "credit limit must be >= 0".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    async fn ensure_card_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = cards::Entity::find()
            .filter(cards::Column::UserId.eq(user_id))
            .filter(cards::Column::NameNorm.eq(normalize_name_key(name)));
        if let Some(id) = exclude {
            query = query.filter(cards::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Return a card snapshot from DB.
    pub async fn card(&self, card_id: Uuid, user_id: &str) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, card_id, user_id).await?;
            Card::try_from(model)
        })
    }

    pub async fn list_cards(&self, user_id: &str, include_archived: bool) -> ResultEngine<Vec<Card>> {
        let mut query = cards::Entity::find().filter(cards::Column::UserId.eq(user_id));
        if !include_archived {
            query = query.filter(cards::Column::Archived.eq(false));
        }
        let models = query
            .order_by_asc(cards::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Card::try_from).collect()
    }

    /// Add a new card with a zero balance.
    ///
    /// A linked payment account must belong to the same user; its currency is
    /// free.
    pub async fn create_card(&self, cmd: NewCardCmd) -> ResultEngine<Card> {
        let name = normalize_required_name(&cmd.name, "card")?;
        validate_credit_limit(cmd.credit_limit_minor)?;
        validate_day_of_month(cmd.billing_cycle_day, "billing cycle day")?;
        validate_day_of_month(cmd.payment_due_day, "payment due day")?;
        let user_id = cmd.user_id.as_str();

        with_tx!(self, |db_tx| {
            self.ensure_card_name_free(&db_tx, user_id, &name, None)
                .await?;
            let currency = self.require_active_currency(&db_tx, &cmd.currency).await?;
            if let Some(account_id) = cmd.linked_account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }

            let now = Utc::now();
            let card = Card {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                name,
                bank_name: normalize_optional_text(cmd.bank_name.as_deref()),
                currency: currency.code,
                credit_limit_minor: cmd.credit_limit_minor,
                balance_minor: 0,
                billing_cycle_day: cmd.billing_cycle_day,
                payment_due_day: cmd.payment_due_day,
                linked_account_id: cmd.linked_account_id,
                archived: false,
                created_at: now,
                updated_at: now,
            };
            cards::ActiveModel::from(&card).insert(&db_tx).await?;

            tracing::info!(card_id = %card.id, user_id, currency = %card.currency, "card created");
            Ok(card)
        })
    }

    /// Updates the descriptive fields of a card. The balance is untouched.
    pub async fn update_card(
        &self,
        card_id: Uuid,
        user_id: &str,
        cmd: UpdateCardCmd,
    ) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, card_id, user_id).await?;
            let mut card = Card::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "card")?;
                self.ensure_card_name_free(&db_tx, user_id, &name, Some(card_id))
                    .await?;
                card.name = name;
            }
            card.bank_name = apply_optional_text_patch(card.bank_name, cmd.bank_name.as_deref());

            let credit_limit = cmd.credit_limit_minor.apply(card.credit_limit_minor);
            validate_credit_limit(credit_limit)?;
            card.credit_limit_minor = credit_limit;

            let billing_cycle_day = cmd.billing_cycle_day.apply(card.billing_cycle_day);
            validate_day_of_month(billing_cycle_day, "billing cycle day")?;
            card.billing_cycle_day = billing_cycle_day;

            let payment_due_day = cmd.payment_due_day.apply(card.payment_due_day);
            validate_day_of_month(payment_due_day, "payment due day")?;
            card.payment_due_day = payment_due_day;

            let linked_account_id = cmd.linked_account_id.apply(card.linked_account_id);
            if let Some(account_id) = linked_account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }
            card.linked_account_id = linked_account_id;
            card.updated_at = Utc::now();

            // Balance only moves through the ledger.
            let mut active: cards::ActiveModel = (&card).into();
            active.balance_minor = sea_orm::ActiveValue::NotSet;
            active.update(&db_tx).await?;
            Ok(card)
        })
    }

    pub async fn archive_card(&self, card_id: Uuid, user_id: &str) -> ResultEngine<Card> {
        self.set_card_archived(card_id, user_id, true).await
    }

    pub async fn unarchive_card(&self, card_id: Uuid, user_id: &str) -> ResultEngine<Card> {
        self.set_card_archived(card_id, user_id, false).await
    }

    async fn set_card_archived(
        &self,
        card_id: Uuid,
        user_id: &str,
        archived: bool,
    ) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, card_id, user_id).await?;
            let mut card = Card::try_from(model)?;
            card.archived = archived;
            card.updated_at = Utc::now();
            let mut active: cards::ActiveModel = (&card).into();
            active.balance_minor = sea_orm::ActiveValue::NotSet;
            active.update(&db_tx).await?;
            Ok(card)
        })
    }

    /// Deletes an archived card with no purchases and a zero balance.
    pub async fn delete_card(&self, card_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, card_id, user_id).await?;
            if !model.archived {
                return Err(EngineError::OperationNotAllowed(format!(
                    "card '{}' must be archived before deletion",
                    model.name
                )));
            }

            let debits = transactions::Entity::find()
                .filter(transactions::Column::CardId.eq(card_id))
                .filter(transactions::Column::EntryType.eq(EntryType::Debit.as_str()))
                .count(&db_tx)
                .await?;
            if debits > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "card '{}' has {debits} purchase(s)",
                    model.name
                )));
            }

            let audit = self
                .audit_target(&db_tx, LedgerTarget::Card(model.id), 0, model.balance_minor)
                .await?;
            if audit.settled_minor != 0 || audit.stored_minor != 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "card '{}' balance is not zero",
                    model.name
                )));
            }

            let leftovers = transactions::Entity::find()
                .filter(transactions::Column::CardId.eq(card_id))
                .count(&db_tx)
                .await?
                + transfers::Entity::find()
                    .filter(transfers::Column::ToCardId.eq(card_id))
                    .count(&db_tx)
                    .await?;
            if leftovers > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "card '{}' still has ledger rows",
                    model.name
                )));
            }

            cards::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(%card_id, user_id, "card deleted");
            Ok(())
        })
    }
}
