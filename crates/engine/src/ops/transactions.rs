//! Transaction lifecycle.
//!
//! Every write that changes a transaction's balance effect runs in one DB
//! transaction with the balance adjustments it implies:
//!
//! - create applies the signed delta to the target;
//! - update reverses the old delta, then applies the new one;
//! - delete reverses the delta.
//!
//! Status changes (approve, reject, cancel) never touch balances: the effect
//! is applied at creation whatever the initial status is.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, LedgerTarget, NewTransactionCmd, ResultEngine, Transaction, TransactionStatus,
    TransactionView, UpdateTransactionCmd, transactions,
    util::ensure_positive_amount,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, with_tx};

mod list;

pub use list::{RefFilter, SortOrder, TransactionListFilter};

impl Engine {
    /// Checks that `target` belongs to the user, is not archived and is
    /// denominated in `currency`.
    pub(super) async fn require_ledger_target(
        &self,
        db_tx: &DatabaseTransaction,
        target: LedgerTarget,
        user_id: &str,
        currency: &str,
    ) -> ResultEngine<()> {
        let (label, name, target_currency, archived) = match target {
            LedgerTarget::Account(id) => {
                let model = self.require_account(db_tx, id, user_id).await?;
                ("account", model.name, model.currency_code, model.archived)
            }
            LedgerTarget::Card(id) => {
                let model = self.require_card(db_tx, id, user_id).await?;
                ("card", model.name, model.currency_code, model.archived)
            }
        };
        if archived {
            return Err(EngineError::OperationNotAllowed(format!(
                "{label} '{name}' is archived"
            )));
        }
        if target_currency != currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "{label} '{name}' is in {target_currency}, got {currency}"
            )));
        }
        Ok(())
    }

    async fn transaction_view(
        &self,
        db_tx: &DatabaseTransaction,
        transaction: Transaction,
    ) -> ResultEngine<TransactionView> {
        let counts = self.attachment_counts(db_tx, &[transaction.id]).await?;
        Ok(TransactionView {
            attachment_count: counts.get(&transaction.id).copied().unwrap_or(0),
            transaction,
        })
    }

    /// Records a transaction and moves its target's balance.
    ///
    /// The status defaults to `APPROVED`. A `PENDING_APPROVAL` transaction
    /// moves the balance too.
    pub async fn create_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<TransactionView> {
        ensure_positive_amount(cmd.amount_minor)?;
        let currency = crate::currencies::ensure_currency_code(&cmd.currency)?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let notes = normalize_optional_text(cmd.notes.as_deref());
        let user_id = cmd.user_id.as_str();

        with_tx!(self, |db_tx| {
            self.require_currency(&db_tx, &currency).await?;
            self.require_ledger_target(&db_tx, cmd.target, user_id, &currency)
                .await?;
            if let Some(category_id) = cmd.category_id {
                self.require_assignable_category(&db_tx, category_id, user_id)
                    .await?;
            }

            let now = Utc::now();
            let transaction = Transaction {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                description,
                amount_minor: cmd.amount_minor,
                currency,
                transaction_date: cmd.transaction_date,
                status: cmd.status.unwrap_or(TransactionStatus::Approved),
                entry_type: cmd.entry_type,
                category_id: cmd.category_id,
                target: cmd.target,
                notes,
                created_at: now,
                updated_at: now,
            };

            self.apply_balance_delta(&db_tx, transaction.target, transaction.balance_delta())
                .await?;
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;

            tracing::info!(
                transaction_id = %transaction.id,
                user_id,
                entry_type = transaction.entry_type.as_str(),
                status = transaction.status.as_str(),
                "transaction created"
            );
            Ok(TransactionView {
                transaction,
                attachment_count: 0,
            })
        })
    }

    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let transaction = Transaction::try_from(model)?;
            self.transaction_view(&db_tx, transaction).await
        })
    }

    /// Updates a transaction.
    ///
    /// The old effect is reversed on the original target and the new one is
    /// applied to the same target. Entry type, target and currency never
    /// change.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<TransactionView> {
        if let Some(amount_minor) = cmd.amount_minor {
            ensure_positive_amount(amount_minor)?;
        }
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let mut transaction = Transaction::try_from(model)?;

            self.apply_balance_delta(&db_tx, transaction.target, -transaction.balance_delta())
                .await?;

            if let Some(amount_minor) = cmd.amount_minor {
                transaction.amount_minor = amount_minor;
            }
            if let Some(date) = cmd.transaction_date {
                transaction.transaction_date = date;
            }
            if let crate::FieldPatch::Set(category_id) = cmd.category_id
                && transaction.category_id != Some(category_id)
            {
                self.require_assignable_category(&db_tx, category_id, user_id)
                    .await?;
            }
            transaction.category_id = cmd.category_id.apply(transaction.category_id);
            transaction.description =
                apply_optional_text_patch(transaction.description, cmd.description.as_deref());
            transaction.notes = apply_optional_text_patch(transaction.notes, cmd.notes.as_deref());
            transaction.updated_at = Utc::now();

            transactions::ActiveModel::from(&transaction)
                .update(&db_tx)
                .await?;
            self.apply_balance_delta(&db_tx, transaction.target, transaction.balance_delta())
                .await?;

            tracing::info!(%transaction_id, user_id, "transaction updated");
            self.transaction_view(&db_tx, transaction).await
        })
    }

    /// Deletes a transaction after reversing its balance effect.
    pub async fn delete_transaction(&self, transaction_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let transaction = Transaction::try_from(model)?;

            self.apply_balance_delta(&db_tx, transaction.target, -transaction.balance_delta())
                .await?;
            transactions::Entity::delete_by_id(transaction.id)
                .exec(&db_tx)
                .await?;

            tracing::info!(%transaction_id, user_id, "transaction deleted");
            Ok(())
        })
    }

    /// `PENDING_APPROVAL` → `APPROVED`.
    pub async fn approve_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        self.transition_transaction(transaction_id, user_id, TransactionStatus::Approved)
            .await
    }

    /// `PENDING_APPROVAL` → `REJECTED`. The balance keeps the creation effect.
    pub async fn reject_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        self.transition_transaction(transaction_id, user_id, TransactionStatus::Rejected)
            .await
    }

    /// `APPROVED` → `CANCELLED`. The balance keeps the creation effect.
    pub async fn cancel_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        self.transition_transaction(transaction_id, user_id, TransactionStatus::Cancelled)
            .await
    }

    async fn transition_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        next: TransactionStatus,
    ) -> ResultEngine<TransactionView> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let mut transaction = Transaction::try_from(model)?;
            transaction.status = transaction.status.transition(next)?;
            transaction.updated_at = Utc::now();

            transactions::ActiveModel {
                id: ActiveValue::Set(transaction.id),
                status: ActiveValue::Set(transaction.status.as_str().to_string()),
                updated_at: ActiveValue::Set(transaction.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            tracing::info!(%transaction_id, user_id, status = next.as_str(), "transaction status changed");
            self.transaction_view(&db_tx, transaction).await
        })
    }
}
