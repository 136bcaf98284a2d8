//! Balance mutation and reconciliation.
//!
//! The write path never recomputes balances: it adds signed deltas with a
//! single `UPDATE ... SET balance_minor = balance_minor + ?` statement, so two
//! concurrent writers cannot lose each other's update. The read path can
//! replay the ledger to check the stored totals.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    EngineError, LedgerTarget, Money, ResultEngine, TransactionStatus, TransferStatus, accounts,
    cards,
    ledger::{EntryType, transaction_delta},
    transactions, transfers,
};

use super::{Engine, with_tx};

/// Stored balance of an account or card next to two replays of its ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceAudit {
    pub target: LedgerTarget,
    pub stored_minor: i64,
    /// Replay of every transaction and transfer row, whatever its status.
    ///
    /// Balance effects are applied when a row is created and status changes
    /// never undo them, so this is the figure the stored balance must match.
    pub ledger_minor: i64,
    /// Replay restricted to approved transactions and completed transfers.
    pub settled_minor: i64,
}

impl BalanceAudit {
    pub fn is_consistent(&self) -> bool {
        self.stored_minor == self.ledger_minor
    }

    pub fn drift_minor(&self) -> i64 {
        self.stored_minor.saturating_sub(self.ledger_minor)
    }
}

impl Engine {
    /// Adds `delta_minor` to the stored balance of `target`.
    ///
    /// No ownership check: callers validate the target first. Must run inside
    /// the transaction that writes the ledger row so both commit or roll back
    /// together.
    pub(super) async fn apply_balance_delta(
        &self,
        db: &DatabaseTransaction,
        target: LedgerTarget,
        delta_minor: i64,
    ) -> ResultEngine<()> {
        let now = Utc::now();
        let result = match target {
            LedgerTarget::Account(id) => {
                accounts::Entity::update_many()
                    .col_expr(
                        accounts::Column::BalanceMinor,
                        Expr::col(accounts::Column::BalanceMinor).add(delta_minor),
                    )
                    .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                    .filter(accounts::Column::Id.eq(id))
                    .exec(db)
                    .await?
            }
            LedgerTarget::Card(id) => {
                cards::Entity::update_many()
                    .col_expr(
                        cards::Column::BalanceMinor,
                        Expr::col(cards::Column::BalanceMinor).add(delta_minor),
                    )
                    .col_expr(cards::Column::UpdatedAt, Expr::value(now))
                    .filter(cards::Column::Id.eq(id))
                    .exec(db)
                    .await?
            }
        };

        if result.rows_affected != 1 {
            return Err(EngineError::KeyNotFound(match target {
                LedgerTarget::Account(_) => "account not exists".to_string(),
                LedgerTarget::Card(_) => "card not exists".to_string(),
            }));
        }

        tracing::debug!(?target, delta = %Money::new(delta_minor), "balance adjusted");
        Ok(())
    }

    /// Replays the ledger of one target. `base_minor` is the opening balance
    /// (the initial balance for accounts, zero for cards).
    pub(super) async fn audit_target(
        &self,
        db: &DatabaseTransaction,
        target: LedgerTarget,
        base_minor: i64,
        stored_minor: i64,
    ) -> ResultEngine<BalanceAudit> {
        let tx_filter = match target {
            LedgerTarget::Account(id) => transactions::Column::AccountId.eq(id),
            LedgerTarget::Card(id) => transactions::Column::CardId.eq(id),
        };
        let tx_models = transactions::Entity::find()
            .filter(tx_filter)
            .all(db)
            .await?;

        let mut ledger = Money::new(base_minor);
        let mut settled = ledger;
        for model in tx_models {
            let entry_type = EntryType::try_from(model.entry_type.as_str())?;
            let delta = Money::new(transaction_delta(target, entry_type, model.amount_minor));
            ledger = ledger.try_add(delta)?;
            if TransactionStatus::try_from(model.status.as_str())? == TransactionStatus::Approved {
                settled = settled.try_add(delta)?;
            }
        }

        let transfer_filter = match target {
            LedgerTarget::Account(id) => Condition::any()
                .add(transfers::Column::FromAccountId.eq(id))
                .add(transfers::Column::ToAccountId.eq(id)),
            LedgerTarget::Card(id) => Condition::all().add(transfers::Column::ToCardId.eq(id)),
        };
        let transfer_models = transfers::Entity::find()
            .filter(transfer_filter)
            .all(db)
            .await?;

        for model in transfer_models {
            let transfer = transfers::Transfer::try_from(model)?;
            let amount = Money::new(transfer.amount_minor);
            let mut delta = Money::ZERO;
            if target == LedgerTarget::Account(transfer.from_account_id) {
                delta = delta.try_sub(amount)?;
            }
            if transfer.destination == target {
                delta = delta.try_add(amount)?;
            }
            ledger = ledger.try_add(delta)?;
            if transfer.status == TransferStatus::Completed {
                settled = settled.try_add(delta)?;
            }
        }

        let audit = BalanceAudit {
            target,
            stored_minor,
            ledger_minor: ledger.minor(),
            settled_minor: settled.minor(),
        };
        if !audit.is_consistent() {
            tracing::warn!(
                ?target,
                stored = %Money::new(stored_minor),
                %ledger,
                "stored balance drifted from ledger"
            );
        }
        Ok(audit)
    }

    /// Compares an account's stored balance with a replay of its ledger.
    pub async fn account_balance_audit(
        &self,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BalanceAudit> {
        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id, user_id).await?;
            self.audit_target(
                &db_tx,
                LedgerTarget::Account(account.id),
                account.initial_balance_minor,
                account.balance_minor,
            )
            .await
        })
    }

    /// Compares a card's stored balance with a replay of its ledger.
    pub async fn card_balance_audit(&self, card_id: Uuid, user_id: &str) -> ResultEngine<BalanceAudit> {
        with_tx!(self, |db_tx| {
            let card = self.require_card(&db_tx, card_id, user_id).await?;
            self.audit_target(&db_tx, LedgerTarget::Card(card.id), 0, card.balance_minor)
                .await
        })
    }

    /// Audits every account and card of a user and returns the ones whose
    /// stored balance drifted from the ledger.
    ///
    /// With `repair`, each drifting balance is overwritten with the ledger
    /// replay in the same DB transaction. The returned audits describe the
    /// state found before the repair.
    pub async fn reconcile_balances(
        &self,
        user_id: &str,
        repair: bool,
    ) -> ResultEngine<Vec<BalanceAudit>> {
        with_tx!(self, |db_tx| {
            let mut drifted = Vec::new();

            let account_models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?;
            for account in account_models {
                let audit = self
                    .audit_target(
                        &db_tx,
                        LedgerTarget::Account(account.id),
                        account.initial_balance_minor,
                        account.balance_minor,
                    )
                    .await?;
                if !audit.is_consistent() {
                    if repair {
                        accounts::ActiveModel {
                            id: ActiveValue::Set(account.id),
                            balance_minor: ActiveValue::Set(audit.ledger_minor),
                            updated_at: ActiveValue::Set(Utc::now()),
                            ..Default::default()
                        }
                        .update(&db_tx)
                        .await?;
                    }
                    drifted.push(audit);
                }
            }

            let card_models = cards::Entity::find()
                .filter(cards::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?;
            for card in card_models {
                let audit = self
                    .audit_target(&db_tx, LedgerTarget::Card(card.id), 0, card.balance_minor)
                    .await?;
                if !audit.is_consistent() {
                    if repair {
                        cards::ActiveModel {
                            id: ActiveValue::Set(card.id),
                            balance_minor: ActiveValue::Set(audit.ledger_minor),
                            updated_at: ActiveValue::Set(Utc::now()),
                            ..Default::default()
                        }
                        .update(&db_tx)
                        .await?;
                    }
                    drifted.push(audit);
                }
            }

            if repair && !drifted.is_empty() {
                tracing::info!(user_id, repaired = drifted.len(), "balances reconciled");
            }
            Ok(drifted)
        })
    }
}
