use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, LedgerTarget, NewTransferCmd, ResultEngine, Transfer, TransferStatus,
    UpdateTransferCmd,
    currencies::ensure_currency_code,
    ledger::transfer_deltas,
    transfers::{self, ensure_distinct_endpoints},
    util::ensure_positive_amount,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, with_tx};

impl Engine {
    /// Moves the balances of both endpoints by `amount_minor` in transfer
    /// direction. A negative amount reverses a transfer.
    async fn apply_transfer_effect(
        &self,
        db_tx: &DatabaseTransaction,
        transfer: &Transfer,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        let (source_delta, destination_delta) = transfer_deltas(amount_minor);
        self.apply_balance_delta(
            db_tx,
            LedgerTarget::Account(transfer.from_account_id),
            source_delta,
        )
        .await?;
        self.apply_balance_delta(db_tx, transfer.destination, destination_delta)
            .await
    }

    async fn target_currency(
        &self,
        db_tx: &DatabaseTransaction,
        target: LedgerTarget,
        user_id: &str,
    ) -> ResultEngine<String> {
        Ok(match target {
            LedgerTarget::Account(id) => self.require_account(db_tx, id, user_id).await?.currency_code,
            LedgerTarget::Card(id) => self.require_card(db_tx, id, user_id).await?.currency_code,
        })
    }

    /// Checks that an endpoint belongs to the user and is held in
    /// `currency`. Archived endpoints may still send and receive transfers.
    async fn require_transfer_endpoint(
        &self,
        db_tx: &DatabaseTransaction,
        endpoint: LedgerTarget,
        user_id: &str,
        currency: &str,
    ) -> ResultEngine<()> {
        let endpoint_currency = self.target_currency(db_tx, endpoint, user_id).await?;
        if endpoint_currency != currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "transfer endpoint is in {endpoint_currency}, got {currency}"
            )));
        }
        Ok(())
    }

    /// Records a transfer: the source account loses the amount and the
    /// destination gains it.
    ///
    /// Status defaults to `COMPLETED` and is metadata only: balances move at
    /// creation whatever the status.
    pub async fn create_transfer(&self, cmd: NewTransferCmd) -> ResultEngine<Transfer> {
        ensure_positive_amount(cmd.amount_minor)?;
        ensure_distinct_endpoints(cmd.from_account_id, cmd.destination)?;
        let currency = ensure_currency_code(&cmd.currency)?;
        let user_id = cmd.user_id.as_str();

        with_tx!(self, |db_tx| {
            self.require_currency(&db_tx, &currency).await?;
            for endpoint in [LedgerTarget::Account(cmd.from_account_id), cmd.destination] {
                self.require_transfer_endpoint(&db_tx, endpoint, user_id, &currency)
                    .await?;
            }

            let now = Utc::now();
            let transfer = Transfer {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                amount_minor: cmd.amount_minor,
                currency,
                transfer_date: cmd.transfer_date,
                from_account_id: cmd.from_account_id,
                destination: cmd.destination,
                status: cmd.status.unwrap_or(TransferStatus::Completed),
                description: normalize_optional_text(cmd.description.as_deref()),
                notes: normalize_optional_text(cmd.notes.as_deref()),
                created_at: now,
                updated_at: now,
            };

            self.apply_transfer_effect(&db_tx, &transfer, transfer.amount_minor)
                .await?;
            transfers::ActiveModel::from(&transfer)
                .insert(&db_tx)
                .await?;

            tracing::info!(
                transfer_id = %transfer.id,
                user_id,
                from = %transfer.from_account_id,
                to = ?transfer.destination,
                "transfer created"
            );
            Ok(transfer)
        })
    }

    pub async fn transfer(&self, transfer_id: Uuid, user_id: &str) -> ResultEngine<Transfer> {
        with_tx!(self, |db_tx| {
            let model = self.require_transfer(&db_tx, transfer_id, user_id).await?;
            Transfer::try_from(model)
        })
    }

    /// Lists the user's transfers, newest first.
    pub async fn list_transfers(&self, user_id: &str) -> ResultEngine<Vec<Transfer>> {
        let models = transfers::Entity::find()
            .filter(transfers::Column::UserId.eq(user_id))
            .order_by_desc(transfers::Column::TransferDate)
            .order_by_desc(transfers::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transfer::try_from).collect()
    }

    /// Updates a transfer.
    ///
    /// The old amount is given back on the original endpoints and the new
    /// amount is applied to the same endpoints. A new currency must still
    /// match both of them.
    pub async fn update_transfer(
        &self,
        transfer_id: Uuid,
        user_id: &str,
        cmd: UpdateTransferCmd,
    ) -> ResultEngine<Transfer> {
        if let Some(amount_minor) = cmd.amount_minor {
            ensure_positive_amount(amount_minor)?;
        }
        let new_currency = cmd
            .currency
            .as_deref()
            .map(ensure_currency_code)
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_transfer(&db_tx, transfer_id, user_id).await?;
            let mut transfer = Transfer::try_from(model)?;

            if let Some(currency) = new_currency
                && currency != transfer.currency
            {
                self.require_currency(&db_tx, &currency).await?;
                for endpoint in [
                    LedgerTarget::Account(transfer.from_account_id),
                    transfer.destination,
                ] {
                    self.require_transfer_endpoint(&db_tx, endpoint, user_id, &currency)
                        .await?;
                }
                transfer.currency = currency;
            }

            self.apply_transfer_effect(&db_tx, &transfer, -transfer.amount_minor)
                .await?;

            if let Some(amount_minor) = cmd.amount_minor {
                transfer.amount_minor = amount_minor;
            }
            if let Some(date) = cmd.transfer_date {
                transfer.transfer_date = date;
            }
            if let Some(status) = cmd.status {
                transfer.status = status;
            }
            transfer.description =
                apply_optional_text_patch(transfer.description, cmd.description.as_deref());
            transfer.notes = apply_optional_text_patch(transfer.notes, cmd.notes.as_deref());
            transfer.updated_at = Utc::now();

            transfers::ActiveModel::from(&transfer)
                .update(&db_tx)
                .await?;
            self.apply_transfer_effect(&db_tx, &transfer, transfer.amount_minor)
                .await?;

            tracing::info!(%transfer_id, user_id, "transfer updated");
            Ok(transfer)
        })
    }

    /// Deletes a transfer after giving the amount back to the source.
    pub async fn delete_transfer(&self, transfer_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_transfer(&db_tx, transfer_id, user_id).await?;
            let transfer = Transfer::try_from(model)?;

            self.apply_transfer_effect(&db_tx, &transfer, -transfer.amount_minor)
                .await?;
            transfers::Entity::delete_by_id(transfer.id)
                .exec(&db_tx)
                .await?;

            tracing::info!(%transfer_id, user_id, "transfer deleted");
            Ok(())
        })
    }
}
