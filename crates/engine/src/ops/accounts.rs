use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, EngineError, LedgerTarget, NewAccountCmd, ResultEngine, UpdateAccountCmd, accounts,
    transactions, transfers, util::normalize_name_key,
};

use super::{Engine, apply_optional_text_patch, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        })
    }

    /// Lists the user's accounts by name.
    pub async fn list_accounts(
        &self,
        user_id: &str,
        include_archived: bool,
    ) -> ResultEngine<Vec<Account>> {
        let mut query = accounts::Entity::find().filter(accounts::Column::UserId.eq(user_id));
        if !include_archived {
            query = query.filter(accounts::Column::Archived.eq(false));
        }
        let models = query
            .order_by_asc(accounts::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }

    /// Add a new account. The stored balance starts at the initial balance.
    pub async fn create_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let user_id = cmd.user_id.as_str();
        with_tx!(self, |db_tx| {
            let exists = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::NameNorm.eq(normalize_name_key(&name)))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            self.require_visible_account_type(&db_tx, cmd.account_type_id, user_id)
                .await?;
            let currency = self.require_active_currency(&db_tx, &cmd.currency).await?;

            let now = Utc::now();
            let account = Account {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                name,
                account_type_id: cmd.account_type_id,
                currency: currency.code,
                initial_balance_minor: cmd.initial_balance_minor,
                balance_minor: cmd.initial_balance_minor,
                bank_name: normalize_optional_text(cmd.bank_name.as_deref()),
                include_in_net_worth: cmd.include_in_net_worth,
                archived: false,
                created_at: now,
                updated_at: now,
            };
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;

            tracing::info!(
                account_id = %account.id,
                user_id,
                currency = %account.currency,
                "account created"
            );
            Ok(account)
        })
    }

    /// Updates the descriptive fields of an account.
    ///
    /// Currency and balances are not editable here; balances only move
    /// through transactions and transfers.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        user_id: &str,
        cmd: UpdateAccountCmd,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let mut account = Account::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "account")?;
                let clash = accounts::Entity::find()
                    .filter(accounts::Column::UserId.eq(user_id))
                    .filter(accounts::Column::NameNorm.eq(normalize_name_key(&name)))
                    .filter(accounts::Column::Id.ne(account_id))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if clash {
                    return Err(EngineError::ExistingKey(name));
                }
                account.name = name;
            }
            if let Some(account_type_id) = cmd.account_type_id {
                self.require_visible_account_type(&db_tx, account_type_id, user_id)
                    .await?;
                account.account_type_id = account_type_id;
            }
            account.bank_name = apply_optional_text_patch(account.bank_name, cmd.bank_name.as_deref());
            if let Some(include) = cmd.include_in_net_worth {
                account.include_in_net_worth = include;
            }
            account.updated_at = Utc::now();

            accounts::ActiveModel {
                id: ActiveValue::Set(account.id),
                name: ActiveValue::Set(account.name.clone()),
                name_norm: ActiveValue::Set(normalize_name_key(&account.name)),
                account_type_id: ActiveValue::Set(account.account_type_id),
                bank_name: ActiveValue::Set(account.bank_name.clone()),
                include_in_net_worth: ActiveValue::Set(account.include_in_net_worth),
                updated_at: ActiveValue::Set(account.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(account)
        })
    }

    pub async fn archive_account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<Account> {
        self.set_account_archived(account_id, user_id, true).await
    }

    pub async fn unarchive_account(
        &self,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Account> {
        self.set_account_archived(account_id, user_id, false).await
    }

    async fn set_account_archived(
        &self,
        account_id: Uuid,
        user_id: &str,
        archived: bool,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let mut account = Account::try_from(model)?;
            account.archived = archived;
            account.updated_at = Utc::now();
            accounts::ActiveModel {
                id: ActiveValue::Set(account.id),
                archived: ActiveValue::Set(archived),
                updated_at: ActiveValue::Set(account.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(account)
        })
    }

    /// Deletes an account with no ledger history and a zero balance.
    pub async fn delete_account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;

            let tx_count = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id))
                .count(&db_tx)
                .await?;
            if tx_count > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "account '{}' has {tx_count} transaction(s)",
                    model.name
                )));
            }

            let transfer_count = transfers::Entity::find()
                .filter(
                    Condition::any()
                        .add(transfers::Column::FromAccountId.eq(account_id))
                        .add(transfers::Column::ToAccountId.eq(account_id)),
                )
                .count(&db_tx)
                .await?;
            if transfer_count > 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "account '{}' has {transfer_count} transfer(s)",
                    model.name
                )));
            }

            let audit = self
                .audit_target(
                    &db_tx,
                    LedgerTarget::Account(model.id),
                    model.initial_balance_minor,
                    model.balance_minor,
                )
                .await?;
            if audit.settled_minor != 0 {
                return Err(EngineError::OperationNotAllowed(format!(
                    "account '{}' balance is not zero",
                    model.name
                )));
            }

            accounts::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(%account_id, user_id, "account deleted");
            Ok(())
        })
    }
}
