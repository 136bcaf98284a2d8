use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Currency, EngineError, NewCurrencyCmd, ResultEngine, UpdateCurrencyCmd, accounts, budgets,
    cards,
    currencies::{self, normalize_currency_code},
    transactions, transfers,
};

use super::{Engine, normalize_required_name, with_tx};

fn validate_rate(rate: Decimal) -> ResultEngine<Decimal> {
    if rate <= Decimal::ZERO {
        return Err(EngineError::Validation(
            "exchange rate must be > 0".to_string(),
        ));
    }
    Ok(rate)
}

impl Engine {
    /// Clears the base flag of whichever currency currently holds it.
    async fn demote_base_currency(&self, db_tx: &DatabaseTransaction) -> ResultEngine<()> {
        currencies::Entity::update_many()
            .col_expr(currencies::Column::IsBase, Expr::value(false))
            .col_expr(currencies::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(currencies::Column::IsBase.eq(true))
            .exec(db_tx)
            .await?;
        Ok(())
    }

    /// Registers a new currency.
    ///
    /// A base currency always gets rate 1 and takes the base flag from the
    /// previous holder. Any other currency needs an explicit rate.
    pub async fn create_currency(&self, cmd: NewCurrencyCmd) -> ResultEngine<Currency> {
        let code = normalize_currency_code(&cmd.code)?;
        let name = normalize_required_name(&cmd.name, "currency")?;
        let symbol = cmd.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(EngineError::Validation(
                "currency symbol must not be empty".to_string(),
            ));
        }
        let exchange_rate = if cmd.is_base {
            Decimal::ONE
        } else {
            let rate = cmd.exchange_rate.ok_or_else(|| {
                EngineError::Validation(format!("exchange rate required for {code}"))
            })?;
            validate_rate(rate)?
        };

        with_tx!(self, |db_tx| {
            if currencies::Entity::find_by_id(code.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(code));
            }

            if cmd.is_base {
                self.demote_base_currency(&db_tx).await?;
            }

            let now = Utc::now();
            let currency = Currency {
                code,
                name,
                symbol,
                exchange_rate,
                is_base: cmd.is_base,
                active: true,
                last_updated_rate: now,
                created_at: now,
                updated_at: now,
            };
            currencies::ActiveModel::from(&currency)
                .insert(&db_tx)
                .await?;

            tracing::info!(code = %currency.code, base = currency.is_base, "currency created");
            Ok(currency)
        })
    }

    /// Like [`Engine::create_currency`] but returns the stored row untouched
    /// when the code is already registered.
    pub async fn create_currency_if_not_exists(
        &self,
        cmd: NewCurrencyCmd,
    ) -> ResultEngine<Currency> {
        let code = normalize_currency_code(&cmd.code)?;
        if let Some(model) = currencies::Entity::find_by_id(code)
            .one(&self.database)
            .await?
        {
            return Currency::try_from(model);
        }
        self.create_currency(cmd).await
    }

    pub async fn currency(&self, code: &str) -> ResultEngine<Currency> {
        with_tx!(self, |db_tx| {
            let model = self.require_currency(&db_tx, code).await?;
            Currency::try_from(model)
        })
    }

    /// Lists currencies by code.
    pub async fn list_currencies(&self, active_only: bool) -> ResultEngine<Vec<Currency>> {
        let mut query = currencies::Entity::find();
        if active_only {
            query = query.filter(currencies::Column::Active.eq(true));
        }
        let models = query
            .order_by_asc(currencies::Column::Code)
            .all(&self.database)
            .await?;
        models.into_iter().map(Currency::try_from).collect()
    }

    pub async fn base_currency(&self) -> ResultEngine<Currency> {
        let model = currencies::Entity::find()
            .filter(currencies::Column::IsBase.eq(true))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("base currency not set".to_string()))?;
        Currency::try_from(model)
    }

    /// Updates a currency. The base currency's rate is pinned to 1.
    pub async fn update_currency(
        &self,
        code: &str,
        cmd: UpdateCurrencyCmd,
    ) -> ResultEngine<Currency> {
        with_tx!(self, |db_tx| {
            let model = self.require_currency(&db_tx, code).await?;
            let mut currency = Currency::try_from(model)?;
            let now = Utc::now();

            if let Some(rate) = cmd.exchange_rate {
                let rate = validate_rate(rate)?;
                if currency.is_base && rate != Decimal::ONE {
                    return Err(EngineError::OperationNotAllowed(format!(
                        "cannot change the exchange rate of base currency {}",
                        currency.code
                    )));
                }
                currency.exchange_rate = rate;
                currency.last_updated_rate = now;
            }
            if let Some(name) = cmd.name.as_deref() {
                currency.name = normalize_required_name(name, "currency")?;
            }
            if let Some(symbol) = cmd.symbol.as_deref() {
                let symbol = symbol.trim();
                if symbol.is_empty() {
                    return Err(EngineError::Validation(
                        "currency symbol must not be empty".to_string(),
                    ));
                }
                currency.symbol = symbol.to_string();
            }
            if let Some(active) = cmd.active {
                if currency.is_base && !active {
                    return Err(EngineError::OperationNotAllowed(
                        "the base currency cannot be deactivated".to_string(),
                    ));
                }
                currency.active = active;
            }
            currency.updated_at = now;

            currencies::ActiveModel::from(&currency)
                .update(&db_tx)
                .await?;
            tracing::info!(code = %currency.code, "currency updated");
            Ok(currency)
        })
    }

    /// Deletes a currency nobody references.
    pub async fn delete_currency(&self, code: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_currency(&db_tx, code).await?;
            if model.is_base {
                return Err(EngineError::OperationNotAllowed(
                    "cannot delete the base currency".to_string(),
                ));
            }

            let code = model.code.clone();
            let references = [
                (
                    "accounts",
                    accounts::Entity::find()
                        .filter(accounts::Column::CurrencyCode.eq(code.clone()))
                        .count(&db_tx)
                        .await?,
                ),
                (
                    "cards",
                    cards::Entity::find()
                        .filter(cards::Column::CurrencyCode.eq(code.clone()))
                        .count(&db_tx)
                        .await?,
                ),
                (
                    "budgets",
                    budgets::Entity::find()
                        .filter(budgets::Column::CurrencyCode.eq(code.clone()))
                        .count(&db_tx)
                        .await?,
                ),
                (
                    "transactions",
                    transactions::Entity::find()
                        .filter(transactions::Column::CurrencyCode.eq(code.clone()))
                        .count(&db_tx)
                        .await?,
                ),
                (
                    "transfers",
                    transfers::Entity::find()
                        .filter(transfers::Column::CurrencyCode.eq(code.clone()))
                        .count(&db_tx)
                        .await?,
                ),
            ];
            if let Some((table, count)) = references.iter().find(|(_, count)| *count > 0) {
                return Err(EngineError::OperationNotAllowed(format!(
                    "currency {code} is used by {count} row(s) in {table}"
                )));
            }

            currencies::Entity::delete_by_id(model.code.clone())
                .exec(&db_tx)
                .await?;
            tracing::info!(code = %model.code, "currency deleted");
            Ok(())
        })
    }

    /// Moves the base flag to `code` and pins its rate to 1.
    ///
    /// Rates of the other currencies are left as they are.
    pub async fn set_base_currency(&self, code: &str) -> ResultEngine<Currency> {
        with_tx!(self, |db_tx| {
            let model = self.require_currency(&db_tx, code).await?;
            let mut currency = Currency::try_from(model)?;
            if currency.is_base {
                return Ok(currency);
            }

            self.demote_base_currency(&db_tx).await?;

            let now = Utc::now();
            currency.is_base = true;
            currency.active = true;
            currency.exchange_rate = Decimal::ONE;
            currency.last_updated_rate = now;
            currency.updated_at = now;
            currencies::ActiveModel {
                code: ActiveValue::Set(currency.code.clone()),
                is_base: ActiveValue::Set(true),
                active: ActiveValue::Set(true),
                exchange_rate: ActiveValue::Set(currency.exchange_rate.to_string()),
                last_updated_rate: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            tracing::info!(code = %currency.code, "base currency changed");
            Ok(currency)
        })
    }
}
