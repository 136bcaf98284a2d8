//! Currency registry rows.
//!
//! Each currency carries its exchange rate against the single base currency.
//! The engine never converts amounts; it only compares codes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code, always upper case.
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Units of the base currency for one unit of this currency.
    pub exchange_rate: Decimal,
    pub is_base: bool,
    pub active: bool,
    pub last_updated_rate: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validates and upper-cases a three letter currency code.
pub fn normalize_currency_code(code: &str) -> ResultEngine<String> {
    ensure_currency_code(&code.trim().to_ascii_uppercase())
}

/// Checks that `code` is three ASCII letters without changing it.
///
/// Ledger rows use this: their code must equal the target's code verbatim.
pub fn ensure_currency_code(code: &str) -> ResultEngine<String> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::Validation(format!(
            "invalid currency code: {code}"
        )));
    }
    Ok(code.to_string())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub exchange_rate: String,
    pub is_base: bool,
    pub active: bool,
    pub last_updated_rate: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Currency> for ActiveModel {
    fn from(value: &Currency) -> Self {
        Self {
            code: ActiveValue::Set(value.code.clone()),
            name: ActiveValue::Set(value.name.clone()),
            symbol: ActiveValue::Set(value.symbol.clone()),
            exchange_rate: ActiveValue::Set(value.exchange_rate.to_string()),
            is_base: ActiveValue::Set(value.is_base),
            active: ActiveValue::Set(value.active),
            last_updated_rate: ActiveValue::Set(value.last_updated_rate),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Currency {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let exchange_rate = Decimal::from_str(&model.exchange_rate).map_err(|_| {
            EngineError::Validation(format!(
                "invalid exchange rate stored for {}",
                model.code
            ))
        })?;
        Ok(Self {
            code: model.code,
            name: model.name,
            symbol: model.symbol,
            exchange_rate,
            is_base: model.is_base,
            active: model.active,
            last_updated_rate: model.last_updated_rate,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
