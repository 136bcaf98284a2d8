//! Reference data every installation starts with.
//!
//! - currencies: ARS (base), USD, EUR
//! - predefined account types: CHECKING, SAVINGS, CASH
//! - global categories, visible to every user

use chrono::Utc;
use sea_orm::{ConnectionTrait, DbBackend, Statement, Value};
use sea_orm_migration::{SchemaManagerConnection, prelude::*};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CURRENCIES: [(&str, &str, &str, &str, bool); 3] = [
    ("ARS", "Argentine Peso", "$", "1", true),
    ("USD", "US Dollar", "$", "1160.00", false),
    ("EUR", "Euro", "€", "1288.99", false),
];

const ACCOUNT_TYPES: [&str; 3] = ["CHECKING", "SAVINGS", "CASH"];

const CATEGORIES: [(&str, &str); 8] = [
    ("Salary", "INCOME"),
    ("Investments", "INCOME"),
    ("Other Income", "INCOME"),
    ("Groceries", "EXPENSE"),
    ("Rent", "EXPENSE"),
    ("Utilities", "EXPENSE"),
    ("Transport", "EXPENSE"),
    ("Health", "EXPENSE"),
];

/// Same folding the engine applies to names before uniqueness checks.
fn name_key(input: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}

async fn exec(
    db: &SchemaManagerConnection<'_>,
    backend: DbBackend,
    sql: &str,
    values: Vec<Value>,
) -> Result<(), DbErr> {
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        let now = Utc::now().to_rfc3339();

        for (code, name, symbol, rate, is_base) in CURRENCIES {
            exec(
                db,
                backend,
                "INSERT INTO currencies \
                 (code, name, symbol, exchange_rate, is_base, active, last_updated_rate, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);",
                vec![
                    code.into(),
                    name.into(),
                    symbol.into(),
                    rate.into(),
                    Value::Bool(Some(is_base)),
                    Value::Bool(Some(true)),
                    now.clone().into(),
                    now.clone().into(),
                    now.clone().into(),
                ],
            )
            .await?;
        }

        for name in ACCOUNT_TYPES {
            exec(
                db,
                backend,
                "INSERT INTO account_types \
                 (id, user_id, name, name_norm, icon, predefined, created_at, updated_at) \
                 VALUES (?, NULL, ?, ?, NULL, ?, ?, ?);",
                vec![
                    Uuid::new_v4().as_bytes().to_vec().into(),
                    name.into(),
                    name_key(name).into(),
                    Value::Bool(Some(true)),
                    now.clone().into(),
                    now.clone().into(),
                ],
            )
            .await?;
        }

        for (name, kind) in CATEGORIES {
            exec(
                db,
                backend,
                "INSERT INTO categories \
                 (id, user_id, name, name_norm, kind, icon, color, archived, created_at, updated_at) \
                 VALUES (?, NULL, ?, ?, ?, NULL, NULL, ?, ?, ?);",
                vec![
                    Uuid::new_v4().as_bytes().to_vec().into(),
                    name.into(),
                    name_key(name).into(),
                    kind.into(),
                    Value::Bool(Some(false)),
                    now.clone().into(),
                    now.clone().into(),
                ],
            )
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        exec(db, backend, "DELETE FROM categories WHERE user_id IS NULL;", vec![]).await?;
        exec(
            db,
            backend,
            "DELETE FROM account_types WHERE predefined = 1;",
            vec![],
        )
        .await?;
        exec(db, backend, "DELETE FROM currencies;", vec![]).await?;
        Ok(())
    }
}
