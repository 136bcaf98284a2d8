use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod access;
mod account_types;
mod accounts;
mod attachments;
mod balances;
mod budgets;
mod cards;
mod categories;
mod currencies;
mod reports;
mod transactions;
mod transfers;

pub use balances::BalanceAudit;
pub use reports::{CashFlowMonth, CategorySummary, FinancialStatistics, Granularity, PeriodSummary};
pub use transactions::{RefFilter, SortOrder, TransactionListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `None` keeps the current text, an empty or blank string clears it.
fn apply_optional_text_patch(existing: Option<String>, patch: Option<&str>) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_names_are_trimmed() {
        assert_eq!(normalize_required_name("  Cash ", "account").unwrap(), "Cash");
        assert_eq!(
            normalize_required_name("   ", "account"),
            Err(EngineError::Validation(
                "account name must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn text_patch_keeps_sets_or_clears() {
        let existing = Some("old".to_string());
        assert_eq!(apply_optional_text_patch(existing.clone(), None), existing);
        assert_eq!(
            apply_optional_text_patch(existing.clone(), Some(" new ")),
            Some("new".to_string())
        );
        assert_eq!(apply_optional_text_patch(existing, Some("  ")), None);
    }
}
