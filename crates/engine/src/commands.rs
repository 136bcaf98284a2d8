//! Command structs for engine write operations.
//!
//! These types group parameters for create/update calls, keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    BudgetPeriod, CategoryType, EntryType, LedgerTarget, TransactionStatus, TransferStatus,
};

/// Three-way update of an optional field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    /// Applies the patch to the current value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// Register a new currency.
#[derive(Clone, Debug)]
pub struct NewCurrencyCmd {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub exchange_rate: Option<Decimal>,
    pub is_base: bool,
}

impl NewCurrencyCmd {
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            symbol: symbol.into(),
            exchange_rate: None,
            is_base: false,
        }
    }

    #[must_use]
    pub fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn base(mut self) -> Self {
        self.is_base = true;
        self
    }
}

/// Update a registered currency. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct UpdateCurrencyCmd {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub user_id: String,
    pub name: String,
    pub account_type_id: Uuid,
    pub currency: String,
    pub initial_balance_minor: i64,
    pub bank_name: Option<String>,
    pub include_in_net_worth: bool,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        account_type_id: Uuid,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            account_type_id,
            currency: currency.into(),
            initial_balance_minor: 0,
            bank_name: None,
            include_in_net_worth: true,
        }
    }

    #[must_use]
    pub fn initial_balance(mut self, minor: i64) -> Self {
        self.initial_balance_minor = minor;
        self
    }

    #[must_use]
    pub fn bank_name(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = Some(bank_name.into());
        self
    }

    #[must_use]
    pub fn include_in_net_worth(mut self, include: bool) -> Self {
        self.include_in_net_worth = include;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateAccountCmd {
    pub name: Option<String>,
    pub account_type_id: Option<Uuid>,
    pub bank_name: Option<String>,
    pub include_in_net_worth: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct NewCardCmd {
    pub user_id: String,
    pub name: String,
    pub currency: String,
    pub bank_name: Option<String>,
    pub credit_limit_minor: Option<i64>,
    pub billing_cycle_day: Option<u8>,
    pub payment_due_day: Option<u8>,
    pub linked_account_id: Option<Uuid>,
}

impl NewCardCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            currency: currency.into(),
            bank_name: None,
            credit_limit_minor: None,
            billing_cycle_day: None,
            payment_due_day: None,
            linked_account_id: None,
        }
    }

    #[must_use]
    pub fn credit_limit(mut self, minor: i64) -> Self {
        self.credit_limit_minor = Some(minor);
        self
    }

    #[must_use]
    pub fn billing_days(mut self, billing_cycle_day: u8, payment_due_day: u8) -> Self {
        self.billing_cycle_day = Some(billing_cycle_day);
        self.payment_due_day = Some(payment_due_day);
        self
    }

    #[must_use]
    pub fn linked_account(mut self, account_id: Uuid) -> Self {
        self.linked_account_id = Some(account_id);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateCardCmd {
    pub name: Option<String>,
    pub bank_name: Option<String>,
    pub credit_limit_minor: FieldPatch<i64>,
    pub billing_cycle_day: FieldPatch<u8>,
    pub payment_due_day: FieldPatch<u8>,
    pub linked_account_id: FieldPatch<Uuid>,
}

#[derive(Clone, Debug)]
pub struct NewCategoryCmd {
    pub user_id: String,
    pub name: String,
    pub kind: CategoryType,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewCategoryCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, kind: CategoryType) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            kind,
            icon: None,
            color: None,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateCategoryCmd {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Create a transaction against one account or card.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub user_id: String,
    pub target: LedgerTarget,
    pub entry_type: EntryType,
    pub amount_minor: i64,
    pub currency: String,
    pub transaction_date: DateTime<Utc>,
    /// Defaults to `APPROVED`.
    pub status: Option<TransactionStatus>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        target: LedgerTarget,
        entry_type: EntryType,
        amount_minor: i64,
        currency: impl Into<String>,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            target,
            entry_type,
            amount_minor,
            currency: currency.into(),
            transaction_date,
            status: None,
            category_id: None,
            description: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Update the mutable fields of a transaction.
///
/// Entry type, target and currency are fixed at creation. An empty string
/// clears a text field.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub category_id: FieldPatch<Uuid>,
    pub notes: Option<String>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn transaction_date(mut self, date: DateTime<Utc>) -> Self {
        self.transaction_date = Some(date);
        self
    }

    #[must_use]
    pub fn category(mut self, patch: FieldPatch<Uuid>) -> Self {
        self.category_id = patch;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Move money from an account to another account or a card.
#[derive(Clone, Debug)]
pub struct NewTransferCmd {
    pub user_id: String,
    pub from_account_id: Uuid,
    pub destination: LedgerTarget,
    pub amount_minor: i64,
    pub currency: String,
    pub transfer_date: DateTime<Utc>,
    /// Defaults to `COMPLETED`.
    pub status: Option<TransferStatus>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl NewTransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        from_account_id: Uuid,
        destination: LedgerTarget,
        amount_minor: i64,
        currency: impl Into<String>,
        transfer_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            from_account_id,
            destination,
            amount_minor,
            currency: currency.into(),
            transfer_date,
            status: None,
            description: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: TransferStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Update a transfer. Source and destination are fixed at creation.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransferCmd {
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub transfer_date: Option<DateTime<Utc>>,
    pub status: Option<TransferStatus>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl UpdateTransferCmd {
    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewBudgetCmd {
    pub user_id: String,
    pub name: String,
    pub amount_limit_minor: i64,
    pub currency: String,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub category_ids: Vec<Uuid>,
}

impl NewBudgetCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        amount_limit_minor: i64,
        currency: impl Into<String>,
        period: BudgetPeriod,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            amount_limit_minor,
            currency: currency.into(),
            period,
            start_date,
            end_date: None,
            notes: None,
            category_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn categories(mut self, category_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.category_ids = category_ids.into_iter().collect();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Update a budget. `category_ids`, when present, replaces the whole set.
#[derive(Clone, Debug, Default)]
pub struct UpdateBudgetCmd {
    pub name: Option<String>,
    pub amount_limit_minor: Option<i64>,
    pub currency: Option<String>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: FieldPatch<NaiveDate>,
    pub notes: Option<String>,
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Clone, Debug)]
pub struct NewAttachmentCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub description: Option<String>,
}

impl NewAttachmentCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        transaction_id: Uuid,
        file_name: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
            file_name: file_name.into(),
            file_path: file_path.into(),
            file_type: None,
            file_size: None,
            description: None,
        }
    }

    #[must_use]
    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    #[must_use]
    pub fn file_size(mut self, bytes: i64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_patch_applies_three_ways() {
        assert_eq!(FieldPatch::Keep.apply(Some(1)), Some(1));
        assert_eq!(FieldPatch::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(FieldPatch::Set(2).apply(None), Some(2));
    }
}
