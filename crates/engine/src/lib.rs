//! Ledger core for a personal-finance backend.
//!
//! The engine keeps the stored balances of accounts and cards in step with
//! the transactions and transfers that touch them. Every write that moves a
//! balance runs inside one database transaction together with the ledger row,
//! and balances are adjusted with a single atomic increment statement.

pub use account_types::AccountType;
pub use accounts::Account;
pub use attachments::Attachment;
pub use budgets::{Budget, BudgetPeriod, BudgetView, SpendingWindow};
pub use cards::Card;
pub use categories::{Category, CategoryType};
pub use commands::{
    FieldPatch, NewAccountCmd, NewAttachmentCmd, NewBudgetCmd, NewCardCmd, NewCategoryCmd,
    NewCurrencyCmd, NewTransactionCmd, NewTransferCmd, UpdateAccountCmd, UpdateBudgetCmd,
    UpdateCardCmd, UpdateCategoryCmd, UpdateCurrencyCmd, UpdateTransactionCmd, UpdateTransferCmd,
};
pub use currencies::Currency;
pub use error::EngineError;
pub use ledger::{EntryType, LedgerTarget};
pub use money::Money;
pub use ops::{
    BalanceAudit, CashFlowMonth, CategorySummary, Engine, EngineBuilder, FinancialStatistics,
    Granularity, PeriodSummary, RefFilter, SortOrder, TransactionListFilter,
};
pub use transactions::{Transaction, TransactionStatus, TransactionView};
pub use transfers::{Transfer, TransferStatus};

mod account_types;
mod accounts;
mod attachments;
mod budget_categories;
mod budgets;
mod cards;
mod categories;
mod commands;
mod currencies;
mod error;
mod ledger;
mod money;
mod ops;
mod transactions;
mod transfers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
