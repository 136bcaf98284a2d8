//! Request and response bodies of the HTTP surface.
//!
//! Amounts travel as signed integers of minor units (`1050` is `10.50`).
//! Timestamps are RFC3339; request timestamps may carry any offset and are
//! normalized to UTC by the server. Enumerations (entry type, statuses,
//! budget period, category type) are upper-case strings such as `"DEBIT"`.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query string shared by list endpoints that can hide archived rows.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedQuery {
    pub include_archived: Option<bool>,
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub description: Option<String>,
        /// Must be > 0.
        pub amount_minor: i64,
        pub currency_code: String,
        pub transaction_date: DateTime<FixedOffset>,
        /// Defaults to `APPROVED`.
        pub status: Option<String>,
        pub notes: Option<String>,
        pub category_id: Option<Uuid>,
        /// `CREDIT` or `DEBIT`.
        pub entry_type: String,
        /// Exactly one of `accountId` and `cardId` must be present.
        pub account_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionUpdate {
        pub description: Option<String>,
        pub amount_minor: Option<i64>,
        pub transaction_date: Option<DateTime<FixedOffset>>,
        /// The nil UUID removes the category.
        pub category_id: Option<Uuid>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: Uuid,
        pub description: Option<String>,
        pub amount_minor: i64,
        pub currency_code: String,
        pub transaction_date: DateTime<Utc>,
        pub status: String,
        pub entry_type: String,
        pub category_id: Option<Uuid>,
        pub account_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
        pub notes: Option<String>,
        pub attachment_count: u64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Listing filters, read from the query string.
    ///
    /// For `categoryId`, `accountId` and `cardId` the nil UUID selects rows
    /// where the reference is absent.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `nextCursor`.
        pub cursor: Option<String>,
        pub start_date: Option<DateTime<FixedOffset>>,
        pub end_date: Option<DateTime<FixedOffset>>,
        pub entry_type: Option<String>,
        pub category_id: Option<Uuid>,
        pub account_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
        pub status: Option<String>,
        pub description: Option<String>,
        /// `desc` (default, newest first) or `asc`.
        pub order: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page.
        pub next_cursor: Option<String>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferNew {
        pub amount_minor: i64,
        pub currency_code: String,
        pub transfer_date: DateTime<FixedOffset>,
        pub from_account_id: Uuid,
        /// Exactly one of `toAccountId` and `toCardId` must be present.
        pub to_account_id: Option<Uuid>,
        pub to_card_id: Option<Uuid>,
        /// Defaults to `COMPLETED`.
        pub status: Option<String>,
        pub description: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferUpdate {
        pub amount_minor: Option<i64>,
        pub currency_code: Option<String>,
        pub transfer_date: Option<DateTime<FixedOffset>>,
        pub status: Option<String>,
        pub description: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferView {
        pub id: Uuid,
        pub amount_minor: i64,
        pub currency_code: String,
        pub transfer_date: DateTime<Utc>,
        pub from_account_id: Uuid,
        pub to_account_id: Option<Uuid>,
        pub to_card_id: Option<Uuid>,
        pub status: String,
        pub description: Option<String>,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferListResponse {
        pub transfers: Vec<TransferView>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetNew {
        pub name: String,
        pub amount_limit_minor: i64,
        pub currency_code: String,
        /// `WEEKLY`, `MONTHLY`, `YEARLY` or `CUSTOM`.
        pub period: String,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        #[serde(default)]
        pub category_ids: Vec<Uuid>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetUpdate {
        pub name: Option<String>,
        pub amount_limit_minor: Option<i64>,
        pub currency_code: Option<String>,
        pub period: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        /// Drops the end date; wins over `endDate`.
        #[serde(default)]
        pub clear_end_date: bool,
        /// Replaces the whole category set when present.
        pub category_ids: Option<Vec<Uuid>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetView {
        pub id: Uuid,
        pub name: String,
        pub amount_limit_minor: i64,
        pub currency_code: String,
        pub period: String,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub active: bool,
        pub notes: Option<String>,
        pub category_ids: Vec<Uuid>,
        /// Spending inside the current window.
        pub spent_minor: i64,
        pub remaining_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetListQuery {
        pub active_only: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetListResponse {
        pub budgets: Vec<BudgetView>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountNew {
        pub name: String,
        pub account_type_id: Uuid,
        pub currency_code: String,
        #[serde(default)]
        pub initial_balance_minor: i64,
        pub bank_name: Option<String>,
        pub include_in_net_worth: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountUpdate {
        pub name: Option<String>,
        pub account_type_id: Option<Uuid>,
        pub bank_name: Option<String>,
        pub include_in_net_worth: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub account_type_id: Uuid,
        pub currency_code: String,
        pub initial_balance_minor: i64,
        pub balance_minor: i64,
        pub bank_name: Option<String>,
        pub include_in_net_worth: bool,
        pub archived: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountTypeNew {
        pub name: String,
        pub icon: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountTypeUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountTypeView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub predefined: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountTypeListResponse {
        pub account_types: Vec<AccountTypeView>,
    }
}

pub mod card {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CardNew {
        pub name: String,
        pub currency_code: String,
        pub bank_name: Option<String>,
        pub credit_limit_minor: Option<i64>,
        pub billing_cycle_day: Option<u8>,
        pub payment_due_day: Option<u8>,
        pub linked_account_id: Option<Uuid>,
    }

    /// For `linkedAccountId` the nil UUID unlinks the payment account.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CardUpdate {
        pub name: Option<String>,
        pub bank_name: Option<String>,
        pub credit_limit_minor: Option<i64>,
        pub billing_cycle_day: Option<u8>,
        pub payment_due_day: Option<u8>,
        pub linked_account_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CardView {
        pub id: Uuid,
        pub name: String,
        pub bank_name: Option<String>,
        pub currency_code: String,
        pub credit_limit_minor: Option<i64>,
        pub balance_minor: i64,
        pub billing_cycle_day: Option<u8>,
        pub payment_due_day: Option<u8>,
        pub linked_account_id: Option<Uuid>,
        pub archived: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardListResponse {
        pub cards: Vec<CardView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        /// `INCOME` or `EXPENSE`.
        #[serde(rename = "type")]
        pub kind: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryListQuery {
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub include_archived: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub archived: bool,
        /// Shared with every user and read-only.
        pub global: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod currency {
    use super::*;
    use rust_decimal::Decimal;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CurrencyNew {
        pub code: String,
        pub name: String,
        pub symbol: String,
        /// Decimal string, units of base currency per unit. Defaults to 1.
        pub exchange_rate: Option<Decimal>,
        #[serde(default)]
        pub is_base: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CurrencyUpdate {
        pub name: Option<String>,
        pub symbol: Option<String>,
        pub exchange_rate: Option<Decimal>,
        pub active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CurrencyListQuery {
        pub active_only: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CurrencyView {
        pub code: String,
        pub name: String,
        pub symbol: String,
        pub exchange_rate: Decimal,
        pub is_base: bool,
        pub active: bool,
        pub last_updated_rate: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyListResponse {
        pub currencies: Vec<CurrencyView>,
    }
}

pub mod attachment {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AttachmentNew {
        pub file_name: String,
        /// Opaque location in the external blob store.
        pub file_path: String,
        pub file_type: Option<String>,
        pub file_size: Option<i64>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttachmentUpdate {
        pub description: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AttachmentView {
        pub id: Uuid,
        pub transaction_id: Uuid,
        pub file_name: String,
        pub file_path: String,
        pub file_type: Option<String>,
        pub file_size: Option<i64>,
        pub description: Option<String>,
        pub uploaded_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttachmentListResponse {
        pub attachments: Vec<AttachmentView>,
    }
}

pub mod report {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategorySummaryQuery {
        pub start_date: Option<DateTime<FixedOffset>>,
        pub end_date: Option<DateTime<FixedOffset>>,
        /// Unknown values are ignored.
        pub entry_type: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OverTimeQuery {
        pub start_date: Option<DateTime<FixedOffset>>,
        pub end_date: Option<DateTime<FixedOffset>>,
        /// `daily`, `monthly` (default) or `yearly`.
        pub granularity: Option<String>,
        pub entry_type: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CashFlowQuery {
        pub year: i32,
        pub month: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StatisticsQuery {
        pub start_date: DateTime<FixedOffset>,
        pub end_date: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategorySummaryView {
        pub category_id: Uuid,
        pub category_name: String,
        pub total_minor: i64,
        pub transaction_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PeriodSummaryView {
        pub period: String,
        pub total_minor: i64,
        pub transaction_count: u64,
    }

    /// Keyed by entry type (`CREDIT`, `DEBIT`).
    pub type OverTimeResponse = BTreeMap<String, Vec<PeriodSummaryView>>;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CashFlowMonthView {
        pub month: String,
        pub income_minor: i64,
        pub expense_minor: i64,
        pub net_flow_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FinancialStatisticsView {
        pub total_income_minor: i64,
        pub total_expense_minor: i64,
        pub net_savings_minor: i64,
        pub average_daily_income_minor: i64,
        pub average_daily_expense_minor: i64,
        pub number_of_days: i64,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BalanceAuditView {
        pub account_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
        pub stored_minor: i64,
        pub ledger_minor: i64,
        pub settled_minor: i64,
        pub consistent: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReconcileQuery {
        /// Overwrite drifting balances with the ledger recomputation.
        pub repair: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileResponse {
        pub repaired: bool,
        pub drifting: Vec<BalanceAuditView>,
    }
}
