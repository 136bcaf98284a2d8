//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication
//! - `currencies`: currency registry, one base currency
//! - `account_types`: predefined and user-defined account kinds
//! - `accounts`, `cards`: balance holders with a stored running balance
//! - `categories`: global (no owner) and user categories
//! - `transactions`: ledger rows against exactly one account or card
//! - `transfers`: ledger rows from an account to an account or card
//! - `budgets`, `budget_categories`: spending caps over category sets
//! - `attachments`: file metadata hanging off transactions

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Currencies {
    Table,
    Code,
    Name,
    Symbol,
    ExchangeRate,
    IsBase,
    Active,
    LastUpdatedRate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AccountTypes {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    Icon,
    Predefined,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    AccountTypeId,
    CurrencyCode,
    InitialBalanceMinor,
    BalanceMinor,
    BankName,
    IncludeInNetWorth,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    BankName,
    CurrencyCode,
    CreditLimitMinor,
    BalanceMinor,
    BillingCycleDay,
    PaymentDueDay,
    LinkedAccountId,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    Kind,
    Icon,
    Color,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Description,
    DescriptionNorm,
    AmountMinor,
    CurrencyCode,
    TransactionDate,
    Status,
    EntryType,
    CategoryId,
    AccountId,
    CardId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    UserId,
    AmountMinor,
    CurrencyCode,
    TransferDate,
    FromAccountId,
    ToAccountId,
    ToCardId,
    Status,
    Description,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    AmountLimitMinor,
    CurrencyCode,
    Period,
    StartDate,
    EndDate,
    Active,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetCategories {
    Table,
    BudgetId,
    CategoryId,
}

#[derive(Iden)]
enum Attachments {
    Table,
    Id,
    TransactionId,
    UserId,
    FileName,
    FilePath,
    FileType,
    FileSize,
    Description,
    UploadedAt,
}

fn created_updated(table: &mut TableCreateStatement, created: impl Iden + 'static, updated: impl Iden + 'static) {
    table
        .col(ColumnDef::new(created).timestamp().not_null())
        .col(ColumnDef::new(updated).timestamp().not_null());
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Currencies
        // ───────────────────────────────────────────────────────────────────
        let mut currencies = Table::create();
        currencies
            .table(Currencies::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Currencies::Code)
                    .string_len(3)
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Currencies::Name).string().not_null())
            .col(ColumnDef::new(Currencies::Symbol).string().not_null())
            .col(ColumnDef::new(Currencies::ExchangeRate).string().not_null())
            .col(
                ColumnDef::new(Currencies::IsBase)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(Currencies::Active)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(
                ColumnDef::new(Currencies::LastUpdatedRate)
                    .timestamp()
                    .not_null(),
            );
        created_updated(&mut currencies, Currencies::CreatedAt, Currencies::UpdatedAt);
        manager.create_table(currencies.to_owned()).await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Account types
        // ───────────────────────────────────────────────────────────────────
        let mut account_types = Table::create();
        account_types
            .table(AccountTypes::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(AccountTypes::Id)
                    .blob()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(AccountTypes::UserId).string())
            .col(ColumnDef::new(AccountTypes::Name).string().not_null())
            .col(ColumnDef::new(AccountTypes::NameNorm).string().not_null())
            .col(ColumnDef::new(AccountTypes::Icon).string())
            .col(
                ColumnDef::new(AccountTypes::Predefined)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-account_types-user_id")
                    .from(AccountTypes::Table, AccountTypes::UserId)
                    .to(Users::Table, Users::Username)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        created_updated(&mut account_types, AccountTypes::CreatedAt, AccountTypes::UpdatedAt);
        manager.create_table(account_types.to_owned()).await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Accounts
        // ───────────────────────────────────────────────────────────────────
        let mut accounts = Table::create();
        accounts
            .table(Accounts::Table)
            .if_not_exists()
            .col(ColumnDef::new(Accounts::Id).blob().not_null().primary_key())
            .col(ColumnDef::new(Accounts::UserId).string().not_null())
            .col(ColumnDef::new(Accounts::Name).string().not_null())
            .col(ColumnDef::new(Accounts::NameNorm).string().not_null())
            .col(ColumnDef::new(Accounts::AccountTypeId).blob().not_null())
            .col(ColumnDef::new(Accounts::CurrencyCode).string_len(3).not_null())
            .col(
                ColumnDef::new(Accounts::InitialBalanceMinor)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(Accounts::BalanceMinor)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(Accounts::BankName).string())
            .col(
                ColumnDef::new(Accounts::IncludeInNetWorth)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(
                ColumnDef::new(Accounts::Archived)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-accounts-user_id")
                    .from(Accounts::Table, Accounts::UserId)
                    .to(Users::Table, Users::Username),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-accounts-account_type_id")
                    .from(Accounts::Table, Accounts::AccountTypeId)
                    .to(AccountTypes::Table, AccountTypes::Id),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-accounts-currency_code")
                    .from(Accounts::Table, Accounts::CurrencyCode)
                    .to(Currencies::Table, Currencies::Code),
            );
        created_updated(&mut accounts, Accounts::CreatedAt, Accounts::UpdatedAt);
        manager.create_table(accounts.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id-name_norm")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Cards
        // ───────────────────────────────────────────────────────────────────
        let mut cards = Table::create();
        cards
            .table(Cards::Table)
            .if_not_exists()
            .col(ColumnDef::new(Cards::Id).blob().not_null().primary_key())
            .col(ColumnDef::new(Cards::UserId).string().not_null())
            .col(ColumnDef::new(Cards::Name).string().not_null())
            .col(ColumnDef::new(Cards::NameNorm).string().not_null())
            .col(ColumnDef::new(Cards::BankName).string())
            .col(ColumnDef::new(Cards::CurrencyCode).string_len(3).not_null())
            .col(ColumnDef::new(Cards::CreditLimitMinor).big_integer())
            .col(
                ColumnDef::new(Cards::BalanceMinor)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(Cards::BillingCycleDay).integer())
            .col(ColumnDef::new(Cards::PaymentDueDay).integer())
            .col(ColumnDef::new(Cards::LinkedAccountId).blob())
            .col(
                ColumnDef::new(Cards::Archived)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-cards-user_id")
                    .from(Cards::Table, Cards::UserId)
                    .to(Users::Table, Users::Username),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-cards-currency_code")
                    .from(Cards::Table, Cards::CurrencyCode)
                    .to(Currencies::Table, Currencies::Code),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-cards-linked_account_id")
                    .from(Cards::Table, Cards::LinkedAccountId)
                    .to(Accounts::Table, Accounts::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        created_updated(&mut cards, Cards::CreatedAt, Cards::UpdatedAt);
        manager.create_table(cards.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cards-user_id")
                    .table(Cards::Table)
                    .col(Cards::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cards-user_id-name_norm")
                    .table(Cards::Table)
                    .col(Cards::UserId)
                    .col(Cards::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Categories
        // ───────────────────────────────────────────────────────────────────
        let mut categories = Table::create();
        categories
            .table(Categories::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Categories::Id)
                    .blob()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Categories::UserId).string())
            .col(ColumnDef::new(Categories::Name).string().not_null())
            .col(ColumnDef::new(Categories::NameNorm).string().not_null())
            .col(ColumnDef::new(Categories::Kind).string().not_null())
            .col(ColumnDef::new(Categories::Icon).string())
            .col(ColumnDef::new(Categories::Color).string())
            .col(
                ColumnDef::new(Categories::Archived)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-categories-user_id")
                    .from(Categories::Table, Categories::UserId)
                    .to(Users::Table, Users::Username)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        created_updated(&mut categories, Categories::CreatedAt, Categories::UpdatedAt);
        manager.create_table(categories.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-kind-name_norm")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Kind)
                    .col(Categories::NameNorm)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Transactions
        // ───────────────────────────────────────────────────────────────────
        let mut transactions = Table::create();
        transactions
            .table(Transactions::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Transactions::Id)
                    .blob()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Transactions::UserId).string().not_null())
            .col(ColumnDef::new(Transactions::Description).string())
            .col(ColumnDef::new(Transactions::DescriptionNorm).string())
            .col(
                ColumnDef::new(Transactions::AmountMinor)
                    .big_integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(Transactions::CurrencyCode)
                    .string_len(3)
                    .not_null(),
            )
            .col(
                ColumnDef::new(Transactions::TransactionDate)
                    .timestamp()
                    .not_null(),
            )
            .col(ColumnDef::new(Transactions::Status).string().not_null())
            .col(ColumnDef::new(Transactions::EntryType).string().not_null())
            .col(ColumnDef::new(Transactions::CategoryId).blob())
            .col(ColumnDef::new(Transactions::AccountId).blob())
            .col(ColumnDef::new(Transactions::CardId).blob())
            .col(ColumnDef::new(Transactions::Notes).string())
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transactions-user_id")
                    .from(Transactions::Table, Transactions::UserId)
                    .to(Users::Table, Users::Username),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transactions-currency_code")
                    .from(Transactions::Table, Transactions::CurrencyCode)
                    .to(Currencies::Table, Currencies::Code),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transactions-category_id")
                    .from(Transactions::Table, Transactions::CategoryId)
                    .to(Categories::Table, Categories::Id),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transactions-account_id")
                    .from(Transactions::Table, Transactions::AccountId)
                    .to(Accounts::Table, Accounts::Id),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transactions-card_id")
                    .from(Transactions::Table, Transactions::CardId)
                    .to(Cards::Table, Cards::Id),
            );
        created_updated(&mut transactions, Transactions::CreatedAt, Transactions::UpdatedAt);
        manager.create_table(transactions.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-transaction_date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-card_id")
                    .table(Transactions::Table)
                    .col(Transactions::CardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-category_id")
                    .table(Transactions::Table)
                    .col(Transactions::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Transfers
        // ───────────────────────────────────────────────────────────────────
        let mut transfers = Table::create();
        transfers
            .table(Transfers::Table)
            .if_not_exists()
            .col(ColumnDef::new(Transfers::Id).blob().not_null().primary_key())
            .col(ColumnDef::new(Transfers::UserId).string().not_null())
            .col(ColumnDef::new(Transfers::AmountMinor).big_integer().not_null())
            .col(
                ColumnDef::new(Transfers::CurrencyCode)
                    .string_len(3)
                    .not_null(),
            )
            .col(ColumnDef::new(Transfers::TransferDate).timestamp().not_null())
            .col(ColumnDef::new(Transfers::FromAccountId).blob().not_null())
            .col(ColumnDef::new(Transfers::ToAccountId).blob())
            .col(ColumnDef::new(Transfers::ToCardId).blob())
            .col(ColumnDef::new(Transfers::Status).string().not_null())
            .col(ColumnDef::new(Transfers::Description).string())
            .col(ColumnDef::new(Transfers::Notes).string())
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transfers-user_id")
                    .from(Transfers::Table, Transfers::UserId)
                    .to(Users::Table, Users::Username),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transfers-currency_code")
                    .from(Transfers::Table, Transfers::CurrencyCode)
                    .to(Currencies::Table, Currencies::Code),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transfers-from_account_id")
                    .from(Transfers::Table, Transfers::FromAccountId)
                    .to(Accounts::Table, Accounts::Id),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transfers-to_account_id")
                    .from(Transfers::Table, Transfers::ToAccountId)
                    .to(Accounts::Table, Accounts::Id),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transfers-to_card_id")
                    .from(Transfers::Table, Transfers::ToCardId)
                    .to(Cards::Table, Cards::Id),
            );
        created_updated(&mut transfers, Transfers::CreatedAt, Transfers::UpdatedAt);
        manager.create_table(transfers.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-user_id-transfer_date")
                    .table(Transfers::Table)
                    .col(Transfers::UserId)
                    .col(Transfers::TransferDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Budgets
        // ───────────────────────────────────────────────────────────────────
        let mut budgets = Table::create();
        budgets
            .table(Budgets::Table)
            .if_not_exists()
            .col(ColumnDef::new(Budgets::Id).blob().not_null().primary_key())
            .col(ColumnDef::new(Budgets::UserId).string().not_null())
            .col(ColumnDef::new(Budgets::Name).string().not_null())
            .col(ColumnDef::new(Budgets::NameNorm).string().not_null())
            .col(
                ColumnDef::new(Budgets::AmountLimitMinor)
                    .big_integer()
                    .not_null(),
            )
            .col(ColumnDef::new(Budgets::CurrencyCode).string_len(3).not_null())
            .col(ColumnDef::new(Budgets::Period).string().not_null())
            .col(ColumnDef::new(Budgets::StartDate).date().not_null())
            .col(ColumnDef::new(Budgets::EndDate).date())
            .col(
                ColumnDef::new(Budgets::Active)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(ColumnDef::new(Budgets::Notes).string())
            .foreign_key(
                ForeignKey::create()
                    .name("fk-budgets-user_id")
                    .from(Budgets::Table, Budgets::UserId)
                    .to(Users::Table, Users::Username),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-budgets-currency_code")
                    .from(Budgets::Table, Budgets::CurrencyCode)
                    .to(Currencies::Table, Currencies::Code),
            );
        created_updated(&mut budgets, Budgets::CreatedAt, Budgets::UpdatedAt);
        manager.create_table(budgets.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id-name_norm")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BudgetCategories::BudgetId).blob().not_null())
                    .col(
                        ColumnDef::new(BudgetCategories::CategoryId)
                            .blob()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(BudgetCategories::BudgetId)
                            .col(BudgetCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-budget_id")
                            .from(BudgetCategories::Table, BudgetCategories::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-category_id")
                            .from(BudgetCategories::Table, BudgetCategories::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Attachments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachments::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attachments::TransactionId).blob().not_null())
                    .col(ColumnDef::new(Attachments::UserId).string().not_null())
                    .col(ColumnDef::new(Attachments::FileName).string().not_null())
                    .col(ColumnDef::new(Attachments::FilePath).string().not_null())
                    .col(ColumnDef::new(Attachments::FileType).string())
                    .col(ColumnDef::new(Attachments::FileSize).big_integer())
                    .col(ColumnDef::new(Attachments::Description).string())
                    .col(ColumnDef::new(Attachments::UploadedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-attachments-transaction_id")
                            .from(Attachments::Table, Attachments::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-attachments-user_id")
                            .from(Attachments::Table, Attachments::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-attachments-transaction_id")
                    .table(Attachments::Table)
                    .col(Attachments::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
