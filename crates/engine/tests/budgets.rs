use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BudgetPeriod, CategoryType, Engine, EngineError, EntryType, FieldPatch, LedgerTarget,
    NewAccountCmd, NewBudgetCmd, NewCategoryCmd, NewTransactionCmd, TransactionStatus,
    UpdateBudgetCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
}

async fn groceries(engine: &Engine) -> Uuid {
    engine
        .list_categories("alice", Some(CategoryType::Expense), false)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Groceries")
        .expect("Groceries is seeded")
        .id
}

async fn usd_account(engine: &Engine) -> Uuid {
    let type_id = engine
        .list_account_types("alice")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == "CHECKING")
        .unwrap()
        .id;
    engine
        .create_account(NewAccountCmd::new("alice", "Main", type_id, "USD").initial_balance(1_000_000))
        .await
        .unwrap()
        .id
}

async fn spend(
    engine: &Engine,
    account: Uuid,
    category: Option<Uuid>,
    entry_type: EntryType,
    amount: i64,
    when: DateTime<Utc>,
) {
    let mut cmd = NewTransactionCmd::new(
        "alice",
        LedgerTarget::Account(account),
        entry_type,
        amount,
        "USD",
        when,
    );
    if let Some(category) = category {
        cmd = cmd.category(category);
    }
    engine.create_transaction(cmd).await.unwrap();
}

#[tokio::test]
async fn monthly_window_includes_last_day_and_excludes_the_next() {
    let (engine, _db) = engine_with_db().await;
    let account = usd_account(&engine).await;
    let groceries = groceries(&engine).await;

    let budget = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Food", 50_000, "USD", BudgetPeriod::Monthly, date(2024, 1, 1))
                .categories([groceries]),
        )
        .await
        .unwrap();

    spend(&engine, account, Some(groceries), EntryType::Debit, 1_000, at(2024, 1, 1, 0, 0, 0)).await;
    spend(&engine, account, Some(groceries), EntryType::Debit, 2_000, at(2024, 1, 31, 23, 59, 59)).await;
    spend(&engine, account, Some(groceries), EntryType::Debit, 4_000, at(2024, 2, 1, 0, 0, 0)).await;
    spend(&engine, account, Some(groceries), EntryType::Debit, 8_000, at(2023, 12, 31, 23, 59, 59)).await;

    let view = engine
        .budget_on(budget.budget.id, "alice", date(2024, 1, 15))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 3_000);
    assert_eq!(view.remaining_minor, 47_000);
}

#[tokio::test]
async fn only_approved_debits_in_budget_categories_count() {
    let (engine, _db) = engine_with_db().await;
    let account = usd_account(&engine).await;
    let groceries = groceries(&engine).await;
    let rent = engine
        .create_category(NewCategoryCmd::new("alice", "Flat", CategoryType::Expense))
        .await
        .unwrap()
        .id;

    let budget = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Food", 10_000, "USD", BudgetPeriod::Monthly, date(2024, 5, 1))
                .categories([groceries]),
        )
        .await
        .unwrap();

    let when = at(2024, 5, 10, 9, 0, 0);
    spend(&engine, account, Some(groceries), EntryType::Debit, 700, when).await;
    spend(&engine, account, Some(groceries), EntryType::Credit, 300, when).await;
    spend(&engine, account, Some(rent), EntryType::Debit, 5_000, when).await;
    spend(&engine, account, None, EntryType::Debit, 900, when).await;
    engine
        .create_transaction(
            NewTransactionCmd::new(
                "alice",
                LedgerTarget::Account(account),
                EntryType::Debit,
                400,
                "USD",
                when,
            )
            .category(groceries)
            .status(TransactionStatus::PendingApproval),
        )
        .await
        .unwrap();

    let view = engine
        .budget_on(budget.budget.id, "alice", date(2024, 5, 20))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 700);

    let view = engine
        .add_budget_category(budget.budget.id, rent, "alice")
        .await
        .unwrap();
    assert_eq!(view.budget.category_ids.len(), 2);
    let view = engine
        .budget_on(budget.budget.id, "alice", date(2024, 5, 20))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 5_700);
}

#[tokio::test]
async fn explicit_end_date_and_custom_periods() {
    let (engine, _db) = engine_with_db().await;
    let account = usd_account(&engine).await;
    let groceries = groceries(&engine).await;

    spend(&engine, account, Some(groceries), EntryType::Debit, 100, at(2024, 3, 5, 8, 0, 0)).await;
    spend(&engine, account, Some(groceries), EntryType::Debit, 200, at(2024, 3, 10, 20, 0, 0)).await;
    spend(&engine, account, Some(groceries), EntryType::Debit, 400, at(2024, 3, 11, 0, 0, 0)).await;

    let fixed = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Fixed", 1_000, "USD", BudgetPeriod::Yearly, date(2024, 3, 1))
                .end_date(date(2024, 3, 10))
                .categories([groceries]),
        )
        .await
        .unwrap();
    let view = engine
        .budget_on(fixed.budget.id, "alice", date(2024, 6, 1))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 300);

    let custom = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Open", 1_000, "USD", BudgetPeriod::Custom, date(2024, 3, 1))
                .categories([groceries]),
        )
        .await
        .unwrap();
    let view = engine
        .budget_on(custom.budget.id, "alice", date(2024, 3, 10))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 300);

    let toggled = engine
        .toggle_budget_status(custom.budget.id, "alice")
        .await
        .unwrap();
    assert!(!toggled.budget.active);
    let view = engine
        .budget_on(custom.budget.id, "alice", date(2024, 3, 10))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 0);
}

#[tokio::test]
async fn budget_without_categories_spends_nothing() {
    let (engine, _db) = engine_with_db().await;
    let account = usd_account(&engine).await;
    let groceries = groceries(&engine).await;
    spend(&engine, account, Some(groceries), EntryType::Debit, 100, at(2024, 3, 5, 8, 0, 0)).await;

    let budget = engine
        .create_budget(NewBudgetCmd::new(
            "alice",
            "Empty",
            1_000,
            "USD",
            BudgetPeriod::Monthly,
            date(2024, 3, 1),
        ))
        .await
        .unwrap();
    let view = engine
        .budget_on(budget.budget.id, "alice", date(2024, 3, 15))
        .await
        .unwrap();
    assert_eq!(view.spent_minor, 0);
    assert_eq!(view.remaining_minor, 1_000);
}

#[tokio::test]
async fn category_membership_changes_are_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let groceries = groceries(&engine).await;
    let budget = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Food", 1_000, "USD", BudgetPeriod::Weekly, date(2024, 3, 1))
                .categories([groceries, groceries]),
        )
        .await
        .unwrap();
    assert_eq!(budget.budget.category_ids, vec![groceries]);

    let view = engine
        .add_budget_category(budget.budget.id, groceries, "alice")
        .await
        .unwrap();
    assert_eq!(view.budget.category_ids, vec![groceries]);

    let view = engine
        .remove_budget_category(budget.budget.id, groceries, "alice")
        .await
        .unwrap();
    assert!(view.budget.category_ids.is_empty());
    let view = engine
        .remove_budget_category(budget.budget.id, groceries, "alice")
        .await
        .unwrap();
    assert!(view.budget.category_ids.is_empty());
}

#[tokio::test]
async fn archived_categories_cannot_join_and_members_block_category_delete() {
    let (engine, _db) = engine_with_db().await;
    let snacks = engine
        .create_category(NewCategoryCmd::new("alice", "Snacks", CategoryType::Expense))
        .await
        .unwrap();
    let budget = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Food", 1_000, "USD", BudgetPeriod::Monthly, date(2024, 3, 1))
                .categories([snacks.id]),
        )
        .await
        .unwrap();

    let err = engine.delete_category(snacks.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    let hobby = engine
        .create_category(NewCategoryCmd::new("alice", "Hobby", CategoryType::Expense))
        .await
        .unwrap();
    engine
        .toggle_category_archived(hobby.id, "alice")
        .await
        .unwrap();
    let err = engine
        .add_budget_category(budget.budget.id, hobby.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    engine.delete_budget(budget.budget.id, "alice").await.unwrap();
    engine.delete_category(snacks.id, "alice").await.unwrap();
}

#[tokio::test]
async fn budget_validation_and_ownership() {
    let (engine, _db) = engine_with_db().await;
    let start = date(2024, 3, 1);

    let err = engine
        .create_budget(NewBudgetCmd::new("alice", "Zero", 0, "USD", BudgetPeriod::Monthly, start))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_budget(
            NewBudgetCmd::new("alice", "Backwards", 100, "USD", BudgetPeriod::Custom, start)
                .end_date(date(2024, 2, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let budget = engine
        .create_budget(NewBudgetCmd::new("alice", "Travel", 100, "USD", BudgetPeriod::Monthly, start))
        .await
        .unwrap();
    let err = engine
        .create_budget(NewBudgetCmd::new("alice", "Travel", 100, "USD", BudgetPeriod::Monthly, start))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .create_budget(NewBudgetCmd::new("alice", "Año Nuevo", 100, "USD", BudgetPeriod::Yearly, start))
        .await
        .unwrap();
    let err = engine
        .create_budget(NewBudgetCmd::new("alice", "AÑO NUEVO", 100, "USD", BudgetPeriod::Yearly, start))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    assert!(matches!(
        engine.budget(budget.budget.id, "bob").await,
        Err(EngineError::KeyNotFound(_))
    ));

    let updated = engine
        .update_budget(
            budget.budget.id,
            "alice",
            UpdateBudgetCmd {
                name: Some("Trips".to_string()),
                amount_limit_minor: Some(250),
                end_date: FieldPatch::Set(date(2024, 12, 31)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.budget.name, "Trips");
    assert_eq!(updated.budget.amount_limit_minor, 250);
    assert_eq!(updated.budget.end_date, Some(date(2024, 12, 31)));
}

#[tokio::test]
async fn active_budgets_list_newest_start_first() {
    let (engine, _db) = engine_with_db().await;
    for (name, start) in [("B", date(2024, 1, 1)), ("A", date(2024, 1, 1)), ("C", date(2024, 6, 1))] {
        engine
            .create_budget(NewBudgetCmd::new("alice", name, 100, "USD", BudgetPeriod::Monthly, start))
            .await
            .unwrap();
    }
    let paused = engine
        .create_budget(NewBudgetCmd::new(
            "alice",
            "Paused",
            100,
            "USD",
            BudgetPeriod::Monthly,
            date(2025, 1, 1),
        ))
        .await
        .unwrap();
    engine
        .toggle_budget_status(paused.budget.id, "alice")
        .await
        .unwrap();

    let names: Vec<String> = engine
        .list_active_budgets("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.budget.name)
        .collect();
    assert_eq!(names, ["C", "A", "B"]);

    let all: Vec<String> = engine
        .list_budgets("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.budget.name)
        .collect();
    assert_eq!(all, ["A", "B", "C", "Paused"]);
}
