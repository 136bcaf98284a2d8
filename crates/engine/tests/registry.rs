use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BudgetPeriod, CategoryType, Engine, EngineError, EntryType, FieldPatch, LedgerTarget,
    NewAccountCmd, NewAttachmentCmd, NewBudgetCmd, NewCardCmd, NewCategoryCmd, NewCurrencyCmd,
    NewTransactionCmd, NewTransferCmd, UpdateAccountCmd, UpdateCardCmd, UpdateCategoryCmd,
    UpdateCurrencyCmd,
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

async fn type_id(engine: &Engine, user: &str, name: &str) -> Uuid {
    engine
        .list_account_types(user)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == name)
        .unwrap()
        .id
}

#[tokio::test]
async fn seeded_currencies_have_a_single_base() {
    let (engine, _db) = engine_with_db().await;

    let base = engine.base_currency().await.unwrap();
    assert_eq!(base.code, "ARS");
    assert_eq!(base.exchange_rate, dec!(1));

    let codes: Vec<String> = engine
        .list_currencies(true)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, ["ARS", "EUR", "USD"]);
    assert_eq!(engine.currency("usd").await.unwrap().exchange_rate, dec!(1160));
}

#[tokio::test]
async fn currency_creation_rules() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_currency(NewCurrencyCmd::new("BRL", "Real", "R$"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_currency(NewCurrencyCmd::new("USD", "Dollar", "$").exchange_rate(dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let brl = engine
        .create_currency(NewCurrencyCmd::new("brl", "Real", "R$").exchange_rate(dec!(210.5)))
        .await
        .unwrap();
    assert_eq!(brl.code, "BRL");
    assert!(!brl.is_base);

    let existing = engine
        .create_currency_if_not_exists(
            NewCurrencyCmd::new("USD", "Other", "U$").exchange_rate(dec!(1)),
        )
        .await
        .unwrap();
    assert_eq!(existing.name, "US Dollar");
    assert_eq!(existing.exchange_rate, dec!(1160));

    let gbp = engine
        .create_currency(
            NewCurrencyCmd::new("GBP", "Pound", "£")
                .exchange_rate(dec!(1500))
                .base(),
        )
        .await
        .unwrap();
    assert!(gbp.is_base);
    assert_eq!(gbp.exchange_rate, dec!(1));
    assert!(!engine.currency("ARS").await.unwrap().is_base);
}

#[tokio::test]
async fn base_currency_is_protected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .update_currency(
            "ARS",
            UpdateCurrencyCmd {
                exchange_rate: Some(dec!(2)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    let err = engine
        .update_currency(
            "ARS",
            UpdateCurrencyCmd {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    let err = engine.delete_currency("ARS").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    let before = engine.currency("EUR").await.unwrap();
    let updated = engine
        .update_currency(
            "EUR",
            UpdateCurrencyCmd {
                exchange_rate: Some(dec!(1300.25)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.exchange_rate, dec!(1300.25));
    assert!(updated.last_updated_rate >= before.last_updated_rate);
}

#[tokio::test]
async fn base_change_keeps_other_rates() {
    let (engine, _db) = engine_with_db().await;

    let usd = engine.set_base_currency("USD").await.unwrap();
    assert!(usd.is_base);
    assert_eq!(usd.exchange_rate, dec!(1));
    assert_eq!(engine.base_currency().await.unwrap().code, "USD");

    let ars = engine.currency("ARS").await.unwrap();
    assert!(!ars.is_base);
    assert_eq!(ars.exchange_rate, dec!(1));
    assert_eq!(engine.currency("EUR").await.unwrap().exchange_rate, dec!(1288.99));

    let bases = engine
        .list_currencies(false)
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.is_base)
        .count();
    assert_eq!(bases, 1);
}

#[tokio::test]
async fn currency_in_use_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let checking = type_id(&engine, "alice", "CHECKING").await;
    engine
        .create_account(NewAccountCmd::new("alice", "Euros", checking, "EUR"))
        .await
        .unwrap();

    let err = engine.delete_currency("EUR").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    engine.delete_currency("USD").await.unwrap();
    assert!(matches!(
        engine.currency("USD").await,
        Err(EngineError::KeyNotFound(_))
    ));

    // A budget alone keeps its currency alive.
    engine
        .create_currency(NewCurrencyCmd::new("BRL", "Real", "R$").exchange_rate(dec!(210.5)))
        .await
        .unwrap();
    engine
        .create_budget(NewBudgetCmd::new(
            "alice",
            "Trip",
            50_000,
            "BRL",
            BudgetPeriod::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ))
        .await
        .unwrap();
    let err = engine.delete_currency("BRL").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
    assert_eq!(engine.currency("BRL").await.unwrap().code, "BRL");
}

#[tokio::test]
async fn account_types_are_shared_or_private() {
    let (engine, _db) = engine_with_db().await;

    let names: Vec<String> = engine
        .list_account_types("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, ["CASH", "CHECKING", "SAVINGS"]);

    let err = engine
        .create_account_type("alice", "checking", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let broker = engine
        .create_account_type("alice", "Broker", Some("chart"))
        .await
        .unwrap();
    assert!(!broker.predefined);
    assert_eq!(engine.list_account_types("bob").await.unwrap().len(), 3);

    let checking = type_id(&engine, "alice", "CHECKING").await;
    assert!(matches!(
        engine.update_account_type(checking, "alice", Some("Mine"), None).await,
        Err(EngineError::KeyNotFound(_))
    ));

    let renamed = engine
        .update_account_type(broker.id, "alice", Some("Brokerage"), Some(""))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Brokerage");
    assert_eq!(renamed.icon, None);

    engine
        .create_account(NewAccountCmd::new("alice", "Stocks", broker.id, "USD"))
        .await
        .unwrap();
    let err = engine
        .delete_account_type(broker.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
}

#[tokio::test]
async fn account_rules() {
    let (engine, _db) = engine_with_db().await;
    let checking = type_id(&engine, "alice", "CHECKING").await;

    let main = engine
        .create_account(
            NewAccountCmd::new("alice", "Main", checking, "usd")
                .initial_balance(2_500)
                .bank_name("First Bank"),
        )
        .await
        .unwrap();
    assert_eq!(main.currency, "USD");
    assert_eq!(main.balance_minor, 2_500);

    let err = engine
        .create_account(NewAccountCmd::new("alice", "MAIN", checking, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .create_account(NewAccountCmd::new("alice", "Ahorro Ñandú", checking, "USD"))
        .await
        .unwrap();
    let err = engine
        .create_account(NewAccountCmd::new("alice", "ahorro ñandú", checking, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    // Bob keeps his own namespace.
    engine
        .create_account(NewAccountCmd::new("bob", "ahorro ñandú", checking, "USD"))
        .await
        .unwrap();

    let err = engine
        .create_account(NewAccountCmd::new("alice", "Nowhere", checking, "XXX"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let updated = engine
        .update_account(
            main.id,
            "alice",
            UpdateAccountCmd {
                name: Some("Everyday".to_string()),
                include_in_net_worth: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Everyday");
    assert!(!updated.include_in_net_worth);
    assert_eq!(updated.balance_minor, 2_500);

    engine.archive_account(main.id, "alice").await.unwrap();
    let active = engine.list_accounts("alice", false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Ahorro Ñandú");
    assert_eq!(engine.list_accounts("alice", true).await.unwrap().len(), 2);
    engine.unarchive_account(main.id, "alice").await.unwrap();

    let err = engine.delete_account(main.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
}

#[tokio::test]
async fn accounts_with_history_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let checking = type_id(&engine, "alice", "CHECKING").await;
    let a = engine
        .create_account(NewAccountCmd::new("alice", "A", checking, "USD"))
        .await
        .unwrap();
    let b = engine
        .create_account(NewAccountCmd::new("alice", "B", checking, "USD"))
        .await
        .unwrap();
    let when = Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap();

    let tx = engine
        .create_transaction(NewTransactionCmd::new(
            "alice",
            LedgerTarget::Account(a.id),
            EntryType::Credit,
            100,
            "USD",
            when,
        ))
        .await
        .unwrap();
    let err = engine.delete_account(a.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
    engine
        .delete_transaction(tx.transaction.id, "alice")
        .await
        .unwrap();

    let transfer = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            b.id,
            LedgerTarget::Account(a.id),
            100,
            "USD",
            when,
        ))
        .await
        .unwrap();
    let err = engine.delete_account(a.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
    engine.delete_transfer(transfer.id, "alice").await.unwrap();

    engine.delete_account(a.id, "alice").await.unwrap();
    assert!(matches!(
        engine.account(a.id, "alice").await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn card_rules() {
    let (engine, _db) = engine_with_db().await;
    let checking = type_id(&engine, "alice", "CHECKING").await;
    let payer = engine
        .create_account(NewAccountCmd::new("alice", "Payer", checking, "ARS"))
        .await
        .unwrap();

    let err = engine
        .create_card(NewCardCmd::new("alice", "Bad", "USD").credit_limit(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_card(NewCardCmd::new("alice", "Bad", "USD").billing_days(0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let card = engine
        .create_card(
            NewCardCmd::new("alice", "Visa", "USD")
                .credit_limit(500_000)
                .billing_days(5, 20)
                .linked_account(payer.id),
        )
        .await
        .unwrap();
    assert_eq!(card.balance_minor, 0);
    assert_eq!(card.linked_account_id, Some(payer.id));

    engine
        .create_card(NewCardCmd::new("alice", "Crédito Único", "USD"))
        .await
        .unwrap();
    let err = engine
        .create_card(NewCardCmd::new("alice", "CRÉDITO ÚNICO", "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .create_card(NewCardCmd::new("alice", "visa", "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let updated = engine
        .update_card(
            card.id,
            "alice",
            UpdateCardCmd {
                credit_limit_minor: FieldPatch::Clear,
                linked_account_id: FieldPatch::Clear,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.credit_limit_minor, None);
    assert_eq!(updated.linked_account_id, None);
    assert_eq!(updated.billing_cycle_day, Some(5));

    let when = Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap();
    let purchase = engine
        .create_transaction(NewTransactionCmd::new(
            "alice",
            LedgerTarget::Card(card.id),
            EntryType::Debit,
            1_000,
            "USD",
            when,
        ))
        .await
        .unwrap();

    let err = engine.delete_card(card.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    engine.archive_card(card.id, "alice").await.unwrap();
    let err = engine.delete_card(card.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    engine.unarchive_card(card.id, "alice").await.unwrap();
    engine
        .delete_transaction(purchase.transaction.id, "alice")
        .await
        .unwrap();
    engine.archive_card(card.id, "alice").await.unwrap();
    engine.delete_card(card.id, "alice").await.unwrap();
    let left: Vec<String> = engine
        .list_cards("alice", true)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(left, ["Crédito Único"]);
}

#[tokio::test]
async fn categories_are_unique_per_kind_and_global_ones_are_read_only() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_category(NewCategoryCmd::new("alice", "groceries", CategoryType::Expense))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let income_groceries = engine
        .create_category(NewCategoryCmd::new("alice", "Groceries", CategoryType::Income))
        .await
        .unwrap();
    assert_eq!(income_groceries.kind, CategoryType::Income);

    let pets = engine
        .create_category(
            NewCategoryCmd::new("alice", "Pets", CategoryType::Expense)
                .icon("paw")
                .color("#aa7700"),
        )
        .await
        .unwrap();
    assert!(matches!(
        engine.category(pets.id, "bob").await,
        Err(EngineError::KeyNotFound(_))
    ));

    let global = engine
        .list_categories("bob", Some(CategoryType::Expense), false)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Groceries")
        .unwrap();
    assert_eq!(global.user_id, None);
    assert!(matches!(
        engine
            .update_category(
                global.id,
                "bob",
                UpdateCategoryCmd {
                    name: Some("Food".to_string()),
                    ..Default::default()
                }
            )
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_category(global.id, "bob").await,
        Err(EngineError::KeyNotFound(_))
    ));

    let archived = engine
        .toggle_category_archived(pets.id, "alice")
        .await
        .unwrap();
    assert!(archived.archived);
    assert!(
        !engine
            .list_categories("alice", None, false)
            .await
            .unwrap()
            .iter()
            .any(|c| c.id == pets.id)
    );
    assert!(
        engine
            .list_categories("alice", None, true)
            .await
            .unwrap()
            .iter()
            .any(|c| c.id == pets.id)
    );

    let checking = type_id(&engine, "alice", "CHECKING").await;
    let account = engine
        .create_account(NewAccountCmd::new("alice", "Main", checking, "USD"))
        .await
        .unwrap();
    let err = engine
        .create_transaction(
            NewTransactionCmd::new(
                "alice",
                LedgerTarget::Account(account.id),
                EntryType::Debit,
                100,
                "USD",
                Utc::now(),
            )
            .category(pets.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
}

#[tokio::test]
async fn attachments_are_counted_on_transaction_views() {
    let (engine, _db) = engine_with_db().await;
    let checking = type_id(&engine, "alice", "CHECKING").await;
    let account = engine
        .create_account(NewAccountCmd::new("alice", "Main", checking, "USD"))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(NewTransactionCmd::new(
            "alice",
            LedgerTarget::Account(account.id),
            EntryType::Credit,
            100,
            "USD",
            Utc::now(),
        ))
        .await
        .unwrap();
    let tx_id = tx.transaction.id;

    let receipt = engine
        .add_attachment(
            NewAttachmentCmd::new("alice", tx_id, "receipt.pdf", "blobs/alice/receipt.pdf")
                .file_type("application/pdf")
                .file_size(2_048),
        )
        .await
        .unwrap();
    engine
        .add_attachment(NewAttachmentCmd::new("alice", tx_id, "photo.jpg", "blobs/alice/photo.jpg"))
        .await
        .unwrap();

    assert_eq!(engine.transaction(tx_id, "alice").await.unwrap().attachment_count, 2);
    assert_eq!(engine.list_attachments(tx_id, "alice").await.unwrap().len(), 2);

    let err = engine
        .add_attachment(NewAttachmentCmd::new("bob", tx_id, "x.txt", "blobs/bob/x.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let described = engine
        .update_attachment_description(receipt.id, "alice", "March groceries")
        .await
        .unwrap();
    assert_eq!(described.description.as_deref(), Some("March groceries"));
    assert_eq!(
        engine
            .attachment(receipt.id, "alice")
            .await
            .unwrap()
            .description
            .as_deref(),
        Some("March groceries")
    );

    let removed = engine.delete_attachment(receipt.id, "alice").await.unwrap();
    assert_eq!(removed.file_path, "blobs/alice/receipt.pdf");
    assert_eq!(engine.transaction(tx_id, "alice").await.unwrap().attachment_count, 1);
}
