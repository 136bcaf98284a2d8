use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, EntryType, LedgerTarget, NewAccountCmd, NewCardCmd, NewTransactionCmd,
    NewTransferCmd, TransactionStatus, TransferStatus, UpdateTransactionCmd, UpdateTransferCmd,
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

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

async fn checking_type(engine: &Engine, user: &str) -> Uuid {
    engine
        .list_account_types(user)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == "CHECKING")
        .expect("CHECKING is seeded")
        .id
}

async fn account(engine: &Engine, user: &str, name: &str, currency: &str, initial: i64) -> Uuid {
    let type_id = checking_type(engine, user).await;
    engine
        .create_account(
            NewAccountCmd::new(user, name, type_id, currency).initial_balance(initial),
        )
        .await
        .unwrap()
        .id
}

async fn account_balance(engine: &Engine, id: Uuid) -> i64 {
    engine.account(id, "alice").await.unwrap().balance_minor
}

async fn card_balance(engine: &Engine, id: Uuid) -> i64 {
    engine.card(id, "alice").await.unwrap().balance_minor
}

fn debit(target: LedgerTarget, amount: i64) -> NewTransactionCmd {
    NewTransactionCmd::new("alice", target, EntryType::Debit, amount, "USD", day(2024, 3, 1))
}

fn credit(target: LedgerTarget, amount: i64) -> NewTransactionCmd {
    NewTransactionCmd::new("alice", target, EntryType::Credit, amount, "USD", day(2024, 3, 2))
}

#[tokio::test]
async fn account_scenario_reverses_on_update_and_delete() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 10_000).await;
    let target = LedgerTarget::Account(a);

    let spend = engine.create_transaction(debit(target, 3_000)).await.unwrap();
    assert_eq!(spend.attachment_count, 0);
    assert_eq!(account_balance(&engine, a).await, 7_000);

    let refund = engine.create_transaction(credit(target, 1_000)).await.unwrap();
    assert_eq!(account_balance(&engine, a).await, 8_000);

    engine
        .update_transaction(
            spend.transaction.id,
            "alice",
            UpdateTransactionCmd::default().amount(5_000),
        )
        .await
        .unwrap();
    assert_eq!(account_balance(&engine, a).await, 6_000);

    engine
        .delete_transaction(refund.transaction.id, "alice")
        .await
        .unwrap();
    assert_eq!(account_balance(&engine, a).await, 5_000);

    let audit = engine.account_balance_audit(a, "alice").await.unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.ledger_minor, 5_000);
}

#[tokio::test]
async fn transfer_scenario_round_trips() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "A", "USD", 3_000).await;
    let b = account(&engine, "alice", "B", "USD", 0).await;

    let transfer = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(b),
            2_000,
            "USD",
            day(2024, 3, 5),
        ))
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Completed);
    assert_eq!(account_balance(&engine, a).await, 1_000);
    assert_eq!(account_balance(&engine, b).await, 2_000);

    engine.delete_transfer(transfer.id, "alice").await.unwrap();
    assert_eq!(account_balance(&engine, a).await, 3_000);
    assert_eq!(account_balance(&engine, b).await, 0);
}

#[tokio::test]
async fn transfer_update_reapplies_new_amount_to_same_endpoints() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "A", "USD", 5_000).await;
    let card = engine
        .create_card(NewCardCmd::new("alice", "Visa", "USD"))
        .await
        .unwrap();

    let transfer = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Card(card.id),
            1_500,
            "USD",
            day(2024, 3, 5),
        ))
        .await
        .unwrap();
    assert_eq!(account_balance(&engine, a).await, 3_500);
    assert_eq!(card_balance(&engine, card.id).await, 1_500);

    let updated = engine
        .update_transfer(transfer.id, "alice", UpdateTransferCmd::default().amount(500))
        .await
        .unwrap();
    assert_eq!(updated.amount_minor, 500);
    assert_eq!(account_balance(&engine, a).await, 4_500);
    assert_eq!(card_balance(&engine, card.id).await, 500);

    let err = engine
        .update_transfer(
            transfer.id,
            "alice",
            UpdateTransferCmd {
                currency: Some("EUR".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(account_balance(&engine, a).await, 4_500);
}

#[tokio::test]
async fn transfer_rejects_self_and_foreign_currency() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "A", "USD", 1_000).await;
    let eur = account(&engine, "alice", "Euros", "EUR", 0).await;

    let err = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(a),
            100,
            "USD",
            day(2024, 3, 5),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));

    let err = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(eur),
            100,
            "USD",
            day(2024, 3, 5),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(account_balance(&engine, a).await, 1_000);
    assert_eq!(account_balance(&engine, eur).await, 0);

    let err = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(eur),
            100,
            "usd",
            day(2024, 3, 5),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
}

#[tokio::test]
async fn archived_accounts_still_take_part_in_transfers() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "A", "USD", 1_000).await;
    let b = account(&engine, "alice", "B", "USD", 0).await;
    engine.archive_account(a, "alice").await.unwrap();
    engine.archive_account(b, "alice").await.unwrap();

    engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(b),
            400,
            "USD",
            day(2024, 3, 5),
        ))
        .await
        .unwrap();
    assert_eq!(account_balance(&engine, a).await, 600);
    assert_eq!(account_balance(&engine, b).await, 400);

    // New transactions on the archived account are still refused.
    let err = engine
        .create_transaction(debit(LedgerTarget::Account(a), 100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
}

#[tokio::test]
async fn create_then_delete_restores_balance() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 4_200).await;
    let card = engine
        .create_card(NewCardCmd::new("alice", "Visa", "USD"))
        .await
        .unwrap();

    for target in [LedgerTarget::Account(a), LedgerTarget::Card(card.id)] {
        for cmd in [debit(target, 1_234), credit(target, 99)] {
            let view = engine.create_transaction(cmd).await.unwrap();
            engine
                .delete_transaction(view.transaction.id, "alice")
                .await
                .unwrap();
        }
    }

    assert_eq!(account_balance(&engine, a).await, 4_200);
    assert_eq!(card_balance(&engine, card.id).await, 0);
}

#[tokio::test]
async fn update_matches_delete_and_recreate() {
    let (engine, _db) = engine_with_db().await;
    let updated_account = account(&engine, "alice", "Updated", "USD", 10_000).await;
    let recreated_account = account(&engine, "alice", "Recreated", "USD", 10_000).await;

    let original = engine
        .create_transaction(debit(LedgerTarget::Account(updated_account), 2_500))
        .await
        .unwrap();
    engine
        .update_transaction(
            original.transaction.id,
            "alice",
            UpdateTransactionCmd::default().amount(4_000),
        )
        .await
        .unwrap();

    let first = engine
        .create_transaction(debit(LedgerTarget::Account(recreated_account), 2_500))
        .await
        .unwrap();
    engine
        .delete_transaction(first.transaction.id, "alice")
        .await
        .unwrap();
    engine
        .create_transaction(debit(LedgerTarget::Account(recreated_account), 4_000))
        .await
        .unwrap();

    assert_eq!(
        account_balance(&engine, updated_account).await,
        account_balance(&engine, recreated_account).await
    );
    assert_eq!(account_balance(&engine, updated_account).await, 6_000);
}

#[tokio::test]
async fn card_purchases_grow_debt_and_payments_shrink_it() {
    let (engine, _db) = engine_with_db().await;
    let card = engine
        .create_card(NewCardCmd::new("alice", "Visa", "USD").credit_limit(100_000))
        .await
        .unwrap();
    let target = LedgerTarget::Card(card.id);

    engine.create_transaction(debit(target, 7_000)).await.unwrap();
    engine.create_transaction(credit(target, 2_000)).await.unwrap();

    assert_eq!(card_balance(&engine, card.id).await, 5_000);
    let audit = engine.card_balance_audit(card.id, "alice").await.unwrap();
    assert!(audit.is_consistent());
}

#[tokio::test]
async fn interleaved_writes_keep_stored_balance_equal_to_ledger() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "A", "USD", 50_000).await;
    let b = account(&engine, "alice", "B", "USD", 1_000).await;
    let card = engine
        .create_card(NewCardCmd::new("alice", "Visa", "USD"))
        .await
        .unwrap();

    let t1 = engine
        .create_transaction(debit(LedgerTarget::Account(a), 1_200))
        .await
        .unwrap();
    let t2 = engine
        .create_transaction(credit(LedgerTarget::Account(b), 800))
        .await
        .unwrap();
    let tr1 = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(b),
            5_000,
            "USD",
            day(2024, 3, 3),
        ))
        .await
        .unwrap();
    let tr2 = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            b,
            LedgerTarget::Card(card.id),
            300,
            "USD",
            day(2024, 3, 4),
        ))
        .await
        .unwrap();
    engine
        .create_transaction(debit(LedgerTarget::Card(card.id), 900))
        .await
        .unwrap();
    engine
        .update_transaction(
            t1.transaction.id,
            "alice",
            UpdateTransactionCmd::default().amount(700),
        )
        .await
        .unwrap();
    engine
        .update_transfer(tr1.id, "alice", UpdateTransferCmd::default().amount(4_000))
        .await
        .unwrap();
    engine
        .delete_transaction(t2.transaction.id, "alice")
        .await
        .unwrap();
    engine.delete_transfer(tr2.id, "alice").await.unwrap();

    assert_eq!(account_balance(&engine, a).await, 50_000 - 700 - 4_000);
    assert_eq!(account_balance(&engine, b).await, 1_000 + 4_000);
    assert_eq!(card_balance(&engine, card.id).await, 900);

    for id in [a, b] {
        let audit = engine.account_balance_audit(id, "alice").await.unwrap();
        assert!(audit.is_consistent(), "{audit:?}");
        assert_eq!(audit.settled_minor, audit.ledger_minor);
    }
    assert!(engine.reconcile_balances("alice", false).await.unwrap().is_empty());
}

#[tokio::test]
async fn both_or_neither_target_is_rejected_before_any_write() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 1_000).await;
    let card = engine
        .create_card(NewCardCmd::new("alice", "Visa", "USD"))
        .await
        .unwrap();

    assert!(matches!(
        LedgerTarget::from_pair(Some(a), Some(card.id)),
        Err(EngineError::OperationNotAllowed(_))
    ));
    assert!(matches!(
        LedgerTarget::from_pair(None, None),
        Err(EngineError::OperationNotAllowed(_))
    ));

    assert_eq!(account_balance(&engine, a).await, 1_000);
    assert_eq!(card_balance(&engine, card.id).await, 0);
    assert!(
        engine
            .list_transactions("alice", &Default::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn currency_mismatch_leaves_balance_untouched() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 1_000).await;

    let cmd = NewTransactionCmd::new(
        "alice",
        LedgerTarget::Account(a),
        EntryType::Debit,
        500,
        "EUR",
        day(2024, 3, 1),
    );
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(account_balance(&engine, a).await, 1_000);

    // Codes are compared verbatim, not case-folded.
    let cmd = NewTransactionCmd::new(
        "alice",
        LedgerTarget::Account(a),
        EntryType::Debit,
        500,
        "usd",
        day(2024, 3, 1),
    );
    let err = engine.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(account_balance(&engine, a).await, 1_000);
}

#[tokio::test]
async fn invalid_amounts_and_archived_targets_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 1_000).await;
    let target = LedgerTarget::Account(a);

    let err = engine.create_transaction(debit(target, 0)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let view = engine.create_transaction(debit(target, 100)).await.unwrap();
    let err = engine
        .update_transaction(
            view.transaction.id,
            "alice",
            UpdateTransactionCmd::default().amount(-5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine.archive_account(a, "alice").await.unwrap();
    let err = engine.create_transaction(debit(target, 100)).await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
    assert_eq!(account_balance(&engine, a).await, 900);
}

#[tokio::test]
async fn pending_transactions_move_balance_and_status_changes_do_not() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 10_000).await;
    let target = LedgerTarget::Account(a);

    let pending = engine
        .create_transaction(debit(target, 1_000).status(TransactionStatus::PendingApproval))
        .await
        .unwrap();
    assert_eq!(account_balance(&engine, a).await, 9_000);

    let rejected = engine
        .reject_transaction(pending.transaction.id, "alice")
        .await
        .unwrap();
    assert_eq!(rejected.transaction.status, TransactionStatus::Rejected);
    assert_eq!(account_balance(&engine, a).await, 9_000);

    let approved = engine.create_transaction(debit(target, 500)).await.unwrap();
    assert_eq!(approved.transaction.status, TransactionStatus::Approved);
    let cancelled = engine
        .cancel_transaction(approved.transaction.id, "alice")
        .await
        .unwrap();
    assert_eq!(cancelled.transaction.status, TransactionStatus::Cancelled);
    assert_eq!(account_balance(&engine, a).await, 8_500);

    // Rejected and cancelled rows still count in the ledger replay.
    let audit = engine.account_balance_audit(a, "alice").await.unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.settled_minor, 10_000);

    let err = engine
        .approve_transaction(pending.transaction.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationNotAllowed(_)));
}

#[tokio::test]
async fn other_users_see_not_found() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 1_000).await;
    let b = account(&engine, "alice", "Savings", "USD", 0).await;
    let view = engine
        .create_transaction(debit(LedgerTarget::Account(a), 100))
        .await
        .unwrap();
    let transfer = engine
        .create_transfer(NewTransferCmd::new(
            "alice",
            a,
            LedgerTarget::Account(b),
            100,
            "USD",
            day(2024, 3, 5),
        ))
        .await
        .unwrap();

    assert!(matches!(
        engine.account(a, "bob").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .update_transaction(
                view.transaction.id,
                "bob",
                UpdateTransactionCmd::default().amount(1)
            )
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_transaction(view.transaction.id, "bob").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_transfer(transfer.id, "bob").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .create_transaction(NewTransactionCmd::new(
                "bob",
                LedgerTarget::Account(a),
                EntryType::Credit,
                100,
                "USD",
                day(2024, 3, 1),
            ))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));

    assert_eq!(account_balance(&engine, a).await, 800);
    assert_eq!(account_balance(&engine, b).await, 100);
}

#[tokio::test]
async fn reconcile_reports_and_repairs_drift() {
    let (engine, db) = engine_with_db().await;
    let a = account(&engine, "alice", "Main", "USD", 1_000).await;
    engine
        .create_transaction(debit(LedgerTarget::Account(a), 250))
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET balance_minor = ? WHERE id = ?",
        vec![42_i64.into(), a.into()],
    ))
    .await
    .unwrap();

    let drifted = engine.reconcile_balances("alice", false).await.unwrap();
    assert_eq!(drifted.len(), 1);
    assert_eq!(drifted[0].target, LedgerTarget::Account(a));
    assert_eq!(drifted[0].stored_minor, 42);
    assert_eq!(drifted[0].ledger_minor, 750);
    assert_eq!(drifted[0].drift_minor(), 42 - 750);
    assert_eq!(account_balance(&engine, a).await, 42);

    engine.reconcile_balances("alice", true).await.unwrap();
    assert_eq!(account_balance(&engine, a).await, 750);
    assert!(engine.reconcile_balances("alice", false).await.unwrap().is_empty());
}
