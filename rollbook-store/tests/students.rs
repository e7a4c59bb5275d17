//! Record store integration tests against a real PostgreSQL server.
//!
//! Run with: ROLLBOOK_DB_PASSWORD=... cargo test -p rollbook-store -- --ignored
//! Each test works inside its own throwaway schema.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rollbook_store::{
    with_store, DatabaseConfig, NewStudent, RecordStore, SqlParam, StoreError, Student,
};

fn test_config() -> DatabaseConfig {
    DatabaseConfig::default()
        .with_env_overrides()
        .expect("ROLLBOOK_DB_* settings should be valid")
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn john() -> NewStudent {
    NewStudent::new("John", "Doe", "john.doe@example.com", date(2023, 9, 1))
}

fn jane() -> NewStudent {
    NewStudent::new("Jane", "Smith", "jane.smith@example.com", date(2023, 9, 1))
}

/// Connected store whose search_path points at a fresh, empty schema
struct Scratch {
    store: RecordStore,
    schema: String,
}

impl Scratch {
    async fn new() -> Self {
        let mut store = RecordStore::open(test_config())
            .await
            .expect("connection failed");
        let schema = format!("rollbook_test_{}", uuid::Uuid::new_v4().simple());

        store
            .run(&format!("CREATE SCHEMA {}", schema), &[])
            .await
            .expect("create schema failed");
        store
            .run(&format!("SET search_path TO {}", schema), &[])
            .await
            .expect("set search_path failed");
        store.create_schema().await.expect("create table failed");

        Self { store, schema }
    }

    async fn finish(mut self) {
        self.store
            .run(&format!("DROP SCHEMA {} CASCADE", self.schema), &[])
            .await
            .expect("drop schema failed");
        self.store.disconnect().await.expect("disconnect failed");
        assert!(!self.store.is_connected());
    }
}

fn find(students: &[Student], id: i32) -> Option<&Student> {
    students.iter().find(|s| s.student_id == id)
}

#[tokio::test]
#[ignore = "requires database"]
async fn add_assigns_id_and_lists_row() {
    let mut db = Scratch::new().await;

    let stored = db.store.add(&john()).await.unwrap();
    assert_eq!(stored.email, "john.doe@example.com");

    let all = db.store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], stored);
    assert_eq!(all[0].enrollment_date, date(2023, 9, 1));

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_email_is_rejected() {
    let mut db = Scratch::new().await;

    db.store.add(&john()).await.unwrap();
    let dup = NewStudent::new("Johnny", "Dough", "john.doe@example.com", None);

    let err = db.store.add(&dup).await.unwrap_err();
    assert!(matches!(err, StoreError::Query { .. }));
    assert!(err.is_unique_violation());

    // Store stays usable after a failed statement
    assert_eq!(db.store.list_all().await.unwrap().len(), 1);

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_email_touches_only_target_row() {
    let mut db = Scratch::new().await;

    let a = db.store.add(&john()).await.unwrap();
    let b = db.store.add(&jane()).await.unwrap();

    assert_eq!(db.store.update_email(a.student_id, "updated@email.com").await.unwrap(), 1);
    // Same value again is harmless
    assert_eq!(db.store.update_email(a.student_id, "updated@email.com").await.unwrap(), 1);

    let all = db.store.list_all().await.unwrap();
    let updated = find(&all, a.student_id).unwrap();
    assert_eq!(updated.email, "updated@email.com");
    assert_eq!(updated.first_name, a.first_name);
    assert_eq!(updated.last_name, a.last_name);
    assert_eq!(updated.enrollment_date, a.enrollment_date);
    assert_eq!(find(&all, b.student_id), Some(&b));

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_and_remove_unknown_id_affect_nothing() {
    let mut db = Scratch::new().await;

    let a = db.store.add(&john()).await.unwrap();
    let before = db.store.list_all().await.unwrap();

    assert_eq!(db.store.update_email(9999, "ghost@example.com").await.unwrap(), 0);
    assert_eq!(db.store.remove(9999).await.unwrap(), 0);

    let after = db.store.list_all().await.unwrap();
    assert_eq!(before, after);
    assert_eq!(find(&after, a.student_id), Some(&a));

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn remove_deletes_exactly_one_row() {
    let mut db = Scratch::new().await;

    let a = db.store.add(&john()).await.unwrap();
    let b = db.store.add(&jane()).await.unwrap();

    assert_eq!(db.store.remove(a.student_id).await.unwrap(), 1);

    let all = db.store.list_all().await.unwrap();
    assert_eq!(all, vec![b]);

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn add_update_remove_scenario() {
    let mut db = Scratch::new().await;

    db.store.add(&john()).await.unwrap();
    let all = db.store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].student_id, 1);
    assert_eq!(all[0].first_name, "John");
    assert_eq!(all[0].last_name, "Doe");

    db.store.update_email(1, "updated@email.com").await.unwrap();
    let all = db.store.list_all().await.unwrap();
    assert_eq!(all[0].email, "updated@email.com");

    db.store.remove(1).await.unwrap();
    assert!(db.store.list_all().await.unwrap().is_empty());

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn seed_is_all_or_nothing() {
    let mut db = Scratch::new().await;

    assert_eq!(db.store.seed_demo().await.unwrap(), 3);
    let err = db.store.seed_demo().await.unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(db.store.list_all().await.unwrap().len(), 3);

    // Idempotent table creation
    db.store.create_schema().await.unwrap();

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn run_decodes_rows_and_counts_changes() {
    let mut db = Scratch::new().await;
    db.store.seed_demo().await.unwrap();

    let set = db
        .store
        .run(
            "SELECT student_id, email, enrollment_date FROM students WHERE enrollment_date = $1 ORDER BY student_id",
            &[SqlParam::Date(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap())],
        )
        .await
        .unwrap();
    assert_eq!(set.columns, vec!["student_id", "email", "enrollment_date"]);
    assert_eq!(set.rows.len(), 2);
    assert_eq!(set.rows[0][1], "john.doe@example.com");
    assert_eq!(set.rows[0][2], "2023-09-01");

    let set = db
        .store
        .run(
            "UPDATE students SET enrollment_date = NULL WHERE last_name = $1",
            &[SqlParam::from("Beam")],
        )
        .await
        .unwrap();
    assert!(set.is_empty());
    assert_eq!(set.rows_affected, 1);

    let err = db.store.run("SELEKT nonsense", &[]).await.unwrap_err();
    assert!(matches!(err, StoreError::Query { .. }));
    assert!(!err.is_unique_violation());

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn run_names_columns_of_empty_select() {
    let mut db = Scratch::new().await;

    let set = db.store.run("SELECT 1 AS one WHERE false", &[]).await.unwrap();
    assert_eq!(set.columns, vec!["one"]);
    assert!(set.rows.is_empty());

    let set = db
        .store
        .run(
            "SELECT student_id, email FROM students WHERE email = $1",
            &[SqlParam::from("nobody@example.com")],
        )
        .await
        .unwrap();
    assert_eq!(set.columns, vec!["student_id", "email"]);
    assert!(set.is_empty());

    let set = db
        .store
        .run("DELETE FROM students WHERE student_id = $1", &[SqlParam::Int(99)])
        .await
        .unwrap();
    assert!(set.columns.is_empty());
    assert_eq!(set.rows_affected, 0);

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn run_keeps_non_canonical_integers_as_text() {
    let mut db = Scratch::new().await;

    let set = db
        .store
        .run("SELECT $1::text AS code", &["007".parse::<SqlParam>().unwrap()])
        .await
        .unwrap();
    assert_eq!(set.rows[0][0], "007");

    db.finish().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn with_store_closes_connection_after_failing_closure() {
    let mut observer = RecordStore::open(test_config()).await.unwrap();
    let backend = Arc::new(AtomicI64::new(0));

    let seen = Arc::clone(&backend);
    let result: Result<(), StoreError> = with_store(test_config(), move |store| {
        Box::pin(async move {
            let set = store.run("SELECT pg_backend_pid() AS pid", &[]).await?;
            seen.store(set.rows[0][0].as_i64().unwrap_or_default(), Ordering::SeqCst);
            store.run("SELECT * FROM no_such_table_here", &[]).await?;
            Ok(())
        })
    })
    .await;
    assert!(matches!(result, Err(StoreError::Query { .. })));

    let pid = backend.load(Ordering::SeqCst);
    assert!(pid > 0, "closure never reported its backend");

    // The server drops the backend shortly after the client terminates
    let mut remaining = -1;
    for _ in 0..50 {
        let set = observer
            .run(
                "SELECT count(*) AS n FROM pg_stat_activity WHERE pid = $1",
                &[SqlParam::Int(pid)],
            )
            .await
            .unwrap();
        remaining = set.rows[0][0].as_i64().unwrap_or(-1);
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(remaining, 0, "backend {pid} still open after with_store");

    observer.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore = "requires database"]
async fn with_store_returns_closure_error() {
    let result: Result<i64, StoreError> = with_store(test_config(), |store| {
        Box::pin(async move {
            store.run("SELECT 1 AS one", &[]).await?;
            store.run("SELECT * FROM no_such_table_here", &[]).await?;
            Ok(1)
        })
    })
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, StoreError::Query { .. }));
}

#[tokio::test]
#[ignore = "requires database"]
async fn with_store_returns_closure_value() {
    let value = with_store(test_config(), |store| {
        Box::pin(async move {
            let set = store.run("SELECT $1::int8 AS n", &[SqlParam::Int(42)]).await?;
            Ok::<_, StoreError>(set.rows[0][0].clone())
        })
    })
    .await
    .unwrap();

    assert_eq!(value, 42);
}
