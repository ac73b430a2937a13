use std::collections::BTreeMap;

use rusqlite::Connection;
use wikistore_core::db::migrations::latest_version;
use wikistore_core::db::open_db_in_memory;
use wikistore_core::{
    BagKey, Document, Persistence, SqliteTransactionRunner, StoreError, StoreResult,
    TransactionRunner,
};

fn runner() -> SqliteTransactionRunner {
    SqliteTransactionRunner::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn doc(title: &str, text: &str) -> Document {
    let mut fields = BTreeMap::new();
    fields.insert("text".to_string(), text.to_string());
    Document::with_fields(title, fields)
}

fn put(db: &dyn Persistence, bag: &BagKey, title: &str, text: &str) {
    let document = doc(title, text);
    let mut updater = move |_current: Option<Document>| -> StoreResult<Option<Document>> {
        Ok(Some(document.clone()))
    };
    db.compare_and_swap(bag, title, &mut updater, None).unwrap();
}

#[test]
fn runner_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteTransactionRunner::try_new(conn).unwrap_err();
    match err {
        StoreError::InvalidData(message) => assert!(message.contains("schema version")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn runner_rejects_connection_without_documents_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let err = SqliteTransactionRunner::try_new(conn).unwrap_err();
    match err {
        StoreError::InvalidData(message) => assert!(message.contains("documents")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_many_groups_records_in_supplied_bag_order() {
    let runner = runner();
    let first = BagKey::new("docs", "first");
    let second = BagKey::new("docs", "second");

    runner
        .run("tester", |db| {
            put(db, &second, "B1", "b");
            put(db, &second, "B2", "b");
            put(db, &first, "A1", "a");
            Ok(())
        })
        .unwrap();

    let records = runner
        .run("tester", |db| {
            db.read_many(&[first.clone(), second.clone()])
        })
        .unwrap();

    let bags: Vec<&str> = records.iter().map(|r| r.bag.bag.as_str()).collect();
    assert_eq!(bags, vec!["first", "second", "second"]);

    // Reversing the input reverses the grouping; nothing incidental about
    // the order.
    let records = runner
        .run("tester", |db| {
            db.read_many(&[second.clone(), first.clone()])
        })
        .unwrap();
    let bags: Vec<&str> = records.iter().map(|r| r.bag.bag.as_str()).collect();
    assert_eq!(bags, vec!["second", "second", "first"]);
}

#[test]
fn compare_and_swap_mints_a_fresh_revision_per_upsert() {
    let runner = runner();
    let bag = BagKey::new("docs", "user");

    let (first, second) = runner
        .run("tester", |db| {
            let document = doc("Index", "v1");
            let mut updater = |_current: Option<Document>| -> StoreResult<Option<Document>> {
                Ok(Some(document.clone()))
            };
            let first = db
                .compare_and_swap(&bag, "Index", &mut updater, None)?
                .expect("upsert returns a record");

            let document = doc("Index", "v2");
            let mut updater = |_current: Option<Document>| -> StoreResult<Option<Document>> {
                Ok(Some(document.clone()))
            };
            let second = db
                .compare_and_swap(&bag, "Index", &mut updater, None)?
                .expect("upsert returns a record");
            Ok((first, second))
        })
        .unwrap();

    assert_ne!(first.revision, second.revision);
}

#[test]
fn compare_and_swap_deletion_returns_no_record() {
    let runner = runner();
    let bag = BagKey::new("docs", "user");

    let removed = runner
        .run("tester", |db| {
            put(db, &bag, "Index", "v1");
            let mut updater = |_current: Option<Document>| -> StoreResult<Option<Document>> {
                Ok(None)
            };
            db.compare_and_swap(&bag, "Index", &mut updater, None)
        })
        .unwrap();
    assert!(removed.is_none());

    let remaining = runner
        .run("tester", |db| db.read_one(&bag, "Index"))
        .unwrap();
    assert!(remaining.is_none());
}

#[test]
fn failing_work_rolls_the_whole_transaction_back() {
    let runner = runner();
    let bag = BagKey::new("docs", "user");

    let err = runner
        .run("tester", |db| {
            put(db, &bag, "Index", "v1");
            Err::<(), _>(StoreError::BadRequest("abort after write".to_string()))
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::BadRequest(_)));

    // The write inside the failed scope never became visible.
    let record = runner
        .run("tester", |db| db.read_one(&bag, "Index"))
        .unwrap();
    assert!(record.is_none());
}

#[test]
fn updater_title_mismatch_is_rejected() {
    let runner = runner();
    let bag = BagKey::new("docs", "user");

    let err = runner
        .run("tester", |db| {
            let mut updater = |_current: Option<Document>| -> StoreResult<Option<Document>> {
                Ok(Some(doc("Other", "x")))
            };
            db.compare_and_swap(&bag, "Index", &mut updater, None)
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::InconsistentState(_)));
}

#[test]
fn corrupt_field_map_is_surfaced_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO documents (wiki, bag, title, fields, revision)
         VALUES ('docs', 'user', 'Broken', 'not-json', 'r1');",
        [],
    )
    .unwrap();
    let runner = SqliteTransactionRunner::try_new(conn).unwrap();

    let err = runner
        .run("tester", |db| db.read_one(&BagKey::new("docs", "user"), "Broken"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}
