//! Durable-backend integration: the same pipeline against SQLite on disk,
//! including persistence across a reopen.

use meetsink::aggregate::{COL_VALUE, ROW_TOTAL, ROW_WORDS};
use meetsink::config::TableNames;
use meetsink::ingest::IngestService;
use meetsink::store::{Cell, SqliteStore, Table, TableStore};
use serde_json::json;
use std::sync::Arc;

#[test]
fn ingest_through_sqlite_backend() {
    let store = SqliteStore::open_in_memory().unwrap();
    let service = IngestService::new(Arc::new(store), TableNames::default());

    let response = service.ingest(
        &json!({
            "source": "PWA Meeting Recorder",
            "fileName": "q3-review.webm",
            "fullTranscript": "hello world",
        })
        .to_string(),
    );
    assert!(response.is_success());
    assert_eq!(response.sheet_url.as_deref(), Some("sqlite://:memory:"));

    let meeting = service.store().open_table("meeting_records").unwrap();
    assert_eq!(meeting.row_count().unwrap(), 2);
    assert_eq!(
        meeting.read_cell(1, 1).unwrap(),
        Some(Cell::from("q3-review.webm"))
    );
    assert_eq!(meeting.read_cell(1, 10).unwrap(), Some(Cell::Int(11)));
}

#[test]
fn records_and_ledger_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("records.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        let service = IngestService::new(Arc::new(store), TableNames::default());
        for text in ["abc", "de"] {
            let response = service.ingest(
                &json!({
                    "source": "PWA Meeting Recorder",
                    "fullTranscript": text,
                })
                .to_string(),
            );
            assert!(response.is_success());
        }
    }

    let store = SqliteStore::open(&db_path).unwrap();
    let meeting = store.open_table("meeting_records").unwrap();
    assert_eq!(meeting.row_count().unwrap(), 3);

    let ledger = store.open_table("aggregate_ledger").unwrap();
    assert_eq!(
        ledger.read_cell(ROW_TOTAL, COL_VALUE).unwrap(),
        Some(Cell::Int(2))
    );
    assert_eq!(
        ledger.read_cell(ROW_WORDS, COL_VALUE).unwrap(),
        Some(Cell::Int(5))
    );
}

#[test]
fn reopened_table_appends_after_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("records.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        let service = IngestService::new(Arc::new(store), TableNames::default());
        service.ingest(&json!({"marker": "first"}).to_string());
    }

    let store = SqliteStore::open(&db_path).unwrap();
    let service = IngestService::new(Arc::new(store), TableNames::default());
    service.ingest(&json!({"marker": "second"}).to_string());

    let generic = service.store().open_table("generic_records").unwrap();
    assert_eq!(generic.row_count().unwrap(), 3);

    let first = generic.read_cell(1, 1).unwrap().unwrap().as_text();
    let second = generic.read_cell(2, 1).unwrap().unwrap().as_text();
    assert!(first.contains("first"));
    assert!(second.contains("second"));
}
