//! Metadata store export against real SQLite fixtures

use drivefs_core::config::DEFAULT_EXPORT_FILE;
use drivefs_core::{
    export_table, run, DateColumnRule, ExportError, ExportOutcome, ExportStatus, RunConfig,
};
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

fn date_rule() -> DateColumnRule {
    DateColumnRule::Suffix("_date".to_string())
}

fn create_store(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE items (
            stable_id INTEGER PRIMARY KEY,
            local_title TEXT,
            created_date INTEGER,
            modified_date INTEGER,
            file_size INTEGER,
            is_folder INTEGER
        );
        "#,
    )
    .unwrap();
    conn
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[test]
fn test_date_columns_become_iso_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("metadata_sqlite_db");
    let conn = create_store(&store);
    conn.execute(
        "INSERT INTO items VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![1, "Quarterly report.docx", 1_700_000_000_000i64, 1_700_000_060_500i64, 20480, 0],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO items VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![2, "Photos", 0, 1_700_000_000_000i64, 0, 1],
    )
    .unwrap();
    drop(conn);

    let output = dir.path().join("items.csv");
    let outcome = export_table(&store, "items", &output, &date_rule()).unwrap();

    match outcome {
        ExportOutcome::Exported { rows, ref columns, .. } => {
            assert_eq!(rows, 2);
            assert_eq!(columns.len(), 6);
        }
        ExportOutcome::Empty => panic!("expected rows to be exported"),
    }

    let (headers, rows) = read_csv(&output);
    assert_eq!(
        headers,
        ["stable_id", "local_title", "created_date", "modified_date", "file_size", "is_folder"]
    );
    assert_eq!(
        rows[0],
        [
            "1",
            "Quarterly report.docx",
            "2023-11-14T22:13:20+00:00",
            "2023-11-14T22:14:20.500000+00:00",
            "20480",
            "0"
        ]
    );
    // Zero means "no timestamp", never the epoch and never "0"
    assert_eq!(rows[1][2], "");
    assert_eq!(rows[1][3], "2023-11-14T22:13:20+00:00");
    // Non-date columns keep their zeros
    assert_eq!(rows[1][4], "0");
}

#[test]
fn test_loosely_typed_date_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.db");
    let conn = Connection::open(&store).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE items (id INTEGER, viewed_date);
        INSERT INTO items VALUES (1, '1700000000000');
        INSERT INTO items VALUES (2, 1700000000000.0);
        INSERT INTO items VALUES (3, 'never');
        INSERT INTO items VALUES (4, NULL);
        "#,
    )
    .unwrap();
    drop(conn);

    let output = dir.path().join("out.csv");
    export_table(&store, "items", &output, &date_rule()).unwrap();

    let (_, rows) = read_csv(&output);
    let dates: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(
        dates,
        ["2023-11-14T22:13:20+00:00", "2023-11-14T22:13:20+00:00", "", ""]
    );
}

#[test]
fn test_integers_past_i64_render_as_decimal() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.db");
    let conn = Connection::open(&store).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE items (id INTEGER, a_date);
        INSERT INTO items VALUES (1, '99999999999999999999');
        INSERT INTO items VALUES (2, 1e30);
        INSERT INTO items VALUES (3, 9223372036854775807);
        "#,
    )
    .unwrap();
    drop(conn);

    let output = dir.path().join("out.csv");
    export_table(&store, "items", &output, &date_rule()).unwrap();

    let (_, rows) = read_csv(&output);
    let dates: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(
        dates,
        [
            "99999999999999999999",
            "1000000000000000019884624838656",
            "9223372036854775807"
        ]
    );
}

#[test]
fn test_fields_are_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.db");
    let conn = create_store(&store);
    conn.execute(
        "INSERT INTO items (stable_id, local_title) VALUES (?1, ?2)",
        params![7, "Budget, \"final\" v2.xlsx"],
    )
    .unwrap();
    drop(conn);

    let output = dir.path().join("out.csv");
    export_table(&store, "items", &output, &date_rule()).unwrap();

    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\"Budget, \"\"final\"\" v2.xlsx\""));
    let (_, rows) = read_csv(&output);
    assert_eq!(rows[0][1], "Budget, \"final\" v2.xlsx");
}

#[test]
fn test_empty_table_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.db");
    drop(create_store(&store));

    let output = dir.path().join("out.csv");
    let outcome = export_table(&store, "items", &output, &date_rule()).unwrap();

    assert_eq!(outcome, ExportOutcome::Empty);
    assert!(!output.exists());
}

#[test]
fn test_missing_table_is_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.db");
    let conn = Connection::open(&store).unwrap();
    conn.execute_batch("CREATE TABLE stable_parents (item_stable_id INTEGER);")
        .unwrap();
    drop(conn);

    let output = dir.path().join("out.csv");
    let outcome = export_table(&store, "items", &output, &date_rule()).unwrap();

    assert_eq!(outcome, ExportOutcome::Empty);
    assert!(!output.exists());
}

#[test]
fn test_unreadable_table_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.db");
    let conn = Connection::open(&store).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE t (x);
        CREATE VIEW items AS SELECT * FROM t;
        DROP TABLE t;
        "#,
    )
    .unwrap();
    drop(conn);

    let output = dir.path().join("out.csv");
    let err = export_table(&store, "items", &output, &date_rule()).unwrap_err();

    assert!(matches!(err, ExportError::Query { .. }));
    assert!(!output.exists());
}

#[test]
fn test_invalid_store_is_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("not_a_db");
    fs::write(&store, "not sqlite, just plain text\n".repeat(200)).unwrap();

    let output = dir.path().join("out.csv");
    let err = export_table(&store, "items", &output, &date_rule()).unwrap_err();

    assert!(matches!(err, ExportError::StoreOpen { .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_store_is_open_error_and_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("absent.db");

    let err = export_table(&store, "items", &dir.path().join("out.csv"), &date_rule()).unwrap_err();

    assert!(matches!(err, ExportError::StoreOpen { .. }));
    assert!(!store.exists());
}

#[test]
fn test_run_continues_after_export_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("content_cache");
    let out = dir.path().join("out");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("99"), b"%PDF-1.3").unwrap();

    let config = RunConfig::new(&cache, &out).with_metadata_store(dir.path().join("absent.db"));
    let summary = run(&config).unwrap();

    assert!(matches!(summary.export, ExportStatus::Failed { .. }));
    assert_eq!(summary.statistics.files_recovered, 1);
    assert!(out.join("99.pdf").exists());
    assert!(summary.report_path.exists());
}

#[test]
fn test_run_exports_into_destination() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("content_cache");
    let out = dir.path().join("out");
    fs::create_dir_all(&cache).unwrap();
    let store = dir.path().join("metadata_sqlite_db");
    let conn = create_store(&store);
    conn.execute(
        "INSERT INTO items (stable_id, created_date) VALUES (?1, ?2)",
        params![1, 1_700_000_000_000i64],
    )
    .unwrap();
    drop(conn);

    let summary = run(&RunConfig::new(&cache, &out).with_metadata_store(&store)).unwrap();

    let expected = out.join(DEFAULT_EXPORT_FILE);
    assert_eq!(
        summary.export,
        ExportStatus::Exported {
            path: expected.clone(),
            rows: 1
        }
    );
    let (_, rows) = read_csv(&expected);
    assert_eq!(rows[0][2], "2023-11-14T22:13:20+00:00");
}

#[test]
fn test_run_reports_nothing_exported_for_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("content_cache");
    let out = dir.path().join("out");
    fs::create_dir_all(&cache).unwrap();
    let store = dir.path().join("metadata_sqlite_db");
    drop(create_store(&store));

    let summary = run(&RunConfig::new(&cache, &out).with_metadata_store(&store)).unwrap();

    assert_eq!(summary.export, ExportStatus::NothingExported);
    assert!(!out.join(DEFAULT_EXPORT_FILE).exists());
}
