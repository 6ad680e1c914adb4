//! SQLite table to CSV export.

use std::fs::File;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timestamp::normalize_timestamp;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to open metadata store {}: {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to read table '{table}': {source}")]
    Query {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Successful export results. `Empty` is not a failure, just nothing to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExportOutcome {
    Exported {
        path: PathBuf,
        rows: usize,
        columns: Vec<String>,
    },
    Empty,
}

/// Decides which columns hold millisecond-epoch timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateColumnRule {
    /// Column names ending in the given suffix
    Suffix(String),
    /// Treat no column as a date
    Disabled,
}

impl DateColumnRule {
    pub fn matches(&self, column: &str) -> bool {
        match self {
            DateColumnRule::Suffix(suffix) => column.ends_with(suffix.as_str()),
            DateColumnRule::Disabled => false,
        }
    }
}

/// Export every row of `table` in the store at `store_path` to `output_path`.
///
/// The output file is only created once a first row has been read, so an
/// empty or missing table leaves nothing behind. The connection is closed on
/// every path out of this function.
pub fn export_table(
    store_path: &Path,
    table: &str,
    output_path: &Path,
    date_columns: &DateColumnRule,
) -> Result<ExportOutcome, ExportError> {
    let conn = open_store(store_path)?;
    let result = write_table(&conn, table, output_path, date_columns);
    close_store(conn, store_path);

    if let Ok(ExportOutcome::Exported { rows, .. }) = &result {
        tracing::info!("Exported {} rows of '{}' to {}", rows, table, output_path.display());
    }
    result
}

fn open_store(path: &Path) -> Result<Connection, ExportError> {
    let open_err = |source| ExportError::StoreOpen {
        path: path.to_path_buf(),
        source,
    };

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(open_err)?;

    // SQLite opens lazily; touching the schema rejects non-database files here
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(open_err)?;

    Ok(conn)
}

fn close_store(conn: Connection, path: &Path) {
    if let Err((_conn, err)) = conn.close() {
        tracing::warn!("Failed to close metadata store {}: {}", path.display(), err);
    }
}

fn write_table(
    conn: &Connection,
    table: &str,
    output_path: &Path,
    date_columns: &DateColumnRule,
) -> Result<ExportOutcome, ExportError> {
    let query_err = |source| ExportError::Query {
        table: table.to_string(),
        source,
    };
    let write_err = |source| ExportError::Write {
        path: output_path.to_path_buf(),
        source,
    };

    if !table_exists(conn, table).map_err(query_err)? {
        tracing::info!("Table '{}' not found in metadata store", table);
        return Ok(ExportOutcome::Empty);
    }

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_identifier(table)))
        .map_err(query_err)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let date_mask: Vec<bool> = columns.iter().map(|c| date_columns.matches(c)).collect();

    let mut rows = stmt.query([]).map_err(query_err)?;
    let Some(first) = rows.next().map_err(query_err)? else {
        tracing::info!("No rows found in '{}'", table);
        return Ok(ExportOutcome::Empty);
    };

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(output_path)
        .map_err(write_err)?;
    writer.write_record(&columns).map_err(write_err)?;
    writer
        .write_record(render_row(first, &date_mask).map_err(query_err)?)
        .map_err(write_err)?;

    let mut exported = 1;
    while let Some(row) = rows.next().map_err(query_err)? {
        writer
            .write_record(render_row(row, &date_mask).map_err(query_err)?)
            .map_err(write_err)?;
        exported += 1;
    }
    finish(writer).map_err(write_err)?;

    Ok(ExportOutcome::Exported {
        path: output_path.to_path_buf(),
        rows: exported,
        columns,
    })
}

fn finish(mut writer: csv::Writer<File>) -> csv::Result<()> {
    writer.flush()?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
        params![table],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn render_row(row: &Row<'_>, date_mask: &[bool]) -> rusqlite::Result<Vec<String>> {
    date_mask
        .iter()
        .enumerate()
        .map(|(idx, &is_date)| {
            let value = row.get_ref(idx)?;
            Ok(if is_date {
                coerce_date_value(value).render()
            } else {
                render_value(value)
            })
        })
        .collect()
}

/// Integer view of a stored date value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    Millis(i64),
    /// Integral but too wide for i64, kept as canonical decimal digits
    Oversized(String),
    NotInteger,
}

impl DateValue {
    /// Oversized values cannot become a calendar instant and render raw.
    pub fn render(self) -> String {
        match self {
            DateValue::Millis(millis) => normalize_timestamp(Some(millis)),
            DateValue::Oversized(digits) => digits,
            DateValue::NotInteger => normalize_timestamp(None),
        }
    }
}

/// Best-effort integer view of a stored date value.
///
/// Reals truncate toward zero, text and blobs must hold an optionally signed
/// base-10 integer. Everything else is `NotInteger`, which normalizes to an
/// empty field.
pub fn coerce_date_value(value: ValueRef<'_>) -> DateValue {
    match value {
        ValueRef::Integer(i) => DateValue::Millis(i),
        ValueRef::Real(f) if f.is_finite() => {
            let truncated = f.trunc();
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                DateValue::Millis(truncated as i64)
            } else {
                DateValue::Oversized(format!("{:.0}", truncated))
            }
        }
        ValueRef::Real(_) | ValueRef::Null => DateValue::NotInteger,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .map(|s| parse_decimal(s.trim()))
            .unwrap_or(DateValue::NotInteger),
    }
}

fn parse_decimal(text: &str) -> DateValue {
    if let Ok(millis) = text.parse::<i64>() {
        return DateValue::Millis(millis);
    }

    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DateValue::NotInteger;
    }

    // Anything still failing i64 parsing has significant digits past the range
    let significant = digits.trim_start_matches('0');
    DateValue::Oversized(if negative {
        format!("-{}", significant)
    } else {
        significant.to_string()
    })
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => render_real(f),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => hex::encode(bytes),
    }
}

fn render_real(f: f64) -> String {
    let rendered = f.to_string();
    if f.is_finite() && !rendered.contains(['.', 'e']) {
        format!("{}.0", rendered)
    } else {
        rendered
    }
}
