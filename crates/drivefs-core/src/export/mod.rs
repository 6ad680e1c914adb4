//! Metadata store export
//!
//! Dumps one table of the DriveFS metadata database to CSV, rendering every
//! date-like column as an ISO-8601 UTC timestamp.

pub mod table;
pub mod timestamp;

pub use table::{
    coerce_date_value, export_table, DateColumnRule, DateValue, ExportError, ExportOutcome,
};
pub use timestamp::{format_epoch_millis, normalize_timestamp};
