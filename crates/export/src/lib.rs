//! Spreadsheet exports of count and receipt sessions.

pub mod csv_export;

pub use csv_export::{
    COUNT_HEADERS, ExportConfig, ExportError, RECEIPT_HEADERS, count_file_name, count_rows,
    format_time, receipt_file_name, receipt_rows, write_csv,
};
