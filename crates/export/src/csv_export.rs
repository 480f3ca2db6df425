use chrono::{DateTime, FixedOffset, Offset, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use stockscan_core::OperatorName;
use stockscan_counting::CountRecord;
use stockscan_receiving::ReceiptEntry;

pub const COUNT_HEADERS: [&str; 7] = [
    "Reference",
    "Nom",
    "Stock Theorique",
    "Stock Reel",
    "Ecart",
    "Heure",
    "Operateur",
];

pub const RECEIPT_HEADERS: [&str; 5] = ["Reference", "Nom", "Quantite Ajoutee", "Heure", "Operateur"];

/// Spreadsheet tools need the byte-order mark to detect UTF-8 accents.
const BOM: &str = "\u{FEFF}";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv flush failed: {0}")]
    Flush(String),
}

/// Rendering options for exported rows.
#[derive(Debug, Clone, Copy)]
pub struct ExportConfig {
    /// Offset applied to timestamps before rendering `HH:MM`.
    pub offset: FixedOffset,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl ExportConfig {
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }
}

pub fn format_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%H:%M").to_string()
}

pub fn count_rows(records: &[CountRecord], config: &ExportConfig) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|r| {
            vec![
                r.sku.to_string(),
                r.name.clone(),
                r.theoretical_qty.to_string(),
                r.counted_qty.to_string(),
                r.gap.to_string(),
                format_time(r.recorded_at, config.offset),
                r.operator.to_string(),
            ]
        })
        .collect()
}

pub fn receipt_rows(entries: &[ReceiptEntry], config: &ExportConfig) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|e| {
            vec![
                e.sku.to_string(),
                e.name.clone(),
                e.qty.to_string(),
                format_time(e.recorded_at, config.offset),
                e.operator.to_string(),
            ]
        })
        .collect()
}

/// Render a semicolon-separated file with a leading BOM.
///
/// Fields are quoted only when they contain a separator, quote or line break.
pub fn write_csv(headers: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BOM.as_bytes().to_vec());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))
}

pub fn count_file_name(at: DateTime<Utc>) -> String {
    format!("inventaire_{}.csv", at.format("%Y-%m-%d"))
}

pub fn receipt_file_name(operator: &OperatorName, at: DateTime<Utc>) -> String {
    let operator: String = operator
        .or_anonymous()
        .as_str()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("reception_{operator}_{}.csv", at.format("%Y-%m-%d"))
}
