use serde::{Deserialize, Serialize};
use vpcwatch_core::ResultRow;

/// Execution metadata for an Athena query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Athena query execution ID.
    pub query_id: String,
    /// Total bytes scanned during execution.
    pub bytes_scanned: u64,
    /// Engine execution time in milliseconds.
    pub execution_time_ms: u64,
    /// S3 output location where results were written, if available.
    pub output_location: Option<String>,
}

/// Athena pricing: $5 per TB scanned.
const DOLLARS_PER_BYTE: f64 = 5.0 / (1024.0 * 1024.0 * 1024.0 * 1024.0);

impl QueryMetadata {
    /// Estimates the query cost in USD based on Athena's $5/TB pricing model.
    pub fn cost_estimate_usd(&self) -> f64 {
        self.bytes_scanned as f64 * DOLLARS_PER_BYTE
    }
}

/// Rows exactly as Athena returns them for a SELECT.
///
/// Row 0 is the header (column names); rows 1..N are data. `None` is a
/// cell without a value (SQL NULL).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResultSet {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawResultSet {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Number of data rows (header excluded).
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// Zip every data row against the header row.
///
/// Returns `None` when there are no data rows (empty or header-only), so a
/// returned vector is never empty. The header's column order is kept; cells
/// that are missing or NULL become `""`, and cells past the header's width
/// are dropped, so every row carries exactly the header's key set.
pub fn materialize(raw: RawResultSet) -> Option<Vec<ResultRow>> {
    if raw.rows.len() <= 1 {
        return None;
    }

    let mut rows = raw.rows.into_iter();
    let header: Vec<String> = rows
        .next()?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();

    let records = rows
        .map(|cells| {
            let mut cells = cells.into_iter();
            header
                .iter()
                .map(|column| {
                    let value = cells.next().flatten().unwrap_or_default();
                    (column.clone(), value)
                })
                .collect::<ResultRow>()
        })
        .collect();

    Some(records)
}
