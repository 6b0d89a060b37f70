//! Pipeline error types.
//!
//! Configuration problems in the input tables are fatal and surface before
//! the pipeline runs. Cell-level data quality issues are never errors: they
//! are logged and the cell is treated as missing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProlongError {
    #[error("Column not found in {table} table: expected {expected}. Available columns: {available:?}")]
    ColumnNotFound {
        table: &'static str,
        expected: String,
        available: Vec<String>,
    },

    #[error("No month columns in the shipment table (expected headers like 'Январь 2023'). Available columns: {available:?}")]
    NoMonthColumns { available: Vec<String> },

    #[error("Failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No reporting year given and none derivable from the shipment table")]
    UnresolvedReportingYear,
}

impl ProlongError {
    /// True for errors caused by the shape of the input tables rather than
    /// by reading them.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProlongError::ColumnNotFound { .. }
                | ProlongError::NoMonthColumns { .. }
                | ProlongError::UnresolvedReportingYear
        )
    }
}

/// Result type alias for table loading, normalization and reporting.
pub type ProlongResult<T> = Result<T, ProlongError>;
