//! Error types for the queryexcel library

use thiserror::Error;

/// Result type alias for queryexcel operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Boxed error carried by query failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal errors. Anything that ends up here aborts the whole export.
///
/// Recoverable problems (parameter mismatches, bad hyperlink candidates) are
/// reported as [`ExportWarning`](crate::report::ExportWarning) instead.
#[derive(Error, Debug)]
pub enum ExcelError {
    /// The query collaborator failed while executing a statement
    #[error("Query '{sql}' failed: {source}")]
    QueryError {
        sql: String,
        #[source]
        source: BoxError,
    },

    /// A typed getter on the current cursor row failed
    #[error("Cursor error: {0}")]
    CursorError(String),

    /// Error occurred while writing the workbook
    #[error("Failed to write Excel file: {0}")]
    WriteError(String),

    /// Sheet name rejected by the spreadsheet rules
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    /// A row was requested at or below an index that was already created
    #[error("Row {row} of sheet '{sheet}' is out of order (last created row is {last})")]
    RowOutOfOrder { sheet: String, row: u32, last: u32 },

    /// Excel grid limits (rows/columns) exceeded
    #[error("Excel limit exceeded: {0}")]
    LimitExceeded(String),

    /// Fatal failure while exporting a specific tab
    #[error("Failed to export tab '{tab}': {source}")]
    TabError {
        tab: String,
        #[source]
        source: Box<ExcelError>,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExcelError {
    /// Wrap a collaborator failure with the SQL text it happened on
    pub fn query<E>(sql: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        ExcelError::QueryError {
            sql: sql.to_string(),
            source: source.into(),
        }
    }

    /// Attach the tab name to a fatal failure
    pub fn in_tab(self, tab: &str) -> Self {
        ExcelError::TabError {
            tab: tab.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_names_sql() {
        let err = ExcelError::query("SELECT 1", "connection reset");
        assert_eq!(
            err.to_string(),
            "Query 'SELECT 1' failed: connection reset"
        );
    }

    #[test]
    fn test_tab_error_keeps_source() {
        let err = ExcelError::WriteError("disk full".to_string()).in_tab("Orders");
        assert_eq!(
            err.to_string(),
            "Failed to export tab 'Orders': Failed to write Excel file: disk full"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
