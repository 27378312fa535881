//! Export outcome: produced bytes plus recoverable problems

use std::fmt;

/// A recoverable problem; the export carried on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// Placeholder count of a tab's SQL differs from its parameter count;
    /// the tab was not queried and its sheet is empty
    ParameterCountMismatch {
        tab: String,
        required: usize,
        given: usize,
    },
    /// A string looked like a link but is not a valid URI; written as plain text
    MalformedHyperlink { value: String, reason: String },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::ParameterCountMismatch {
                tab,
                required,
                given,
            } => write!(
                f,
                "Tab '{}' requires {} parameters but {} were given, tab skipped",
                tab, required, given
            ),
            ExportWarning::MalformedHyperlink { value, reason } => write!(
                f,
                "'{}' is not a valid URI ({}), cell is not marked as hyperlink",
                value, reason
            ),
        }
    }
}

/// Per-sheet statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    pub name: String,
    /// Result rows written (header and hint rows excluded)
    pub rows: usize,
    /// The tab was not queried because of a parameter mismatch
    pub skipped: bool,
}

/// Result of [`ExcelWriter::export_with_report`](crate::writer::ExcelWriter::export_with_report)
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// The `.xlsx` file content
    pub bytes: Vec<u8>,
    pub warnings: Vec<ExportWarning>,
    pub sheets: Vec<SheetReport>,
}

impl ExportReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Total result rows over all sheets
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows).sum()
    }
}
