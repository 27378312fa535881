//! # queryexcel
//!
//! Stream forward-only SQL cursors into XLSX workbooks, one sheet per tab.
//!
//! ## Features
//!
//! - **Bounded Memory**: Each sheet keeps a fixed window of rows in memory (500 by
//!   default); older rows are compressed into a temp file until the sheet is closed
//! - **Type Dispatch**: Cells are written by the column's declared SQL type
//!   (text, date, number, decimal, boolean, anything else as text)
//! - **Column Sizing**: Widths are estimated from rendered character counts,
//!   no font measurement needed
//! - **Templates & Links**: `{key}` replacements in text cells and optional
//!   hyperlink detection for `http` values
//! - **Hint Rows**: An emphasized note line above a tab's data
//! - **Pluggable Cursor**: Anything implementing [`QueryExecutor`] can feed an
//!   export; an in-memory executor and a PostgreSQL one (feature `postgres`)
//!   are included
//!
//! ## Quick Start
//!
//! ```rust
//! use queryexcel::cursor::memory::{MemoryExecutor, ResultSet, SqlValue};
//! use queryexcel::types::SqlType;
//! use queryexcel::{ExcelWriter, ExportOptions, Tab};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut executor = MemoryExecutor::new();
//! executor.register(
//!     "SELECT name, homepage FROM vendors WHERE active = ?",
//!     ResultSet::new()
//!         .column("name", SqlType::VARCHAR)
//!         .column("homepage", SqlType::VARCHAR)
//!         .row([SqlValue::from("ACME"), SqlValue::from("https://acme.example/")]),
//! );
//!
//! let tabs = [Tab::new("Vendors", "SELECT name, homepage FROM vendors WHERE active = ?")
//!     .with_parameter(true)
//!     .with_hint("Active vendors only")];
//!
//! let mut writer = ExcelWriter::new(executor);
//! let bytes = writer.export(&tabs, &ExportOptions::new().with_auto_hyperlinks(true))?;
//! std::fs::write(std::env::temp_dir().join("vendors.xlsx"), bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod cell_writer;
pub mod config;
pub mod consumer;
pub mod cursor;
pub mod error;
pub mod fast_writer;
pub mod report;
pub mod tab;
pub mod types;
pub mod width;
pub mod writer;

pub use config::{DecimalMode, ExportOptions, MemoryProfile};
pub use cursor::{CursorRow, QueryExecutor, SqlParam};
pub use error::{ExcelError, Result};
pub use report::{ExportReport, ExportWarning, SheetReport};
pub use tab::Tab;
pub use types::{Cell, CellValue, Row, SqlType, StyleId, ValueKind};
pub use writer::ExcelWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::memory::MemoryExecutor;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ExcelError>;
        let _ = std::marker::PhantomData::<ExcelWriter<MemoryExecutor>>;
        let _ = std::marker::PhantomData::<ExportReport>;
    }
}
