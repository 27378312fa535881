//! Streaming XLSX writer
//!
//! This module produces the workbook package directly:
//! - XML is generated by hand into reusable buffers
//! - Each part is deflated into the archive as it is written
//! - Only a bounded window of rows per sheet stays in memory; older rows
//!   are compressed into an anonymous temp file until the sheet is closed

mod spill;
pub mod streaming_zip_writer;
pub mod styles;
pub mod workbook;
pub mod worksheet;
pub mod xml_writer;

pub use streaming_zip_writer::StreamingZipWriter;
pub use styles::{CellFormat, FontStyle, StyleSheet, DATE_FORMAT};
pub use workbook::{validate_sheet_name, StreamingWorkbook, MAX_SHEET_NAME_LEN};
pub use worksheet::{Worksheet, MAX_COLUMNS, MAX_ROWS};
pub use xml_writer::XmlWriter;
