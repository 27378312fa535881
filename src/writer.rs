//! Export entry points: tabs in, `.xlsx` bytes out
//!
//! Each tab's query is streamed straight into its sheet. Only the row
//! window of the sheet being written is held in memory; everything else is
//! already compressed, either into the archive or into the sheet's spill.

use crate::cell_writer::CellWriterRegistry;
use crate::config::ExportOptions;
use crate::consumer::RowStreamingConsumer;
use crate::cursor::QueryExecutor;
use crate::error::Result;
use crate::fast_writer::StreamingWorkbook;
use crate::report::{ExportReport, ExportWarning, SheetReport};
use crate::tab::Tab;
use indexmap::IndexMap;

/// Exports query results into workbooks
///
/// # Examples
///
/// ```
/// use queryexcel::cursor::memory::{MemoryExecutor, ResultSet};
/// use queryexcel::types::SqlType;
/// use queryexcel::{ExcelWriter, Tab};
///
/// let mut executor = MemoryExecutor::new();
/// executor.register(
///     "SELECT name FROM customers",
///     ResultSet::new()
///         .column("name", SqlType::VARCHAR)
///         .row(["Alice"])
///         .row(["Bob"]),
/// );
///
/// let mut writer = ExcelWriter::new(executor);
/// let bytes = writer.create_excel(&Tab::of_sql("SELECT name FROM customers"))?;
/// assert!(bytes.starts_with(b"PK"));
/// # Ok::<(), queryexcel::ExcelError>(())
/// ```
pub struct ExcelWriter<E: QueryExecutor> {
    executor: E,
    replacements: IndexMap<String, String>,
}

impl<E: QueryExecutor> ExcelWriter<E> {
    pub fn new(executor: E) -> Self {
        ExcelWriter {
            executor,
            replacements: IndexMap::new(),
        }
    }

    /// `{key}` templates replaced in string cells, applied in the given order
    pub fn with_replacements<I, K, V>(mut self, replacements: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.replacements = replacements
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Export one tab with default options
    pub fn create_excel(&mut self, tab: &Tab) -> Result<Vec<u8>> {
        self.create_excel_with_options(tab, &ExportOptions::default())
    }

    pub fn create_excel_with_options(
        &mut self,
        tab: &Tab,
        options: &ExportOptions,
    ) -> Result<Vec<u8>> {
        self.export(std::slice::from_ref(tab), options)
    }

    /// Export tabs, one sheet each, in the given order
    pub fn export(&mut self, tabs: &[Tab], options: &ExportOptions) -> Result<Vec<u8>> {
        self.export_with_report(tabs, options).map(|report| report.bytes)
    }

    /// Like [`export`](Self::export), also returning warnings and per-sheet
    /// row counts
    pub fn export_with_report(
        &mut self,
        tabs: &[Tab],
        options: &ExportOptions,
    ) -> Result<ExportReport> {
        let mut workbook =
            StreamingWorkbook::new(options.rows_in_memory, options.compression_level);
        let registry = CellWriterRegistry::new(options, self.replacements.clone());
        let mut warnings = Vec::new();
        let mut sheets = Vec::with_capacity(tabs.len());

        for tab in tabs {
            let sheet = self
                .export_tab(&mut workbook, &registry, tab, &mut warnings)
                .map_err(|e| e.in_tab(&tab.name))?;
            sheets.push(sheet);
        }

        let bytes = workbook.into_bytes()?;
        log::info!(
            "Exported {} tabs into {} bytes ({} warnings)",
            sheets.len(),
            bytes.len(),
            warnings.len()
        );
        Ok(ExportReport {
            bytes,
            warnings,
            sheets,
        })
    }

    fn export_tab(
        &mut self,
        workbook: &mut StreamingWorkbook,
        registry: &CellWriterRegistry,
        tab: &Tab,
        warnings: &mut Vec<ExportWarning>,
    ) -> Result<SheetReport> {
        let sheet = workbook.create_sheet(&tab.name)?;

        let required = tab.placeholder_count();
        let given = tab.parameters.len();
        if required != given {
            log::warn!(
                "Tab '{}' requires {} parameters but {} were given, skipping tab",
                tab.name,
                required,
                given
            );
            warnings.push(ExportWarning::ParameterCountMismatch {
                tab: tab.name.clone(),
                required,
                given,
            });
            workbook.finish_sheet(sheet)?;
            return Ok(SheetReport {
                name: tab.name.clone(),
                rows: 0,
                skipped: true,
            });
        }

        log::info!("Adding tab '{}' for query '{}'", tab.name, tab.sql);
        let mut consumer =
            RowStreamingConsumer::new(sheet, registry, workbook.styles_mut(), warnings);
        if let Some(hint) = tab.hint.as_deref() {
            consumer.write_hint(hint)?;
        }
        self.executor
            .execute(&tab.sql, &tab.parameters, &mut |row| consumer.on_row(row))?;

        let rows = consumer.rows();
        let sheet = consumer.into_sheet();
        workbook.finish_sheet(sheet)?;
        Ok(SheetReport {
            name: tab.name.clone(),
            rows,
            skipped: false,
        })
    }
}
