//! Row streaming consumer: cursor rows into sheet rows
//!
//! The first cursor row also produces the header from the column labels.
//! Widths of everything written are accumulated and applied to the sheet
//! when the cursor reports its last row.

use crate::cell_writer::{CellWriter, CellWriterRegistry, HintCellWriter, WriteContext};
use crate::cursor::CursorRow;
use crate::error::{ExcelError, Result};
use crate::fast_writer::styles::StyleSheet;
use crate::fast_writer::{Worksheet, MAX_COLUMNS};
use crate::report::ExportWarning;
use crate::width::{resize_columns, ColumnWidths};

/// Rows taken by a hint: the hint itself and a blank separator
const HINT_ROWS: u32 = 2;

pub struct RowStreamingConsumer<'a> {
    sheet: Worksheet,
    registry: &'a CellWriterRegistry,
    styles: &'a mut StyleSheet,
    warnings: &'a mut Vec<ExportWarning>,
    widths: ColumnWidths,
    data_start: u32,
    rows: usize,
    resized: bool,
}

impl<'a> RowStreamingConsumer<'a> {
    pub fn new(
        sheet: Worksheet,
        registry: &'a CellWriterRegistry,
        styles: &'a mut StyleSheet,
        warnings: &'a mut Vec<ExportWarning>,
    ) -> Self {
        RowStreamingConsumer {
            sheet,
            registry,
            styles,
            warnings,
            widths: ColumnWidths::new(),
            data_start: 0,
            rows: 0,
            resized: false,
        }
    }

    /// Write the hint line at the current start row and move the data two
    /// rows down. Only column 0 is used; it does not widen the column.
    pub fn write_hint(&mut self, hint: &str) -> Result<()> {
        let row = self.sheet.create_row(self.data_start)?;
        let mut ctx = WriteContext {
            styles: &mut *self.styles,
            warnings: &mut *self.warnings,
        };
        HintCellWriter.write_cell(row, 0, hint, &mut ctx);
        self.widths.record(0, 0);
        self.data_start += HINT_ROWS;
        Ok(())
    }

    /// Handle one cursor row; rows must arrive in cursor order
    pub fn on_row(&mut self, cursor: &dyn CursorRow) -> Result<()> {
        let number = cursor.row_number();
        if number == 0 {
            return Err(ExcelError::CursorError(
                "cursor row numbers start at 1".to_string(),
            ));
        }
        let columns = cursor.column_count();
        if columns > MAX_COLUMNS as usize {
            return Err(ExcelError::LimitExceeded(format!(
                "query returns {} columns, a sheet holds at most {}",
                columns, MAX_COLUMNS
            )));
        }

        if number == 1 {
            self.write_header(cursor)?;
        }

        let index = u32::try_from(number - 1)
            .ok()
            .and_then(|n| n.checked_add(self.data_start))
            .ok_or_else(|| {
                ExcelError::LimitExceeded(format!("cursor row {} does not fit a sheet", number))
            })?;
        log::trace!(
            "Writing result row {} into sheet row {} of '{}'",
            number,
            index,
            self.sheet.name()
        );

        let row = self.sheet.create_row(index)?;
        let mut ctx = WriteContext {
            styles: &mut *self.styles,
            warnings: &mut *self.warnings,
        };
        for i in 0..columns {
            let width = self
                .registry
                .write_column(cursor, i, row, i as u32, &mut ctx)?;
            self.widths.record(i, width);
        }
        self.rows += 1;

        if cursor.is_last() {
            resize_columns(&mut self.sheet, &self.widths)?;
            self.resized = true;
        }
        Ok(())
    }

    fn write_header(&mut self, cursor: &dyn CursorRow) -> Result<()> {
        let row = self.sheet.create_row(self.data_start)?;
        let mut ctx = WriteContext {
            styles: &mut *self.styles,
            warnings: &mut *self.warnings,
        };
        for i in 0..cursor.column_count() {
            let label = cursor.column_label(i)?;
            let width = self.registry.write_header(row, i as u32, label, &mut ctx);
            self.widths.record(i, width);
        }
        self.data_start += 1;
        Ok(())
    }

    /// Result rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Whether column widths were applied (the last row was seen)
    pub fn resized(&self) -> bool {
        self.resized
    }

    pub fn widths(&self) -> &ColumnWidths {
        &self.widths
    }

    pub fn sheet(&self) -> &Worksheet {
        &self.sheet
    }

    pub fn into_sheet(self) -> Worksheet {
        self.sheet
    }
}
