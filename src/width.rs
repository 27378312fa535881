//! Column width estimation
//!
//! Widths are tracked as character counts while rows stream in and turned
//! into sheet column widths once, after the last row. No font metrics are
//! involved.

use crate::error::Result;
use crate::fast_writer::Worksheet;

/// Widest column, in characters, a resize will produce
pub const MAX_COLUMN_WIDTH_CHARS: usize = 100;

const CHAR_WIDTH_FACTOR: f64 = 1.14388;

/// Width units (1/256 of a character) for a character count
pub fn column_width_units(chars: usize) -> u32 {
    ((chars as f64 * CHAR_WIDTH_FACTOR).floor() as u32).saturating_mul(256)
}

/// Maximum rendered width per column seen so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    widths: Vec<usize>,
}

impl ColumnWidths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the larger of the current and the new width
    pub fn record(&mut self, col: usize, width: usize) {
        if col >= self.widths.len() {
            self.widths.resize(col + 1, 0);
        }
        if self.widths[col] < width {
            self.widths[col] = width;
        }
    }

    /// Widest value seen in a column, 0 if none
    pub fn get(&self, col: usize) -> usize {
        self.widths.get(col).copied().unwrap_or(0)
    }

    /// Number of columns tracked
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Width in units for every tracked column, clamped to
    /// [`MAX_COLUMN_WIDTH_CHARS`]
    pub fn to_units(&self) -> Vec<u32> {
        let max = column_width_units(MAX_COLUMN_WIDTH_CHARS);
        self.widths
            .iter()
            .map(|chars| column_width_units(*chars).min(max))
            .collect()
    }
}

/// Apply the accumulated widths to a sheet
pub fn resize_columns(sheet: &mut Worksheet, widths: &ColumnWidths) -> Result<()> {
    for (col, units) in widths.to_units().into_iter().enumerate() {
        sheet.set_column_width(col as u32, units)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(column_width_units(0), 0);
        assert_eq!(column_width_units(5), 5 * 256);
        assert_eq!(column_width_units(10), 11 * 256);
        assert_eq!(column_width_units(100), 114 * 256);
    }

    #[test]
    fn test_record_keeps_maximum() {
        let mut widths = ColumnWidths::new();
        widths.record(2, 7);
        widths.record(2, 3);
        widths.record(0, 1);

        assert_eq!(widths.len(), 3);
        assert_eq!(widths.get(2), 7);
        assert_eq!(widths.get(1), 0);
        assert_eq!(widths.get(9), 0);
    }

    #[test]
    fn test_clamped_to_hundred_chars() {
        let mut widths = ColumnWidths::new();
        widths.record(0, 250);
        widths.record(1, 4);
        assert_eq!(widths.to_units(), vec![114 * 256, 4 * 256]);
    }

    #[test]
    fn test_resize_sets_every_tracked_column() {
        let mut sheet = crate::fast_writer::StreamingWorkbook::new(10, 1)
            .create_sheet("Widths")
            .unwrap();
        let mut widths = ColumnWidths::new();
        widths.record(1, 10);
        resize_columns(&mut sheet, &widths).unwrap();

        assert_eq!(sheet.column_width(0), Some(0));
        assert_eq!(sheet.column_width(1), Some(11 * 256));
    }
}
