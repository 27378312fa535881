//! Cell writers: one typed value into one cell
//!
//! Every writer returns the rendered width of what it wrote, in characters.
//! The width feeds column sizing and is an estimate, not a glyph measurement.

use crate::config::{DecimalMode, ExportOptions};
use crate::cursor::CursorRow;
use crate::error::Result;
use crate::fast_writer::styles::{StyleSheet, DATE_FORMAT};
use crate::report::ExportWarning;
use crate::types::{Cell, CellValue, Row, ValueKind};
use chrono::NaiveDate;
use indexmap::IndexMap;
use url::{ParseError, Url};

const TRUE_WIDTH: usize = 4;
const FALSE_WIDTH: usize = 5;

/// Workbook state a writer may touch
pub struct WriteContext<'a> {
    pub styles: &'a mut StyleSheet,
    pub warnings: &'a mut Vec<ExportWarning>,
}

/// Writes a value of one kind into a cell
pub trait CellWriter {
    type Value: ?Sized;

    /// Write `value` at column `col` of `row`; returns the rendered width
    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &Self::Value,
        ctx: &mut WriteContext<'_>,
    ) -> usize;
}

/// Text cells, with `{key}` templating and optional link detection
#[derive(Debug, Clone, Default)]
pub struct StringCellWriter {
    replacements: IndexMap<String, String>,
    auto_hyperlinks: bool,
}

impl StringCellWriter {
    pub fn new(auto_hyperlinks: bool) -> Self {
        StringCellWriter {
            replacements: IndexMap::new(),
            auto_hyperlinks,
        }
    }

    pub fn with_replacements(mut self, replacements: IndexMap<String, String>) -> Self {
        self.replacements = replacements;
        self
    }

    /// Substitute every `{key}` once per key, in map order. Substituted text
    /// is not scanned again for the same key.
    pub fn replace_all(&self, input: &str) -> String {
        if self.replacements.is_empty() {
            return input.to_string();
        }
        let mut result = input.to_string();
        for (key, value) in &self.replacements {
            let template = format!("{{{}}}", key);
            if result.contains(&template) {
                result = result.replace(&template, value);
            }
        }
        log::trace!("Created text '{}' after replacing '{}'", result, input);
        result
    }
}

impl CellWriter for StringCellWriter {
    type Value = str;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &str,
        ctx: &mut WriteContext<'_>,
    ) -> usize {
        let text = self.replace_all(value);
        let mut cell = Cell::new(CellValue::String(text.clone()));

        if self.auto_hyperlinks && text.starts_with("http") {
            match Url::parse(&text) {
                Ok(url) => cell = cell.with_hyperlink(url.as_str()),
                // relative reference such as "httpd" or "http_docs/x"
                Err(ParseError::RelativeUrlWithoutBase) if is_relative_reference(&text) => {
                    cell = cell.with_hyperlink(&text)
                }
                Err(e) => {
                    log::warn!(
                        "Found string '{}' in cell but it is not a valid URI ({}), cell is not marked as hyperlink",
                        text,
                        e
                    );
                    ctx.warnings.push(ExportWarning::MalformedHyperlink {
                        value: text.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let width = text.chars().count();
        row.set_cell(col, cell);
        width
    }
}

fn is_relative_reference(text: &str) -> bool {
    Url::parse("http://localhost/")
        .and_then(|base| base.join(text))
        .is_ok()
}

/// Date cells shown as `dd.MM.yyyy`; dates before 1900 become text

#[derive(Debug, Clone, Copy, Default)]
pub struct DateCellWriter;

impl CellWriter for DateCellWriter {
    type Value = NaiveDate;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &NaiveDate,
        ctx: &mut WriteContext<'_>,
    ) -> usize {
        if CellValue::excel_serial(*value).is_none() {
            let text = value.format("%d.%m.%Y").to_string();
            row.set_cell(col, Cell::new(CellValue::String(text)));
            return DATE_FORMAT.len();
        }
        let style = ctx.styles.date_style();
        row.set_cell(col, Cell::new(CellValue::Date(*value)).with_style(style));
        DATE_FORMAT.len()
    }
}

/// Numeric cells from `f64`
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCellWriter;

impl CellWriter for NumberCellWriter {
    type Value = f64;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &f64,
        _ctx: &mut WriteContext<'_>,
    ) -> usize {
        row.set_cell(col, Cell::new(CellValue::Number(*value)));
        format_general(*value).chars().count()
    }
}

/// Arbitrary-precision decimals given as exact text
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalCellWriter {
    mode: DecimalMode,
}

impl DecimalCellWriter {
    pub fn new(mode: DecimalMode) -> Self {
        DecimalCellWriter { mode }
    }
}

impl CellWriter for DecimalCellWriter {
    type Value = str;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &str,
        ctx: &mut WriteContext<'_>,
    ) -> usize {
        let text = value.trim();
        match (self.mode, text.parse::<f64>()) {
            // Digits beyond f64 precision are lost here
            (DecimalMode::Float, Ok(number)) => {
                NumberCellWriter.write_cell(row, col, &number, ctx)
            }
            _ => {
                row.set_cell(col, Cell::new(CellValue::String(text.to_string())));
                text.chars().count()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCellWriter;

impl CellWriter for BooleanCellWriter {
    type Value = bool;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &bool,
        _ctx: &mut WriteContext<'_>,
    ) -> usize {
        row.set_cell(col, Cell::new(CellValue::Bool(*value)));
        if *value {
            TRUE_WIDTH
        } else {
            FALSE_WIDTH
        }
    }
}

/// Values of any other type, as their text rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueCellWriter;

impl CellWriter for OpaqueCellWriter {
    type Value = str;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &str,
        _ctx: &mut WriteContext<'_>,
    ) -> usize {
        row.set_cell(col, Cell::new(CellValue::String(value.to_string())));
        value.chars().count()
    }
}

/// Emphasized hint line above a tab's data
#[derive(Debug, Clone, Copy, Default)]
pub struct HintCellWriter;

impl CellWriter for HintCellWriter {
    type Value = str;

    fn write_cell(
        &self,
        row: &mut Row,
        col: u32,
        value: &str,
        ctx: &mut WriteContext<'_>,
    ) -> usize {
        let style = ctx.styles.hint_style();
        row.set_cell(
            col,
            Cell::new(CellValue::String(value.to_string())).with_style(style),
        );
        value.chars().count()
    }
}

/// Picks the writer for a column from its declared SQL type
#[derive(Debug, Clone)]
pub struct CellWriterRegistry {
    header: StringCellWriter,
    string: StringCellWriter,
    date: DateCellWriter,
    number: NumberCellWriter,
    decimal: DecimalCellWriter,
    boolean: BooleanCellWriter,
    opaque: OpaqueCellWriter,
}

impl CellWriterRegistry {
    pub fn new(options: &ExportOptions, replacements: IndexMap<String, String>) -> Self {
        CellWriterRegistry {
            header: StringCellWriter::new(options.auto_hyperlinks),
            string: StringCellWriter::new(options.auto_hyperlinks)
                .with_replacements(replacements),
            date: DateCellWriter,
            number: NumberCellWriter,
            decimal: DecimalCellWriter::new(options.decimal_mode),
            boolean: BooleanCellWriter,
            opaque: OpaqueCellWriter,
        }
    }

    /// Column label cell; templates are not applied to labels
    pub fn write_header(
        &self,
        row: &mut Row,
        col: u32,
        label: &str,
        ctx: &mut WriteContext<'_>,
    ) -> usize {
        self.header.write_cell(row, col, label, ctx)
    }

    /// Write column `index` of the cursor's current row into `row`.
    ///
    /// A `NULL` leaves the cell absent and has width 0.
    pub fn write_column(
        &self,
        cursor: &dyn CursorRow,
        index: usize,
        row: &mut Row,
        col: u32,
        ctx: &mut WriteContext<'_>,
    ) -> Result<usize> {
        let width = match cursor.column_type(index)?.kind() {
            ValueKind::String => cursor
                .get_string(index)?
                .map(|v| self.string.write_cell(row, col, &v, ctx)),
            ValueKind::Date => cursor
                .get_date(index)?
                .map(|v| self.date.write_cell(row, col, &v, ctx)),
            ValueKind::Number => cursor
                .get_f64(index)?
                .map(|v| self.number.write_cell(row, col, &v, ctx)),
            ValueKind::Decimal => cursor
                .get_decimal(index)?
                .map(|v| self.decimal.write_cell(row, col, &v, ctx)),
            ValueKind::Boolean => cursor
                .get_bool(index)?
                .map(|v| self.boolean.write_cell(row, col, &v, ctx)),
            ValueKind::Opaque => cursor
                .get_object(index)?
                .map(|v| self.opaque.write_cell(row, col, &v, ctx)),
        };
        Ok(width.unwrap_or(0))
    }
}

/// Render a number the way the spreadsheet "General" format shows it:
/// at most ten significant digits, no trailing zeros, scientific notation
/// for very large or very small magnitudes.
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return "#NUM!".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if !(1e-10..1e11).contains(&abs) {
        let formatted = format!("{:.5E}", value);
        return match formatted.split_once('E') {
            Some((mantissa, exponent)) => {
                format!("{}E{}", strip_fraction_zeros(mantissa), exponent)
            }
            None => formatted,
        };
    }

    let integer_digits = abs.log10().floor() as i32 + 1;
    let decimals = 10 - integer_digits;
    if decimals >= 0 {
        strip_fraction_zeros(&format!("{:.*}", decimals as usize, value)).to_string()
    } else {
        let scale = 10f64.powi(-decimals);
        format!("{:.0}", (value / scale).round() * scale)
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
