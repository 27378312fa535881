//! Type definitions shared by the cursor side and the sheet side

use chrono::NaiveDate;

/// Declared SQL type code of a result column (JDBC numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlType(pub i32);

impl SqlType {
    pub const BIT: SqlType = SqlType(-7);
    pub const TINYINT: SqlType = SqlType(-6);
    pub const SMALLINT: SqlType = SqlType(5);
    pub const INTEGER: SqlType = SqlType(4);
    pub const BIGINT: SqlType = SqlType(-5);
    pub const FLOAT: SqlType = SqlType(6);
    pub const REAL: SqlType = SqlType(7);
    pub const DOUBLE: SqlType = SqlType(8);
    pub const NUMERIC: SqlType = SqlType(2);
    pub const DECIMAL: SqlType = SqlType(3);
    pub const CHAR: SqlType = SqlType(1);
    pub const VARCHAR: SqlType = SqlType(12);
    pub const LONGVARCHAR: SqlType = SqlType(-1);
    pub const LONGNVARCHAR: SqlType = SqlType(-16);
    pub const DATE: SqlType = SqlType(91);
    pub const TIME: SqlType = SqlType(92);
    pub const TIMESTAMP: SqlType = SqlType(93);
    pub const TIME_WITH_TIMEZONE: SqlType = SqlType(2013);
    pub const TIMESTAMP_WITH_TIMEZONE: SqlType = SqlType(2014);
    pub const BOOLEAN: SqlType = SqlType(16);
    pub const NULL: SqlType = SqlType(0);
    pub const OTHER: SqlType = SqlType(1111);

    /// Semantic kind used to pick the cell writer.
    ///
    /// Total: unknown codes (and `NULL`) land on [`ValueKind::Opaque`].
    pub fn kind(self) -> ValueKind {
        match self {
            SqlType::CHAR | SqlType::VARCHAR | SqlType::LONGVARCHAR | SqlType::LONGNVARCHAR => {
                ValueKind::String
            }
            SqlType::DATE
            | SqlType::TIME
            | SqlType::TIMESTAMP
            | SqlType::TIME_WITH_TIMEZONE
            | SqlType::TIMESTAMP_WITH_TIMEZONE => ValueKind::Date,
            SqlType::DOUBLE
            | SqlType::INTEGER
            | SqlType::SMALLINT
            | SqlType::DECIMAL
            | SqlType::FLOAT
            | SqlType::TINYINT => ValueKind::Number,
            SqlType::BIGINT | SqlType::NUMERIC => ValueKind::Decimal,
            SqlType::BOOLEAN | SqlType::BIT => ValueKind::Boolean,
            _ => ValueKind::Opaque,
        }
    }
}

/// Semantic value kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Character data
    String,
    /// Date, time and timestamp variants
    Date,
    /// Numbers that fit a 64-bit float
    Number,
    /// Arbitrary-precision decimals and big integers
    Decimal,
    /// Boolean and bit
    Boolean,
    /// Everything else, rendered as text
    Opaque,
}

/// Index into the workbook's cell format table (`cellXfs`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleId(pub u32);

impl StyleId {
    /// The workbook default format
    pub const DEFAULT: StyleId = StyleId(0);

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Value stored in a sheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Text, written inline
    String(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Calendar date, written as an Excel serial number
    Date(NaiveDate),
}

/// First date the 1900 date system can represent
fn first_serial_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl CellValue {
    /// Excel serial day number (1900 date system) for a date, `None` before
    /// 1900-01-01.
    ///
    /// Serial 60 is the nonexistent 1900-02-29, so January and February 1900
    /// count from one day later than the rest.
    pub fn excel_serial(date: NaiveDate) -> Option<f64> {
        if date < first_serial_date() {
            return None;
        }
        let leap_bug_end = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap_or(NaiveDate::MIN);
        let epoch = if date < leap_bug_end {
            NaiveDate::from_ymd_opt(1899, 12, 31)
        } else {
            NaiveDate::from_ymd_opt(1899, 12, 30)
        }
        .unwrap_or(NaiveDate::MIN);
        Some((date - epoch).num_days() as f64)
    }
}

/// A written cell: value, format and optional hyperlink target
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: StyleId,
    pub hyperlink: Option<String>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Cell {
            value,
            style: StyleId::DEFAULT,
            hyperlink: None,
        }
    }

    pub fn with_style(mut self, style: StyleId) -> Self {
        self.style = style;
        self
    }

    pub fn with_hyperlink(mut self, target: impl Into<String>) -> Self {
        self.hyperlink = Some(target.into());
        self
    }
}

/// One sheet row. Columns that were never set stay absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    index: u32,
    cells: Vec<Option<Cell>>,
}

impl Row {
    /// Create an empty row at a zero-based index
    pub fn new(index: u32) -> Self {
        Row {
            index,
            cells: Vec::new(),
        }
    }

    /// Zero-based row index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Set the cell at a zero-based column, replacing any previous value
    pub fn set_cell(&mut self, col: u32, cell: Cell) {
        let col = col as usize;
        if col >= self.cells.len() {
            self.cells.resize(col + 1, None);
        }
        self.cells[col] = Some(cell);
    }

    /// Cell at column, `None` when absent
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(col as usize).and_then(Option::as_ref)
    }

    /// Iterate over present cells with their column index
    pub fn cells(&self) -> impl Iterator<Item = (u32, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| cell.as_ref().map(|c| (col as u32, c)))
    }

    /// Number of present cells
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append the Excel letters of a zero-based column to a byte buffer
pub(crate) fn push_column_letter(buffer: &mut Vec<u8>, col: u32) {
    let mut n = col + 1;
    let mut tmp = [0u8; 4];
    let mut len = 0;
    while n > 0 {
        let rem = (n - 1) % 26;
        tmp[len] = b'A' + rem as u8;
        len += 1;
        n = (n - 1) / 26;
    }
    for i in (0..len).rev() {
        buffer.push(tmp[i]);
    }
}
