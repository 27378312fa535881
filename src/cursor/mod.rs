//! Query execution seam
//!
//! The export engine does not run SQL itself. It hands the tab's statement
//! and bind values to a [`QueryExecutor`], which calls back once per result
//! row, in result order, with a [`CursorRow`] giving typed column access.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use crate::error::Result;
use crate::types::SqlType;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// The current row of a forward-only cursor.
///
/// Column indices are zero-based. Every getter returns `Ok(None)` when the
/// value is SQL `NULL`.
pub trait CursorRow {
    /// 1-based position of this row in the result
    fn row_number(&self) -> usize;

    /// Whether no further row follows this one
    fn is_last(&self) -> bool;

    fn column_count(&self) -> usize;

    fn column_label(&self, index: usize) -> Result<&str>;

    /// Declared SQL type of a column
    fn column_type(&self, index: usize) -> Result<SqlType>;

    fn get_string(&self, index: usize) -> Result<Option<String>>;

    /// Date part of a date, time or timestamp column
    fn get_date(&self, index: usize) -> Result<Option<NaiveDate>>;

    fn get_f64(&self, index: usize) -> Result<Option<f64>>;

    /// Exact decimal digits, e.g. `-12.5000`
    fn get_decimal(&self, index: usize) -> Result<Option<String>>;

    fn get_bool(&self, index: usize) -> Result<Option<bool>>;

    /// Default text rendering of a value of any type
    fn get_object(&self, index: usize) -> Result<Option<String>>;
}

/// Callback receiving each row of a result
pub type RowCallback<'a> = dyn FnMut(&dyn CursorRow) -> Result<()> + 'a;

/// Runs SQL with positional (`?`) parameters and streams the result rows.
pub trait QueryExecutor {
    /// Execute `sql` and invoke `on_row` for every result row, in order.
    ///
    /// An error returned by `on_row` stops the cursor and is returned as is.
    /// Failures of the executor itself are reported as
    /// [`ExcelError::QueryError`](crate::error::ExcelError::QueryError).
    fn execute(&mut self, sql: &str, params: &[SqlParam], on_row: &mut RowCallback<'_>)
        -> Result<()>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &mut E {
    fn execute(
        &mut self,
        sql: &str,
        params: &[SqlParam],
        on_row: &mut RowCallback<'_>,
    ) -> Result<()> {
        (**self).execute(sql, params, on_row)
    }
}

/// Positional bind value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Decimal given as its exact digits
    Decimal(String),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Null => write!(f, "NULL"),
            SqlParam::Bool(v) => write!(f, "{}", v),
            SqlParam::Int(v) => write!(f, "{}", v),
            SqlParam::Float(v) => write!(f, "{}", v),
            SqlParam::Text(v) => write!(f, "'{}'", v),
            SqlParam::Date(v) => write!(f, "{}", v),
            SqlParam::DateTime(v) => write!(f, "{}", v),
            SqlParam::Decimal(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v as i64)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(v: NaiveDate) -> Self {
        SqlParam::Date(v)
    }
}

impl From<NaiveDateTime> for SqlParam {
    fn from(v: NaiveDateTime) -> Self {
        SqlParam::DateTime(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_conversions() {
        assert_eq!(SqlParam::from(7), SqlParam::Int(7));
        assert_eq!(SqlParam::from("x"), SqlParam::Text("x".into()));
        assert_eq!(SqlParam::from(None::<i64>), SqlParam::Null);
        assert_eq!(SqlParam::from(Some(1.5)), SqlParam::Float(1.5));
    }

    #[test]
    fn test_param_display() {
        let params = [SqlParam::Int(1), SqlParam::Text("a".into()), SqlParam::Null];
        let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["1", "'a'", "NULL"]);
    }
}
