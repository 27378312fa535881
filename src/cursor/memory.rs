//! In-memory query executor
//!
//! Result sets are registered per SQL text up front; executing a statement
//! replays its rows through the same cursor contract a database driver
//! provides. Useful for tests, benchmarks and offline demos.

use super::{CursorRow, QueryExecutor, RowCallback, SqlParam};
use crate::error::{ExcelError, Result};
use crate::types::SqlType;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;

/// A single value in an in-memory result set
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    /// Exact decimal digits
    Decimal(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Text(v) | SqlValue::Decimal(v) => f.write_str(v),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::Date(v) => write!(f, "{}", v),
            SqlValue::DateTime(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Column metadata of a result set
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub label: String,
    pub sql_type: SqlType,
}

/// Rows returned for one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column definition
    pub fn column(mut self, label: &str, sql_type: SqlType) -> Self {
        self.columns.push(ColumnMeta {
            label: label.to_string(),
            sql_type,
        });
        self
    }

    /// Add a row; missing trailing values read as `NULL`
    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.push_row(values);
        self
    }

    pub fn push_row<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A statement as it was executed
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

enum Registered {
    Rows(ResultSet),
    Failure(String),
}

/// Executor answering from registered result sets
#[derive(Default)]
pub struct MemoryExecutor {
    results: HashMap<String, Registered>,
    executed: Vec<ExecutedQuery>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with `result`
    pub fn register(&mut self, sql: &str, result: ResultSet) -> &mut Self {
        self.results
            .insert(sql.to_string(), Registered::Rows(result));
        self
    }

    /// Make `sql` fail with `message` when executed
    pub fn register_failure(&mut self, sql: &str, message: &str) -> &mut Self {
        self.results
            .insert(sql.to_string(), Registered::Failure(message.to_string()));
        self
    }

    /// Statements executed so far, in order
    pub fn executed(&self) -> &[ExecutedQuery] {
        &self.executed
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(
        &mut self,
        sql: &str,
        params: &[SqlParam],
        on_row: &mut RowCallback<'_>,
    ) -> Result<()> {
        self.executed.push(ExecutedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        let result = match self.results.get(sql) {
            Some(Registered::Rows(result)) => result,
            Some(Registered::Failure(message)) => {
                return Err(ExcelError::query(sql, message.clone()))
            }
            None => return Err(ExcelError::query(sql, "no result set registered")),
        };

        let total = result.rows.len();
        for (i, values) in result.rows.iter().enumerate() {
            let row = MemoryRow {
                columns: &result.columns,
                values,
                number: i + 1,
                last: i + 1 == total,
            };
            on_row(&row)?;
        }
        Ok(())
    }
}

static NULL: SqlValue = SqlValue::Null;

struct MemoryRow<'a> {
    columns: &'a [ColumnMeta],
    values: &'a [SqlValue],
    number: usize,
    last: bool,
}

impl MemoryRow<'_> {
    fn value(&self, index: usize) -> Result<&SqlValue> {
        if index >= self.columns.len() {
            return Err(ExcelError::CursorError(format!(
                "column index {} out of range ({} columns)",
                index,
                self.columns.len()
            )));
        }
        Ok(self.values.get(index).unwrap_or(&NULL))
    }

    fn mismatch(&self, index: usize, value: &SqlValue, wanted: &str) -> ExcelError {
        ExcelError::CursorError(format!(
            "row {}, column {}: cannot read {:?} as {}",
            self.number, index, value, wanted
        ))
    }
}

impl CursorRow for MemoryRow<'_> {
    fn row_number(&self) -> usize {
        self.number
    }

    fn is_last(&self) -> bool {
        self.last
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_label(&self, index: usize) -> Result<&str> {
        self.columns
            .get(index)
            .map(|c| c.label.as_str())
            .ok_or_else(|| ExcelError::CursorError(format!("no column {}", index)))
    }

    fn column_type(&self, index: usize) -> Result<SqlType> {
        self.columns
            .get(index)
            .map(|c| c.sql_type)
            .ok_or_else(|| ExcelError::CursorError(format!("no column {}", index)))
    }

    fn get_string(&self, index: usize) -> Result<Option<String>> {
        match self.value(index)? {
            SqlValue::Null => Ok(None),
            value => Ok(Some(value.to_string())),
        }
    }

    fn get_date(&self, index: usize) -> Result<Option<NaiveDate>> {
        let value = self.value(index)?;
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Date(d) => Ok(Some(*d)),
            SqlValue::DateTime(dt) => Ok(Some(dt.date())),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| self.mismatch(index, value, "date")),
            other => Err(self.mismatch(index, other, "date")),
        }
    }

    fn get_f64(&self, index: usize) -> Result<Option<f64>> {
        let value = self.value(index)?;
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v as f64)),
            SqlValue::Float(v) => Ok(Some(*v)),
            SqlValue::Bool(v) => Ok(Some(if *v { 1.0 } else { 0.0 })),
            SqlValue::Decimal(s) | SqlValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.mismatch(index, value, "number")),
            other => Err(self.mismatch(index, other, "number")),
        }
    }

    fn get_decimal(&self, index: usize) -> Result<Option<String>> {
        let value = self.value(index)?;
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(v.to_string())),
            SqlValue::Float(v) => Ok(Some(v.to_string())),
            SqlValue::Decimal(s) => Ok(Some(s.clone())),
            SqlValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(_) => Ok(Some(s.trim().to_string())),
                Err(_) => Err(self.mismatch(index, value, "decimal")),
            },
            other => Err(self.mismatch(index, other, "decimal")),
        }
    }

    fn get_bool(&self, index: usize) -> Result<Option<bool>> {
        let value = self.value(index)?;
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Bool(v) => Ok(Some(*v)),
            SqlValue::Int(v) => Ok(Some(*v != 0)),
            SqlValue::Text(s) => match s.trim() {
                "1" | "t" | "true" | "TRUE" => Ok(Some(true)),
                "0" | "f" | "false" | "FALSE" => Ok(Some(false)),
                _ => Err(self.mismatch(index, value, "boolean")),
            },
            other => Err(self.mismatch(index, other, "boolean")),
        }
    }

    fn get_object(&self, index: usize) -> Result<Option<String>> {
        self.get_string(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> ResultSet {
        ResultSet::new()
            .column("name", SqlType::VARCHAR)
            .column("age", SqlType::INTEGER)
            .row([SqlValue::from("alice"), SqlValue::from(30)])
            .row([SqlValue::from("bob"), SqlValue::Null])
    }

    #[test]
    fn test_rows_replayed_in_order() {
        let mut executor = MemoryExecutor::new();
        executor.register("SELECT * FROM people WHERE id > ?", people());

        let mut seen = Vec::new();
        executor
            .execute("SELECT * FROM people WHERE id > ?", &[SqlParam::Int(0)], &mut |row| {
                seen.push((
                    row.row_number(),
                    row.is_last(),
                    row.get_string(0)?,
                    row.get_f64(1)?,
                ));
                Ok(())
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, false, Some("alice".to_string()), Some(30.0)),
                (2, true, Some("bob".to_string()), None),
            ]
        );
        assert_eq!(executor.executed()[0].params, vec![SqlParam::Int(0)]);
    }

    #[test]
    fn test_callback_error_stops_cursor() {
        let mut executor = MemoryExecutor::new();
        executor.register("q", people());

        let mut calls = 0;
        let err = executor
            .execute("q", &[], &mut |_| {
                calls += 1;
                Err(ExcelError::WriteError("sink failed".into()))
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, ExcelError::WriteError(_)));
    }

    #[test]
    fn test_unknown_and_failing_queries() {
        let mut executor = MemoryExecutor::new();
        executor.register_failure("broken", "relation does not exist");

        let err = executor.execute("broken", &[], &mut |_| Ok(())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Query 'broken' failed: relation does not exist"
        );
        assert!(matches!(
            executor.execute("missing", &[], &mut |_| Ok(())),
            Err(ExcelError::QueryError { .. })
        ));
        assert_eq!(executor.executed().len(), 2);
    }

    #[test]
    fn test_typed_getters() {
        let set = ResultSet::new()
            .column("d", SqlType::TIMESTAMP)
            .column("flag", SqlType::BIT)
            .column("amount", SqlType::NUMERIC)
            .row([
                SqlValue::from(
                    NaiveDate::from_ymd_opt(2020, 1, 2)
                        .unwrap()
                        .and_hms_opt(10, 0, 0)
                        .unwrap(),
                ),
                SqlValue::Int(1),
                SqlValue::Decimal("12345678901234567890.5".into()),
            ]);
        let mut executor = MemoryExecutor::new();
        executor.register("q", set);

        executor
            .execute("q", &[], &mut |row| {
                assert_eq!(row.get_date(0)?, NaiveDate::from_ymd_opt(2020, 1, 2));
                assert_eq!(row.get_bool(1)?, Some(true));
                assert_eq!(
                    row.get_decimal(2)?.as_deref(),
                    Some("12345678901234567890.5")
                );
                assert!(row.get_date(1).is_err());
                assert!(row.get_string(7).is_err());
                Ok(())
            })
            .unwrap();
    }
}
