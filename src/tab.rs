//! Tabs: one query exported into one sheet

use crate::cursor::SqlParam;

/// Sheet name used by [`Tab::of_sql`]
pub const DEFAULT_TAB_NAME: &str = "Default";

/// A named query with its positional parameters and an optional hint line
/// printed above the data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tab {
    pub name: String,
    pub sql: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parameters: Vec<SqlParam>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hint: Option<String>,
}

impl Tab {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Tab {
            name: name.into(),
            sql: sql.into(),
            parameters: Vec::new(),
            hint: None,
        }
    }

    /// Tab exported to a sheet named `Default`
    pub fn of_sql(sql: impl Into<String>) -> Self {
        Self::new(DEFAULT_TAB_NAME, sql)
    }

    pub fn with_parameters<I, P>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<SqlParam>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<SqlParam>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Number of `?` placeholders in the SQL text.
    ///
    /// Literal scan: placeholders inside quoted strings or comments count too.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// Whether the SQL and the parameter list agree
    pub fn parameters_match(&self) -> bool {
        self.placeholder_count() == self.parameters.len()
    }
}

pub fn count_placeholders(sql: &str) -> usize {
    sql.bytes().filter(|b| *b == b'?').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_sql_uses_default_name() {
        let tab = Tab::of_sql("SELECT 1");
        assert_eq!(tab.name, "Default");
        assert!(tab.parameters.is_empty());
        assert!(tab.hint.is_none());
    }

    #[test]
    fn test_placeholder_count_is_literal() {
        assert_eq!(count_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"), 2);
        // quoted question marks count as well
        assert_eq!(count_placeholders("SELECT '?' FROM t WHERE a = ?"), 2);
        assert_eq!(count_placeholders("SELECT 1"), 0);
    }

    #[test]
    fn test_parameters_match() {
        let tab = Tab::new("Orders", "SELECT * FROM orders WHERE id = ?");
        assert!(!tab.parameters_match());
        let tab = tab.with_parameter(42);
        assert!(tab.parameters_match());
        let tab = tab.with_parameters(["a", "b"]);
        assert_eq!(tab.parameters.len(), 2);
        assert!(!tab.parameters_match());
    }
}
