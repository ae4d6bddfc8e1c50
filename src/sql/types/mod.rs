use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A record is the list of raw field values of one table line
pub type Record = Vec<String>;

/// Comparison operators allowed in a WHERE clause
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparator {
    Equals,
    NotEquals,
    GreaterThan,
}

impl Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Comparator::Equals => "=",
            Comparator::NotEquals => "!=",
            Comparator::GreaterThan => ">",
        })
    }
}

/// A single-column WHERE clause: `column <comparator> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub comparator: Comparator,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            comparator,
            value: value.into(),
        }
    }

    /// Tests a field against the clause
    ///
    /// Equality is case-insensitive on trimmed text; `>` compares both sides
    /// as floating point numbers and fails if either does not parse.
    pub fn matches(&self, field: &str) -> Result<bool> {
        let field = field.trim();
        let value = self.value.trim();
        Ok(match self.comparator {
            Comparator::Equals => field.eq_ignore_ascii_case(value),
            Comparator::NotEquals => !field.eq_ignore_ascii_case(value),
            Comparator::GreaterThan => parse_number(field)? > parse_number(value)?,
        })
    }
}

/// Parses a comparison operand as a number
pub fn parse_number(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::Precondition(format!("Failed to compare {} because it is not a number.", text.trim())))
}

/// Whether a database or table name is safe to use as a path component
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

/// ALTER TABLE methods
#[derive(Debug, Clone, PartialEq)]
pub enum AlterMethod {
    Add,
}

/// Database metadata kept in the `.meta` file of every database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    pub owner: String,
    /// Seconds since the Unix epoch
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::{Comparator, Filter, is_valid_name};
    use crate::error::{Error, Result};

    #[test]
    fn test_filter_matches() -> Result<()> {
        let eq = Filter::new("name", Comparator::Equals, "Gizmo");
        assert!(eq.matches(" gizmo ")?);
        assert!(!eq.matches("Widget")?);

        let ne = Filter::new("name", Comparator::NotEquals, "Gizmo");
        assert!(ne.matches("Widget")?);
        assert!(!ne.matches("GIZMO")?);

        let gt = Filter::new("price", Comparator::GreaterThan, "150");
        assert!(gt.matches("199.99")?);
        assert!(!gt.matches("150")?);
        assert!(!gt.matches("14.99")?);
        Ok(())
    }

    #[test]
    fn test_filter_not_a_number() {
        let gt = Filter::new("price", Comparator::GreaterThan, "150");
        assert!(matches!(gt.matches("cheap"), Err(Error::Precondition(_))));

        let gt = Filter::new("price", Comparator::GreaterThan, "lots");
        assert!(matches!(gt.matches("10"), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("db_1"));
        assert!(is_valid_name("Product"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(".meta"));
        assert!(!is_valid_name("../../secret"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("a\\b"));
    }
}
