//! Sorting types for paged listings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AppError::validation(format!(
                "Unknown sort direction '{other}', expected 'asc' or 'desc'"
            ))),
        }
    }
}

/// A sort order: a field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Column or field name to sort by.
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create an ascending sort on the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create a descending sort on the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse a `"{field} asc|desc"` expression. The direction is optional
    /// and defaults to ascending.
    pub fn parse(expr: &str) -> Result<Self, AppError> {
        let mut parts = expr.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| AppError::validation("Sort expression is empty"))?;
        let direction = match parts.next() {
            Some(dir) => dir.parse()?,
            None => SortDirection::Asc,
        };
        if parts.next().is_some() {
            return Err(AppError::validation(format!(
                "Malformed sort expression '{expr}'"
            )));
        }
        Ok(Self::new(field, direction))
    }

    /// Reject fields outside the allowed set.
    pub fn ensure_allowed(&self, allowed: &[&str]) -> Result<(), AppError> {
        if allowed.contains(&self.field.as_str()) {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Cannot sort by '{}', allowed fields: {}",
                self.field,
                allowed.join(", ")
            )))
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{} {dir}", self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_with_direction() {
        let sort = SortField::parse("name desc").unwrap();
        assert_eq!(sort, SortField::desc("name"));
        assert_eq!(sort.to_string(), "name desc");
    }

    #[test]
    fn test_parse_defaults_to_ascending() {
        let sort: SortField = "created_at".parse().unwrap();
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SortField::parse("").unwrap_err().is(ErrorKind::Validation));
        assert!(SortField::parse("name sideways").is_err());
        assert!(SortField::parse("name asc extra").is_err());
    }

    #[test]
    fn test_ensure_allowed() {
        let sort = SortField::asc("password");
        let err = sort.ensure_allowed(&["name", "created_at"]).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }
}
