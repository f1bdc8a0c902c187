//! Equality filters and sort specifications
//!
//! A list request narrows its result set with zero or more
//! [`FilterCondition`]s (all must match) and orders it with at most one
//! [`SortSpec`].
//!
//! # Example
//!
//! ```rust
//! use storefront::query::{FieldKind, FilterCondition, FilterValue, OrderDirection, SortSpec};
//!
//! let filter = FilterCondition::eq("name", "Foo");
//! assert_eq!(filter.value, FilterValue::String("Foo".to_string()));
//!
//! // Raw query values are coerced to the stored type of the field
//! assert_eq!(FieldKind::Integer.coerce("3"), FilterValue::Integer(3));
//! assert_eq!(FieldKind::Flag.coerce("yes"), FilterValue::String("yes".to_string()));
//!
//! let sort = SortSpec::parse("role:desc").unwrap();
//! assert_eq!(sort.direction, OrderDirection::Descending);
//! ```

use std::fmt;

use serde_json::Value;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl OrderDirection {
    /// Only the exact token `desc` selects descending order
    pub fn from_token(token: &str) -> Self {
        if token == "desc" {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Stored type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Whole number
    Integer,
    /// Decimal number
    Decimal,
    /// Boolean flag
    Flag,
}

impl FieldKind {
    /// Coerce a raw query value to this kind
    ///
    /// A value that does not coerce stays text; it will match nothing, the
    /// same way a type-mismatched equality query behaves in a document store.
    pub fn coerce(self, raw: &str) -> FilterValue {
        let text = || FilterValue::String(raw.to_string());
        match self {
            Self::Text => text(),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FilterValue::Integer)
                .unwrap_or_else(|_| text()),
            Self::Decimal => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FilterValue::Float)
                .unwrap_or_else(text),
            Self::Flag => match raw.trim() {
                "true" => FilterValue::Boolean(true),
                "false" => FilterValue::Boolean(false),
                _ => text(),
            },
        }
    }
}

/// A field a resource allows list requests to filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FilterField {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    pub const fn decimal(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Decimal,
        }
    }

    pub const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Flag,
        }
    }
}

/// A value that can be used in filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
}

impl FilterValue {
    /// JSON form of the value, as stored in documents
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Equality condition on a (possibly dotted) field path
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The value the field must equal
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create an equality filter (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Single-field ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field path, passed to the store without validation
    pub field: String,
    pub direction: OrderDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parse a `field:direction` token
    ///
    /// Returns `None` when the field part is empty.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split(':');
        let field = parts.next().unwrap_or_default();
        if field.is_empty() {
            return None;
        }
        let direction = parts
            .next()
            .map(OrderDirection::from_token)
            .unwrap_or_default();
        Some(Self::new(field, direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_from_token() {
        assert_eq!(OrderDirection::from_token("desc"), OrderDirection::Descending);
        assert_eq!(OrderDirection::from_token("asc"), OrderDirection::Ascending);
        assert_eq!(OrderDirection::from_token("DESC"), OrderDirection::Ascending);
        assert_eq!(OrderDirection::from_token(""), OrderDirection::Ascending);
        assert_eq!(format!("{}", OrderDirection::Descending), "desc");
    }

    #[test]
    fn test_coercion() {
        assert_eq!(FieldKind::Text.coerce("42"), FilterValue::String("42".into()));
        assert_eq!(FieldKind::Integer.coerce("42"), FilterValue::Integer(42));
        assert_eq!(FieldKind::Integer.coerce("4.5"), FilterValue::String("4.5".into()));
        assert_eq!(FieldKind::Decimal.coerce("4.5"), FilterValue::Float(4.5));
        assert_eq!(FieldKind::Decimal.coerce("NaN"), FilterValue::String("NaN".into()));
        assert_eq!(FieldKind::Flag.coerce("true"), FilterValue::Boolean(true));
        assert_eq!(FieldKind::Flag.coerce("false"), FilterValue::Boolean(false));
        assert_eq!(FieldKind::Flag.coerce("1"), FilterValue::String("1".into()));
    }

    #[test]
    fn test_filter_value_json() {
        assert_eq!(FilterValue::from("a").to_json(), serde_json::json!("a"));
        assert_eq!(FilterValue::from(3_i64).to_json(), serde_json::json!(3));
        assert_eq!(FilterValue::from(true).to_json(), serde_json::json!(true));
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!(
            SortSpec::parse("role:desc"),
            Some(SortSpec::new("role", OrderDirection::Descending))
        );
        assert_eq!(
            SortSpec::parse("role:asc"),
            Some(SortSpec::new("role", OrderDirection::Ascending))
        );
        assert_eq!(
            SortSpec::parse("role"),
            Some(SortSpec::new("role", OrderDirection::Ascending))
        );
        assert_eq!(
            SortSpec::parse("role:sideways"),
            Some(SortSpec::new("role", OrderDirection::Ascending))
        );
        assert_eq!(SortSpec::parse(":desc"), None);
        assert_eq!(SortSpec::parse(""), None);
    }
}
