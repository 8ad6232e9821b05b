use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a single list filter
///
/// Query-string filters always arrive as `Text`; `Number` and `Date` are
/// produced by callers that already know the value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "{}", s),
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Date(value)
    }
}

/// Explicit filter operator carried by a `<field>_op` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    Contains,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
}

impl FilterOp {
    /// Parse an operator token. Unknown tokens fall back to `Equals`.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "greater_than" | "gt" => FilterOp::GreaterThan,
            "greater_than_or_equal" | "gte" => FilterOp::GreaterThanOrEqual,
            "less_than" | "lt" => FilterOp::LessThan,
            "less_than_or_equal" | "lte" => FilterOp::LessThanOrEqual,
            "contains" => FilterOp::Contains,
            "in" => FilterOp::In,
            _ => FilterOp::Equals,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            FilterOp::Equals => "equals",
            FilterOp::Contains => "contains",
            FilterOp::GreaterThan => "greater_than",
            FilterOp::GreaterThanOrEqual => "greater_than_or_equal",
            FilterOp::LessThan => "less_than",
            FilterOp::LessThanOrEqual => "less_than_or_equal",
            FilterOp::In => "in",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_and_short_tokens() {
        assert_eq!(FilterOp::parse("greater_than"), FilterOp::GreaterThan);
        assert_eq!(FilterOp::parse("gte"), FilterOp::GreaterThanOrEqual);
        assert_eq!(FilterOp::parse("less_than_or_equal"), FilterOp::LessThanOrEqual);
        assert_eq!(FilterOp::parse("in"), FilterOp::In);
        assert_eq!(FilterOp::parse("contains"), FilterOp::Contains);
    }

    #[test]
    fn test_unknown_token_is_equality() {
        assert_eq!(FilterOp::parse("starts_with"), FilterOp::Equals);
        assert_eq!(FilterOp::parse(""), FilterOp::Equals);
    }
}
