use serde::{Deserialize, Serialize};

/// Field a list falls back to when no usable sort field is given
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Only a case-insensitive `asc` sorts ascending; anything else is descending.
    pub fn parse(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.trim().eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_FIELD, SortDirection::Desc)
    }
}
