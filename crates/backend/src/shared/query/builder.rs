//! Filter map + sort parameters -> predicate + order
//!
//! Key grammar: `field`, `field_op`, `field_to`, `field_to_op`. Every key is
//! consumed at most once; range pairs and operator pairs are consumed
//! together so a field never also gets a default equality term.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use contracts::shared::query::{FilterOp, FilterValue, OrderSpec, SortDirection};

use super::date::{looks_like_date_field, looks_like_free_text_field, parse_date};
use super::predicate::{Comparison, Predicate, Term};
use crate::shared::relations::{EntityDef, EntityRegistry, FieldKind};

const OP_SUFFIX: &str = "_op";
const TO_SUFFIX: &str = "_to";
const SEARCH_KEY: &str = "search";

/// Predicate and ordering for one list request
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub predicate: Predicate,
    pub order: OrderSpec,
}

/// Outcome of the date step of an implicit filter
enum DateStep {
    Parsed(FilterValue),
    /// Date column with an unparseable value: emit nothing
    Skip,
    /// Not a date, continue with the other rules
    NotADate,
}

#[derive(Clone)]
pub struct QueryConditionBuilder {
    registry: Arc<EntityRegistry>,
}

impl QueryConditionBuilder {
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self { registry }
    }

    pub fn build(
        &self,
        entity: &str,
        filters: &BTreeMap<String, FilterValue>,
        sort_field: Option<&str>,
        sort_direction: Option<&str>,
    ) -> BuiltQuery {
        BuiltQuery {
            predicate: self.build_predicate(entity, filters),
            order: self.build_order(entity, sort_field, sort_direction),
        }
    }

    pub fn build_predicate(
        &self,
        entity: &str,
        filters: &BTreeMap<String, FilterValue>,
    ) -> Predicate {
        let mut predicate = Predicate::default();
        let Some(def) = self.registry.entity(entity) else {
            tracing::debug!("Filters ignored for unknown entity '{}'", entity);
            return predicate;
        };

        let mut processed: HashSet<String> = HashSet::new();

        // Ranges first, so both bounds claim their keys
        for (key, value) in filters {
            if processed.contains(key) || def.find_field(key).is_some() {
                continue;
            }
            let Some(base) = key.strip_suffix(TO_SUFFIX) else {
                continue;
            };
            if def.find_field(base).is_none() {
                continue;
            }

            let from_op = filters.get(&format!("{base}{OP_SUFFIX}")).map(op_of);
            let to_op = filters.get(&format!("{key}{OP_SUFFIX}")).map(op_of);

            if let Some(from) = filters.get(base) {
                let cmp = match from_op {
                    Some(FilterOp::GreaterThan) => Comparison::Gt,
                    _ => Comparison::Gte,
                };
                predicate.push(Term::compare(base, cmp, comparable(from)));
            }
            let cmp = match to_op {
                Some(FilterOp::LessThan) => Comparison::Lt,
                _ => Comparison::Lte,
            };
            predicate.push(Term::compare(base, cmp, comparable(value)));

            processed.insert(base.to_string());
            processed.insert(key.clone());
            processed.insert(format!("{base}{OP_SUFFIX}"));
            processed.insert(format!("{key}{OP_SUFFIX}"));
        }

        for (key, value) in filters {
            if processed.contains(key) {
                continue;
            }

            if def.find_field(key).is_none() {
                if let Some(base) = key.strip_suffix(OP_SUFFIX) {
                    if let (Some(field), Some(target)) = (def.find_field(base), filters.get(base)) {
                        if let Some(term) = explicit_term(&field.name, op_of(value), target) {
                            predicate.push(term);
                        }
                        processed.insert(base.to_string());
                    }
                    processed.insert(key.clone());
                    continue;
                }
            }

            // Left for the operator path
            if filters.contains_key(&format!("{key}{OP_SUFFIX}")) {
                continue;
            }

            processed.insert(key.clone());

            if key == SEARCH_KEY && def.find_field(key).is_none() {
                if let Some(term) = search_term(def, value) {
                    predicate.push(term);
                }
                continue;
            }

            match def.find_field(key) {
                Some(field) => {
                    if let Some(term) = implicit_term(field.name.as_str(), field.kind, value) {
                        predicate.push(term);
                    }
                }
                None => tracing::debug!("Filter '{}' is not a field of {}, skipped", key, def.name),
            }
        }

        predicate
    }

    /// Requested field and direction when the field exists, `(createdAt, desc)` otherwise
    pub fn build_order(
        &self,
        entity: &str,
        sort_field: Option<&str>,
        sort_direction: Option<&str>,
    ) -> OrderSpec {
        match sort_field.map(str::trim).filter(|f| !f.is_empty()) {
            Some(field) if self.registry.has_field(entity, field) => {
                OrderSpec::new(field, SortDirection::parse(sort_direction))
            }
            Some(field) => {
                tracing::debug!("Sort field '{}' not found on {}, using default", field, entity);
                OrderSpec::default()
            }
            None => OrderSpec::default(),
        }
    }
}

fn op_of(value: &FilterValue) -> FilterOp {
    match value {
        FilterValue::Text(token) => FilterOp::parse(token),
        _ => FilterOp::Equals,
    }
}

/// Text that parses as a date compares as a date
fn comparable(value: &FilterValue) -> FilterValue {
    match value {
        FilterValue::Text(s) => parse_date(s).map(FilterValue::Date).unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

fn split_list(value: &str) -> Vec<FilterValue> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(FilterValue::text)
        .collect()
}

fn any_of(field: &str, values: Vec<FilterValue>) -> Option<Term> {
    if values.is_empty() {
        return None;
    }
    Some(Term::AnyOf {
        field: field.to_string(),
        values,
    })
}

fn explicit_term(field: &str, op: FilterOp, value: &FilterValue) -> Option<Term> {
    let term = match op {
        FilterOp::GreaterThan => Term::compare(field, Comparison::Gt, comparable(value)),
        FilterOp::GreaterThanOrEqual => Term::compare(field, Comparison::Gte, comparable(value)),
        FilterOp::LessThan => Term::compare(field, Comparison::Lt, comparable(value)),
        FilterOp::LessThanOrEqual => Term::compare(field, Comparison::Lte, comparable(value)),
        FilterOp::Equals => Term::compare(field, Comparison::Eq, comparable(value)),
        FilterOp::Contains => Term::Contains {
            field: field.to_string(),
            pattern: value.to_string(),
        },
        FilterOp::In => match value {
            FilterValue::Text(s) => return any_of(field, split_list(s)),
            other => return any_of(field, vec![other.clone()]),
        },
    };
    Some(term)
}

fn date_step(field: &str, kind: FieldKind, value: &str) -> DateStep {
    if !looks_like_date_field(field) {
        return DateStep::NotADate;
    }
    match parse_date(value) {
        Some(date) => DateStep::Parsed(FilterValue::Date(date)),
        None if kind == FieldKind::Timestamp => {
            tracing::debug!("Unparseable date '{}' for {}, filter skipped", value, field);
            DateStep::Skip
        }
        None => DateStep::NotADate,
    }
}

fn implicit_term(field: &str, kind: FieldKind, value: &FilterValue) -> Option<Term> {
    let text = match value {
        FilterValue::Number(_) | FilterValue::Date(_) => {
            return Some(Term::compare(field, Comparison::Eq, value.clone()))
        }
        FilterValue::Text(text) => text,
    };

    match date_step(field, kind, text) {
        DateStep::Parsed(date) => return Some(Term::compare(field, Comparison::Eq, date)),
        DateStep::Skip => return None,
        DateStep::NotADate => {}
    }

    if text.contains(',') {
        any_of(field, split_list(text))
    } else if looks_like_free_text_field(field) {
        Some(Term::Contains {
            field: field.to_string(),
            pattern: text.clone(),
        })
    } else {
        Some(Term::compare(field, Comparison::Eq, value.clone()))
    }
}

fn search_term(entity: &EntityDef, value: &FilterValue) -> Option<Term> {
    let pattern = value.to_string();
    if pattern.trim().is_empty() {
        return None;
    }
    let fields: Vec<String> = entity.free_text_fields().map(|f| f.name.clone()).collect();
    if fields.is_empty() {
        return None;
    }
    Some(Term::Search {
        fields,
        pattern: pattern.trim().to_string(),
    })
}
