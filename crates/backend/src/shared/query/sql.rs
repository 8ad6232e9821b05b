//! Translation of predicates and order specs into sea-query statements.
//!
//! Only identifiers taken from the catalog reach SQL; every user value is bound.

use contracts::shared::query::{FilterValue, OrderSpec, SortDirection};
use sea_orm::sea_query::{Alias, Condition, Expr, Order, Query, SelectStatement, SimpleExpr, Value};
use sea_orm::JsonValue;

use super::date::{format_timestamp, parse_date};
use super::predicate::{Comparison, Predicate, Term};
use crate::shared::relations::{EntityDef, FieldDef, FieldKind};

fn col(field: &FieldDef) -> Expr {
    Expr::col(Alias::new(field.column.as_str()))
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Bind a filter value with the type of the column it is compared against
pub fn bind(field: &FieldDef, value: &FilterValue) -> Value {
    match (field.kind, value) {
        (_, FilterValue::Date(d)) => Value::from(format_timestamp(d)),
        (FieldKind::Integer, FilterValue::Number(n)) | (FieldKind::Decimal, FilterValue::Number(n)) => {
            number_value(*n)
        }
        (FieldKind::Boolean, FilterValue::Number(n)) => Value::from(*n != 0.0),
        (_, FilterValue::Number(n)) => Value::from(number_text(*n)),
        (FieldKind::Integer, FilterValue::Text(s)) => {
            let t = s.trim();
            t.parse::<i64>()
                .map(Value::from)
                .or_else(|_| t.parse::<f64>().map(Value::from))
                .unwrap_or_else(|_| Value::from(s.clone()))
        }
        (FieldKind::Decimal, FilterValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(s.clone())),
        (FieldKind::Boolean, FilterValue::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Value::from(true),
            "false" | "0" | "no" => Value::from(false),
            _ => Value::from(s.clone()),
        },
        (FieldKind::Timestamp, FilterValue::Text(s)) => match parse_date(s) {
            Some(d) => Value::from(format_timestamp(&d)),
            None => Value::from(s.clone()),
        },
        (FieldKind::Text, FilterValue::Text(s)) => Value::from(s.clone()),
    }
}

/// Typed NULL for a column
pub fn null_of(field: &FieldDef) -> Value {
    match field.kind {
        FieldKind::Integer => Value::BigInt(None),
        FieldKind::Decimal => Value::Double(None),
        FieldKind::Boolean => Value::Bool(None),
        FieldKind::Text | FieldKind::Timestamp => Value::String(None),
    }
}

/// Convert a JSON body value for writing; `None` when the value does not fit the column
pub fn json_to_value(field: &FieldDef, value: &JsonValue) -> Option<Value> {
    let converted = match (field.kind, value) {
        (_, JsonValue::Null) => null_of(field),
        (FieldKind::Boolean, JsonValue::Bool(b)) => Value::from(*b),
        (FieldKind::Integer, JsonValue::Number(n)) => Value::from(n.as_i64()?),
        (FieldKind::Decimal, JsonValue::Number(n)) => Value::from(n.as_f64()?),
        (FieldKind::Text, JsonValue::Number(n)) => Value::from(n.to_string()),
        (FieldKind::Text, JsonValue::Bool(b)) => Value::from(b.to_string()),
        (FieldKind::Text, JsonValue::Array(_) | JsonValue::Object(_)) => Value::from(value.to_string()),
        (FieldKind::Timestamp, JsonValue::String(s)) => Value::from(format_timestamp(&parse_date(s)?)),
        (FieldKind::Text, JsonValue::String(s)) => Value::from(s.clone()),
        (_, JsonValue::String(s)) => match bind(field, &FilterValue::Text(s.clone())) {
            // no numeric or boolean reading of the text
            Value::String(_) => return None,
            typed => typed,
        },
        _ => return None,
    };
    Some(converted)
}

fn compare(field: &FieldDef, cmp: Comparison, value: &FilterValue) -> SimpleExpr {
    let v = bind(field, value);
    match cmp {
        Comparison::Eq => col(field).eq(v),
        Comparison::Gt => col(field).gt(v),
        Comparison::Gte => col(field).gte(v),
        Comparison::Lt => col(field).lt(v),
        Comparison::Lte => col(field).lte(v),
    }
}

fn contains(field: &FieldDef, pattern: &str) -> SimpleExpr {
    col(field).like(format!("%{}%", pattern).as_str())
}

/// Predicate -> WHERE condition. Terms on fields the entity lacks are skipped.
pub fn condition(entity: &EntityDef, predicate: &Predicate) -> Condition {
    let mut all = Condition::all();
    for term in predicate.terms() {
        match term {
            Term::Compare { field, cmp, value } => {
                if let Some(f) = entity.find_field(field) {
                    all = all.add(compare(f, *cmp, value));
                }
            }
            Term::Contains { field, pattern } => {
                if let Some(f) = entity.find_field(field) {
                    all = all.add(contains(f, pattern));
                }
            }
            Term::AnyOf { field, values } => {
                if let Some(f) = entity.find_field(field) {
                    let any = values
                        .iter()
                        .fold(Condition::any(), |any, v| any.add(compare(f, Comparison::Eq, v)));
                    all = all.add(any);
                }
            }
            Term::Search { fields, pattern } => {
                let any = fields
                    .iter()
                    .filter_map(|name| entity.find_field(name))
                    .fold(Condition::any(), |any, f| any.add(contains(f, pattern)));
                all = all.add(any);
            }
        }
    }
    all
}

/// `SELECT <column> AS <field>, ... FROM <table>`
pub fn select_fields(entity: &EntityDef) -> SelectStatement {
    let mut select = Query::select();
    for field in &entity.fields {
        select.expr_as(col(field), Alias::new(field.name.as_str()));
    }
    select.from(Alias::new(entity.table.as_str()));
    select
}

/// ORDER BY from `order`; nothing is added when the field is not on the entity
pub fn apply_order(select: &mut SelectStatement, entity: &EntityDef, order: &OrderSpec) {
    if let Some(field) = entity.find_field(&order.field) {
        let direction = match order.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        select.order_by(Alias::new(field.column.as_str()), direction);
    }
}
