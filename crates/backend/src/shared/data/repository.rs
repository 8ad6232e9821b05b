//! Generic CRUD over catalog entities. Rows travel as JSON objects keyed by
//! field name.

use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement, SimpleExpr, Value};
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, JsonValue};
use serde_json::Map;
use uuid::Uuid;

use crate::shared::query::date::format_timestamp;
use crate::shared::query::sql::{apply_order, condition, json_to_value, select_fields};
use crate::shared::query::BuiltQuery;
use crate::shared::relations::{EntityDef, FieldDef};

/// Fields maintained by the repository itself
const MANAGED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid value for field '{0}'")]
pub struct InvalidField(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    NoFields,
}

/// Column values taken from a request body. Unknown and managed keys are ignored.
pub fn writable_values<'a>(
    entity: &'a EntityDef,
    body: &Map<String, JsonValue>,
) -> Result<Vec<(&'a FieldDef, Value)>, InvalidField> {
    let mut values = Vec::new();
    for field in &entity.fields {
        if MANAGED_FIELDS.contains(&field.name.as_str()) {
            continue;
        }
        let Some(raw) = body.get(&field.name) else {
            continue;
        };
        let value = json_to_value(field, raw).ok_or_else(|| InvalidField(field.name.clone()))?;
        values.push((field, value));
    }
    Ok(values)
}

async fn fetch_rows(
    db: &DatabaseConnection,
    select: &SelectStatement,
) -> anyhow::Result<Vec<JsonValue>> {
    let stmt = db.get_database_backend().build(select);
    Ok(JsonValue::find_by_statement(stmt).all(db).await?)
}

fn id_column(entity: &EntityDef) -> Expr {
    let column = entity
        .find_field("id")
        .map(|f| f.column.as_str())
        .unwrap_or("id");
    Expr::col(Alias::new(column))
}

/// One page of rows plus the total matching count
pub async fn list(
    db: &DatabaseConnection,
    entity: &EntityDef,
    query: &BuiltQuery,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<JsonValue>, u64)> {
    let filter = condition(entity, &query.predicate);

    let mut select = select_fields(entity);
    if !query.predicate.is_empty() {
        select.cond_where(filter.clone());
    }
    apply_order(&mut select, entity, &query.order);
    select.limit(limit).offset(offset);
    let rows = fetch_rows(db, &select).await?;

    let mut count = Query::select();
    count
        .expr_as(Expr::cust("COUNT(*)"), Alias::new("total"))
        .from(Alias::new(entity.table.as_str()));
    if !query.predicate.is_empty() {
        count.cond_where(filter);
    }
    let backend = db.get_database_backend();
    let total = match db.query_one(backend.build(&count)).await? {
        Some(row) => row.try_get::<i64>("", "total")?,
        None => 0,
    };

    Ok((rows, total.max(0) as u64))
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    entity: &EntityDef,
    id: &str,
) -> anyhow::Result<Option<JsonValue>> {
    let mut select = select_fields(entity);
    select.and_where(id_column(entity).eq(id)).limit(1);
    Ok(fetch_rows(db, &select).await?.into_iter().next())
}

/// Rows whose `field` equals one of `keys`
pub async fn find_where_in(
    db: &DatabaseConnection,
    entity: &EntityDef,
    field: &FieldDef,
    keys: &[String],
) -> anyhow::Result<Vec<JsonValue>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let mut select = select_fields(entity);
    select.and_where(Expr::col(Alias::new(field.column.as_str())).is_in(keys.iter().cloned()));
    fetch_rows(db, &select).await
}

/// Insert a row; id and timestamps are generated. Returns the stored row.
pub async fn insert(
    db: &DatabaseConnection,
    entity: &EntityDef,
    values: Vec<(&FieldDef, Value)>,
) -> anyhow::Result<JsonValue> {
    let id = Uuid::new_v4().to_string();
    let now = format_timestamp(&Utc::now());

    let mut columns = vec![Alias::new("id")];
    let mut row: Vec<SimpleExpr> = vec![id.clone().into()];
    for managed in ["createdAt", "updatedAt"] {
        if let Some(field) = entity.find_field(managed) {
            columns.push(Alias::new(field.column.as_str()));
            row.push(now.clone().into());
        }
    }
    for (field, value) in values {
        columns.push(Alias::new(field.column.as_str()));
        row.push(value.into());
    }

    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(entity.table.as_str()))
        .columns(columns)
        .values(row)?;
    db.execute(db.get_database_backend().build(&stmt)).await?;

    find_by_id(db, entity, &id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("{} {} vanished after insert", entity.name, id))
}

pub async fn update(
    db: &DatabaseConnection,
    entity: &EntityDef,
    id: &str,
    values: Vec<(&FieldDef, Value)>,
) -> anyhow::Result<UpdateOutcome> {
    if values.is_empty() {
        return Ok(UpdateOutcome::NoFields);
    }

    let mut assignments: Vec<(Alias, SimpleExpr)> = values
        .into_iter()
        .map(|(field, value)| (Alias::new(field.column.as_str()), value.into()))
        .collect();
    if let Some(updated) = entity.find_field("updatedAt") {
        assignments.push((
            Alias::new(updated.column.as_str()),
            format_timestamp(&Utc::now()).into(),
        ));
    }

    let mut stmt = Query::update();
    stmt.table(Alias::new(entity.table.as_str()))
        .values(assignments)
        .and_where(id_column(entity).eq(id));
    let result = db.execute(db.get_database_backend().build(&stmt)).await?;

    Ok(if result.rows_affected() == 0 {
        UpdateOutcome::NotFound
    } else {
        UpdateOutcome::Updated
    })
}

/// `true` when a row was removed
pub async fn delete(db: &DatabaseConnection, entity: &EntityDef, id: &str) -> anyhow::Result<bool> {
    let mut stmt = Query::delete();
    stmt.from_table(Alias::new(entity.table.as_str()))
        .and_where(id_column(entity).eq(id));
    let result = db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::shared::query::QueryConditionBuilder;
    use crate::shared::relations::EntityRegistry;
    use contracts::shared::query::FilterValue;
    use maplit::btreemap;
    use serde_json::json;
    use std::sync::Arc;

    fn body(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    async fn create(
        db: &DatabaseConnection,
        registry: &EntityRegistry,
        entity: &str,
        value: JsonValue,
    ) -> JsonValue {
        let def = registry.entity(entity).unwrap();
        let values = writable_values(def, &body(value)).unwrap();
        insert(db, def, values).await.unwrap()
    }

    #[test]
    fn test_writable_values_skips_managed_and_unknown() {
        let registry = EntityRegistry::from_catalog();
        let customer = registry.entity("customer").unwrap();
        let values = writable_values(
            customer,
            &body(json!({"id": "x", "name": "Acme", "nope": 1, "creditLimit": 1500.5})),
        )
        .unwrap();
        let names: Vec<&str> = values.iter().map(|(f, _)| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "creditLimit"]);

        let err = writable_values(customer, &body(json!({"isActive": "maybe"}))).unwrap_err();
        assert_eq!(err, InvalidField("isActive".to_string()));
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let registry = EntityRegistry::from_catalog();
        let db = connect_in_memory(&registry).await.unwrap();
        let row = create(&db, &registry, "customer", json!({"name": "Acme", "isActive": true})).await;

        assert_eq!(row["name"], "Acme");
        assert_eq!(row["isActive"], true);
        assert!(row["id"].as_str().map(|s| s.len() == 36).unwrap_or(false));
        assert!(row["createdAt"].as_str().unwrap().ends_with('Z'));
        assert_eq!(row["email"], JsonValue::Null);
    }

    #[tokio::test]
    async fn test_list_filters_orders_and_counts() {
        let registry = Arc::new(EntityRegistry::from_catalog());
        let db = connect_in_memory(&registry).await.unwrap();
        for (number, amount) in [("A-1", 50.0), ("A-2", 150.0), ("A-3", 250.0), ("B-1", 400.0)] {
            create(
                &db,
                &registry,
                "order",
                json!({"orderNumber": number, "totalAmount": amount, "status": "pending"}),
            )
            .await;
        }

        let builder = QueryConditionBuilder::new(registry.clone());
        let built = builder.build(
            "order",
            &btreemap! {
                "totalAmount".to_string() => FilterValue::text("100"),
                "totalAmount_to".to_string() => FilterValue::text("300"),
            },
            Some("totalAmount"),
            Some("asc"),
        );
        let order = registry.entity("order").unwrap();
        let (rows, total) = list(&db, order, &built, 1, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["orderNumber"], "A-2");

        let (rows, _) = list(&db, order, &built, 1, 1).await.unwrap();
        assert_eq!(rows[0]["orderNumber"], "A-3");

        let search = builder.build(
            "order",
            &btreemap! {
                "orderNumber".to_string() => FilterValue::text("b-"),
                "orderNumber_op".to_string() => FilterValue::text("contains"),
            },
            None,
            None,
        );
        let (rows, total) = list(&db, order, &search, 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0]["orderNumber"], "B-1");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let registry = EntityRegistry::from_catalog();
        let db = connect_in_memory(&registry).await.unwrap();
        let carrier = registry.entity("carrier").unwrap();
        let row = create(&db, &registry, "carrier", json!({"name": "FastShip", "code": "FS"})).await;
        let id = row["id"].as_str().unwrap().to_string();

        let values = writable_values(carrier, &body(json!({"code": "FS2"}))).unwrap();
        assert_eq!(update(&db, carrier, &id, values).await.unwrap(), UpdateOutcome::Updated);
        let stored = find_by_id(&db, carrier, &id).await.unwrap().unwrap();
        assert_eq!(stored["code"], "FS2");
        assert_eq!(stored["name"], "FastShip");

        assert_eq!(
            update(&db, carrier, &id, Vec::new()).await.unwrap(),
            UpdateOutcome::NoFields
        );
        let values = writable_values(carrier, &body(json!({"code": "X"}))).unwrap();
        assert_eq!(
            update(&db, carrier, "missing", values).await.unwrap(),
            UpdateOutcome::NotFound
        );

        assert!(delete(&db, carrier, &id).await.unwrap());
        assert!(!delete(&db, carrier, &id).await.unwrap());
        assert!(find_by_id(&db, carrier, &id).await.unwrap().is_none());
    }
}
