//! Eager loading of relations described by an inclusion spec.
//!
//! One `IN (...)` query per relation per level; results are attached to the
//! parent rows under the relation name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use contracts::shared::query::{Inclusion, InclusionSpec};
use sea_orm::{DatabaseConnection, JsonValue};

use super::repository::find_where_in;
use crate::shared::relations::{EntityDef, EntityRegistry, RelationLink};

type LoadFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

fn key_of(row: &JsonValue, field: &str) -> Option<String> {
    match row.get(field)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn distinct_keys(rows: &[JsonValue], field: &str) -> Vec<String> {
    let mut keys: Vec<String> = rows.iter().filter_map(|r| key_of(r, field)).collect();
    keys.sort();
    keys.dedup();
    keys
}

fn attach(row: &mut JsonValue, name: &str, value: JsonValue) {
    if let Some(object) = row.as_object_mut() {
        object.insert(name.to_string(), value);
    }
}

/// Attach every relation in `spec` to `rows`, recursing into nested specs.
pub fn load_relations<'a>(
    db: &'a DatabaseConnection,
    registry: &'a EntityRegistry,
    entity: &'a EntityDef,
    rows: &'a mut [JsonValue],
    spec: &'a InclusionSpec,
) -> LoadFuture<'a> {
    Box::pin(async move {
        if rows.is_empty() {
            return Ok(());
        }

        for (name, inclusion) in spec.iter() {
            let Some(relation) = entity.find_relation(name) else {
                continue;
            };
            let Some(target) = registry.entity(&relation.target) else {
                continue;
            };

            match &relation.link {
                RelationLink::BelongsTo { local } => {
                    let Some(target_id) = target.find_field("id") else {
                        continue;
                    };
                    let keys = distinct_keys(rows, local);
                    let mut related = find_where_in(db, target, target_id, &keys).await?;
                    if let Inclusion::Nested(nested) = inclusion {
                        load_relations(db, registry, target, &mut related, nested).await?;
                    }

                    let by_id: HashMap<String, JsonValue> = related
                        .into_iter()
                        .filter_map(|r| key_of(&r, "id").map(|id| (id, r)))
                        .collect();
                    for row in rows.iter_mut() {
                        let value = key_of(row, local)
                            .and_then(|k| by_id.get(&k).cloned())
                            .unwrap_or(JsonValue::Null);
                        attach(row, name, value);
                    }
                }
                RelationLink::HasMany { foreign } => {
                    let Some(foreign_field) = target.find_field(foreign) else {
                        continue;
                    };
                    let keys = distinct_keys(rows, "id");
                    let mut related = find_where_in(db, target, foreign_field, &keys).await?;
                    if let Inclusion::Nested(nested) = inclusion {
                        load_relations(db, registry, target, &mut related, nested).await?;
                    }

                    let mut grouped: HashMap<String, Vec<JsonValue>> = HashMap::new();
                    for r in related {
                        if let Some(k) = key_of(&r, foreign) {
                            grouped.entry(k).or_default().push(r);
                        }
                    }
                    for row in rows.iter_mut() {
                        let children = key_of(row, "id")
                            .and_then(|id| grouped.get(&id).cloned())
                            .unwrap_or_default();
                        attach(row, name, JsonValue::Array(children));
                    }
                }
            }
        }

        tracing::debug!(
            "Populated {} relation(s) on {} {} row(s)",
            spec.len(),
            rows.len(),
            entity.name
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::shared::data::repository::{insert, writable_values};
    use crate::shared::query::{DepthLimits, PopulateResolver};
    use serde_json::json;
    use std::sync::Arc;

    async fn create(
        db: &DatabaseConnection,
        registry: &EntityRegistry,
        entity: &str,
        value: JsonValue,
    ) -> String {
        let def = registry.entity(entity).unwrap();
        let body = value.as_object().cloned().unwrap();
        let values = writable_values(def, &body).unwrap();
        let row = insert(db, def, values).await.unwrap();
        row["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_loads_belongs_to_has_many_and_nested() {
        let registry = Arc::new(EntityRegistry::from_catalog());
        let db = connect_in_memory(&registry).await.unwrap();

        let customer_id = create(&db, &registry, "customer", json!({"name": "Acme"})).await;
        create(&db, &registry, "order", json!({"orderNumber": "O-1", "customerId": customer_id})).await;
        let lonely = create(&db, &registry, "order", json!({"orderNumber": "O-2"})).await;
        let first = {
            let order = registry.entity("order").unwrap();
            let rows = find_where_in(&db, order, order.find_field("orderNumber").unwrap(), &["O-1".to_string()])
                .await
                .unwrap();
            rows[0]["id"].as_str().unwrap().to_string()
        };
        for qty in [1, 2] {
            create(&db, &registry, "orderitem", json!({"orderId": first, "quantity": qty})).await;
        }

        let resolver = PopulateResolver::new(registry.clone(), DepthLimits::default());
        let spec = resolver.build_inclusion("order", &["items", "customer"], 2);

        let order = registry.entity("order").unwrap();
        let id_field = order.find_field("id").unwrap();
        let mut rows = find_where_in(&db, order, id_field, &[first.clone(), lonely.clone()])
            .await
            .unwrap();
        load_relations(&db, &registry, order, &mut rows, &spec).await.unwrap();

        let with = rows.iter().find(|r| r["id"] == first.as_str()).unwrap();
        assert_eq!(with["customer"]["name"], "Acme");
        // depth 2: the customer's own relations are loaded too
        assert_eq!(with["customer"]["orders"].as_array().unwrap().len(), 1);
        assert_eq!(with["items"].as_array().unwrap().len(), 2);
        assert!(with["items"][0]["order"].is_object());

        let without = rows.iter().find(|r| r["id"] == lonely.as_str()).unwrap();
        assert_eq!(without["customer"], JsonValue::Null);
        assert_eq!(without["items"], json!([]));
    }

    #[tokio::test]
    async fn test_empty_spec_leaves_rows_flat() {
        let registry = EntityRegistry::from_catalog();
        let db = connect_in_memory(&registry).await.unwrap();
        let mut rows = vec![json!({"id": "a", "name": "x"})];
        let customer = registry.entity("customer").unwrap();
        load_relations(&db, &registry, customer, &mut rows, &InclusionSpec::new())
            .await
            .unwrap();
        assert_eq!(rows[0], json!({"id": "a", "name": "x"}));
    }
}
