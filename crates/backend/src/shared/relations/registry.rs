//! Entity registry
//!
//! Read-only lookup of entity types, their fields and their relations.
//! Built once at process start and shared through `Arc`.

use std::collections::HashMap;

use super::catalog::{erp_entities, EntityDef, FieldDef, RelationDef};

pub struct EntityRegistry {
    entities: Vec<EntityDef>,
    /// Normalized alias -> index in `entities`
    index: HashMap<String, usize>,
    /// Relation names per entity, same order as `entities`
    relation_names: Vec<Vec<String>>,
}

impl EntityRegistry {
    /// Build a registry from entity declarations.
    ///
    /// Relations pointing at an entity that is not declared are dropped.
    pub fn new(declared: Vec<EntityDef>) -> Self {
        let mut index = HashMap::new();
        for (i, entity) in declared.iter().enumerate() {
            for alias in [&entity.name, &entity.route, &entity.table] {
                index.entry(normalize(alias)).or_insert(i);
            }
        }

        let mut entities = declared;
        for entity in entities.iter_mut() {
            entity.relations.retain(|relation| {
                let known = index.contains_key(&normalize(&relation.target));
                if !known {
                    tracing::warn!(
                        "Relation {}.{} points at unknown entity '{}', dropped",
                        entity.name,
                        relation.name,
                        relation.target
                    );
                }
                known
            });
        }

        let relation_names = entities
            .iter()
            .map(|e| e.relations.iter().map(|r| r.name.clone()).collect())
            .collect();

        Self {
            entities,
            index,
            relation_names,
        }
    }

    /// Registry over the ERP schema
    pub fn from_catalog() -> Self {
        Self::new(erp_entities())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize(name)).copied()
    }

    /// Look up an entity by canonical, route or table name
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.position(name).map(|i| &self.entities[i])
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.iter()
    }

    /// Names of the relations traversable from `entity`; empty for unknown entities
    pub fn relations_of(&self, entity: &str) -> &[String] {
        match self.position(entity) {
            Some(i) => &self.relation_names[i],
            None => &[],
        }
    }

    pub fn is_valid_relation(&self, entity: &str, field: &str) -> bool {
        self.relations_of(entity).iter().any(|r| r == field)
    }

    pub fn relation(&self, entity: &str, relation: &str) -> Option<&RelationDef> {
        self.entity(entity)?.find_relation(relation)
    }

    /// Entity a relation leads to
    pub fn target_of(&self, entity: &str, relation: &str) -> Option<&EntityDef> {
        let relation = self.relation(entity, relation)?;
        self.entity(&relation.target)
    }

    pub fn field(&self, entity: &str, field: &str) -> Option<&FieldDef> {
        self.entity(entity)?.find_field(field)
    }

    pub fn has_field(&self, entity: &str, field: &str) -> bool {
        self.field(entity, field).is_some()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::from_catalog()
    }
}

/// `Product-Variants`, `product_variants`, `productVariants` -> `productvariants`
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}
