//! Populate + depth -> nested inclusion spec
//!
//! Requested relation names are checked against the registry; unknown names
//! are dropped. Each kept relation is expanded through its target entity's
//! own relations until the depth is used up.

use std::sync::Arc;

use contracts::shared::query::{Inclusion, InclusionSpec};
use serde::Deserialize;

use crate::shared::relations::{EntityRegistry, RelationDef};

/// Depth ceilings for eager loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DepthLimits {
    /// Used when depth is missing or not positive
    pub default_depth: i64,
    /// Ceiling when the caller named specific relations
    pub max_specific_depth: i64,
    /// Ceiling when the caller asked for every relation
    pub max_all_relations_depth: i64,
}

impl Default for DepthLimits {
    fn default() -> Self {
        Self {
            default_depth: 1,
            max_specific_depth: 5,
            max_all_relations_depth: 3,
        }
    }
}

#[derive(Clone)]
pub struct PopulateResolver {
    registry: Arc<EntityRegistry>,
    limits: DepthLimits,
}

impl PopulateResolver {
    pub fn new(registry: Arc<EntityRegistry>, limits: DepthLimits) -> Self {
        Self { registry, limits }
    }

    pub fn limits(&self) -> DepthLimits {
        self.limits
    }

    /// Build the inclusion spec for `entity`.
    ///
    /// `relation_names` empty with `depth > 1` means every relation of the
    /// entity, capped at `max_all_relations_depth`. Explicit names are capped
    /// at `max_specific_depth`.
    pub fn build_inclusion<S: AsRef<str>>(
        &self,
        entity: &str,
        relation_names: &[S],
        depth: i64,
    ) -> InclusionSpec {
        let depth = if depth <= 0 {
            self.limits.default_depth.max(1)
        } else {
            depth
        };

        let Some(def) = self.registry.entity(entity) else {
            return InclusionSpec::new();
        };

        if !relation_names.is_empty() {
            let valid: Vec<&RelationDef> = relation_names
                .iter()
                .filter_map(|name| {
                    let name = name.as_ref();
                    let relation = def.find_relation(name);
                    if relation.is_none() {
                        tracing::debug!("Populate '{}' is not a relation of {}, dropped", name, def.name);
                    }
                    relation
                })
                .collect();
            if valid.is_empty() {
                return InclusionSpec::new();
            }
            let limited = cap(depth, self.limits.max_specific_depth);
            self.build_level(valid, limited, 1)
        } else if depth > 1 {
            let limited = cap(depth, self.limits.max_all_relations_depth);
            self.build_level(def.relations.iter().collect(), limited, 1)
        } else {
            InclusionSpec::new()
        }
    }

    fn build_level(&self, relations: Vec<&RelationDef>, depth: i64, current: i64) -> InclusionSpec {
        let mut spec = InclusionSpec::new();
        for relation in relations {
            if spec.contains(&relation.name) {
                continue;
            }
            let inclusion = if current >= depth {
                Inclusion::Flat
            } else {
                match self.registry.entity(&relation.target) {
                    Some(target) if !target.relations.is_empty() => Inclusion::Nested(
                        self.build_level(target.relations.iter().collect(), depth, current + 1),
                    ),
                    _ => Inclusion::Flat,
                }
            };
            spec.insert(relation.name.clone(), inclusion);
        }
        spec
    }
}

/// `depth` limited to `[1, ceiling]`
fn cap(depth: i64, ceiling: i64) -> i64 {
    depth.min(ceiling).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::relations::{EntityDef, FieldKind};

    fn resolver() -> PopulateResolver {
        PopulateResolver::new(Arc::new(EntityRegistry::from_catalog()), DepthLimits::default())
    }

    fn all_leaves_flat(spec: &InclusionSpec) -> bool {
        spec.iter().all(|(_, inclusion)| *inclusion == Inclusion::Flat)
    }

    #[test]
    fn test_depth_one_gives_flat_markers() {
        let spec = resolver().build_inclusion("order", &["customer", "items"], 1);
        assert_eq!(spec.keys().collect::<Vec<_>>(), vec!["customer", "items"]);
        assert!(all_leaves_flat(&spec));
    }

    #[test]
    fn test_non_positive_depth_uses_default() {
        let r = resolver();
        assert_eq!(
            r.build_inclusion("order", &["customer"], 0),
            r.build_inclusion("order", &["customer"], 1)
        );
        assert!(all_leaves_flat(&r.build_inclusion("order", &["customer"], -4)));
    }

    #[test]
    fn test_unknown_names_are_dropped() {
        let spec = resolver().build_inclusion("order", &["customer", "status", "ghost"], 2);
        assert_eq!(spec.keys().collect::<Vec<_>>(), vec!["customer"]);
        assert!(resolver().build_inclusion("order", &["ghost"], 3).is_empty());
        assert!(resolver().build_inclusion("spaceship", &["customer"], 3).is_empty());
    }

    #[test]
    fn test_depth_two_expands_through_targets() {
        let spec = resolver().build_inclusion("order", &["customer", "items"], 2);

        let Some(Inclusion::Nested(customer)) = spec.get("customer") else {
            panic!("customer should be nested");
        };
        assert_eq!(customer.keys().collect::<Vec<_>>(), vec!["addresses", "orders"]);
        assert!(all_leaves_flat(customer));

        let Some(Inclusion::Nested(items)) = spec.get("items") else {
            panic!("items should be nested");
        };
        assert_eq!(items.keys().collect::<Vec<_>>(), vec!["order", "productVariant"]);
        assert!(all_leaves_flat(items));
    }

    #[test]
    fn test_wildcard_covers_all_relations() {
        let r = resolver();
        let spec = r.build_inclusion::<&str>("order", &[], 2);
        assert_eq!(
            spec.keys().collect::<Vec<_>>(),
            vec![
                "customer",
                "warehouse",
                "billingAddress",
                "shippingAddress",
                "approver",
                "creator",
                "items",
                "shipments",
            ]
        );
        assert_eq!(spec.depth(), 2);
    }

    #[test]
    fn test_wildcard_with_depth_one_is_empty() {
        assert!(resolver().build_inclusion::<&str>("order", &[], 1).is_empty());
    }

    #[test]
    fn test_wildcard_is_capped_at_all_relations_ceiling() {
        let spec = resolver().build_inclusion::<&str>("order", &[], 50);
        assert_eq!(spec.depth(), 3);
    }

    #[test]
    fn test_specific_is_capped_at_specific_ceiling() {
        let spec = resolver().build_inclusion("order", &["customer"], 50);
        assert_eq!(spec.depth(), 5);
    }

    #[test]
    fn test_ceilings_are_configurable() {
        let limits = DepthLimits {
            default_depth: 1,
            max_specific_depth: 2,
            max_all_relations_depth: 2,
        };
        let r = PopulateResolver::new(Arc::new(EntityRegistry::from_catalog()), limits);
        assert_eq!(r.build_inclusion("order", &["customer"], 9).depth(), 2);
        assert_eq!(r.build_inclusion::<&str>("order", &[], 9).depth(), 2);
    }

    #[test]
    fn test_relation_without_nested_relations_degrades_to_flat() {
        let registry = EntityRegistry::new(vec![
            EntityDef::new("ticket", "tickets", "tickets")
                .field("tagId", FieldKind::Text)
                .belongs_to("tag", "tag", "tagId"),
            EntityDef::new("tag", "tags", "tags"),
        ]);
        let r = PopulateResolver::new(Arc::new(registry), DepthLimits::default());
        let spec = r.build_inclusion("ticket", &["tag"], 4);
        assert_eq!(spec.get("tag"), Some(&Inclusion::Flat));
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let spec = resolver().build_inclusion("order", &["items", "items"], 1);
        assert_eq!(spec.len(), 1);
    }

    #[test]
    fn test_same_input_same_output() {
        let r = resolver();
        assert_eq!(
            r.build_inclusion("warehouse", &["manager", "orders"], 3),
            r.build_inclusion("warehouse", &["manager", "orders"], 3)
        );
    }
}
