//! Nested eager-loading description produced by the populate resolver.
//!
//! Serialized form mirrors the ORM `include` clause:
//! `{"customer": {"include": {"orders": true}}, "items": true}`.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// What to do with one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inclusion {
    /// Load the relation, no further nesting
    Flat,
    /// Load the relation and the nested relations of its target
    Nested(InclusionSpec),
}

/// Ordered mapping relation name -> inclusion
///
/// Empty means a flat fetch of the base entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InclusionSpec {
    entries: Vec<(String, Inclusion)>,
}

impl InclusionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a relation. A name that is already present keeps its first value.
    pub fn insert(&mut self, relation: impl Into<String>, inclusion: Inclusion) {
        let relation = relation.into();
        if !self.contains(&relation) {
            self.entries.push((relation, inclusion));
        }
    }

    pub fn get(&self, relation: &str) -> Option<&Inclusion> {
        self.entries
            .iter()
            .find(|(name, _)| name == relation)
            .map(|(_, inclusion)| inclusion)
    }

    pub fn contains(&self, relation: &str) -> bool {
        self.get(relation).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Inclusion)> {
        self.entries
            .iter()
            .map(|(name, inclusion)| (name.as_str(), inclusion))
    }

    /// Number of relation hops described, 0 for an empty spec
    pub fn depth(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, inclusion)| match inclusion {
                Inclusion::Flat => 1,
                Inclusion::Nested(spec) => 1 + spec.depth(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl Serialize for Inclusion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Inclusion::Flat => serializer.serialize_bool(true),
            Inclusion::Nested(spec) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("include", spec)?;
                map.end()
            }
        }
    }
}

impl Serialize for InclusionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, inclusion) in &self.entries {
            map.serialize_entry(name, inclusion)?;
        }
        map.end()
    }
}
