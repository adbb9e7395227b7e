//! Session-scoped entity registry and relation collector.

use std::collections::HashMap;

use super::normalize::entity_key;
use super::{Entity, EntityId, Relation};
use crate::{ExploreError, Result};

/// Entities discovered in one build, keyed by normalized name.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    index: HashMap<String, EntityId>,
    /// Seed whose name is still the caller's spelling.
    provisional: Option<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entity for `name`, creating it at `depth` if unseen.
    ///
    /// The boolean is true when the entity was created by this call. For an
    /// existing entity `depth` is ignored. A new entity has no distance yet;
    /// the caller assigns it from the discovering neighbor. The first source
    /// spelling of the seed replaces the one it was created with.
    pub fn get_or_create(&mut self, name: &str, depth: u32) -> Result<(EntityId, bool)> {
        let key = entity_key(name);
        if key.is_empty() {
            return Err(ExploreError::InvalidInput(format!(
                "entity name is blank: {:?}",
                name
            )));
        }

        if let Some(&id) = self.index.get(&key) {
            if self.provisional == Some(id) {
                self.entities[id.0].name = name.trim().to_string();
                self.provisional = None;
            }
            return Ok((id, false));
        }

        let id = EntityId(self.entities.len());
        self.entities.push(Entity {
            name: name.trim().to_string(),
            key: key.clone(),
            discovery_depth: depth,
            distance_from_origin: None,
        });
        self.index.insert(key, id);
        Ok((id, true))
    }

    /// Create the search origin: depth 0, distance 0.
    pub fn seed(&mut self, name: &str) -> Result<EntityId> {
        let (id, _) = self.get_or_create(name, 0)?;
        self.assign_distance(id, 0);
        self.provisional = Some(id);
        Ok(id)
    }

    /// Set the distance of `id` unless it already has one.
    /// Returns false when the entity was already placed.
    pub fn assign_distance(&mut self, id: EntityId, distance: u32) -> bool {
        let entity = &mut self.entities[id.0];
        if entity.distance_from_origin.is_some() {
            return false;
        }
        entity.distance_from_origin = Some(distance);
        true
    }

    /// Look up an entity by any form of its name.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.index.get(&entity_key(name)).copied()
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

/// Relations in discovery order. Duplicates are kept.
#[derive(Debug, Default)]
pub struct RelationCollector {
    relations: Vec<Relation>,
}

impl RelationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut registry = EntityRegistry::new();
        let (first, first_new) = registry.get_or_create("Ada_Lovelace", 1).unwrap();
        let (second, second_new) = registry.get_or_create("Ada_Lovelace", 3).unwrap();
        assert!(first_new);
        assert!(!second_new);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        // depth of a repeat lookup is ignored
        assert_eq!(registry.get(first).discovery_depth, 1);
    }

    #[test]
    fn test_name_variants_collapse() {
        let mut registry = EntityRegistry::new();
        let (a, _) = registry.get_or_create("Paul_Erdős", 1).unwrap();
        let (b, b_new) = registry.get_or_create("paul erdos", 2).unwrap();
        assert_eq!(a, b);
        assert!(!b_new);
        assert_eq!(registry.get(a).name, "Paul_Erdős");
        assert_eq!(registry.find("PAUL_ERDOS"), Some(a));
    }

    #[test]
    fn test_new_entity_has_no_distance() {
        let mut registry = EntityRegistry::new();
        let (id, _) = registry.get_or_create("Grace_Hopper", 2).unwrap();
        assert_eq!(registry.get(id).distance_from_origin, None);
    }

    #[test]
    fn test_distance_is_assigned_once() {
        let mut registry = EntityRegistry::new();
        let (id, _) = registry.get_or_create("Alan_Turing", 1).unwrap();
        assert!(registry.assign_distance(id, 2));
        assert!(!registry.assign_distance(id, 7));
        assert_eq!(registry.get(id).distance_from_origin, Some(2));
    }

    #[test]
    fn test_seed_is_origin() {
        let mut registry = EntityRegistry::new();
        let seed = registry.seed("Ada").unwrap();
        let entity = registry.get(seed);
        assert_eq!(entity.discovery_depth, 0);
        assert_eq!(entity.distance_from_origin, Some(0));
    }

    #[test]
    fn test_seed_takes_source_spelling_once() {
        let mut registry = EntityRegistry::new();
        let seed = registry.seed("ada_lovelace").unwrap();
        let (again, created) = registry.get_or_create("Ada_Lovelace", 1).unwrap();
        assert_eq!(again, seed);
        assert!(!created);
        assert_eq!(registry.get(seed).name, "Ada_Lovelace");
        assert_eq!(registry.get(seed).discovery_depth, 0);

        registry.get_or_create("ADA_LOVELACE", 2).unwrap();
        assert_eq!(registry.get(seed).name, "Ada_Lovelace");
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut registry = EntityRegistry::new();
        assert!(registry.get_or_create("  ", 1).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_collector_keeps_duplicates() {
        let mut registry = EntityRegistry::new();
        let (x, _) = registry.get_or_create("X", 0).unwrap();
        let (y, _) = registry.get_or_create("Y", 1).unwrap();
        let mut collector = RelationCollector::new();
        for _ in 0..2 {
            collector.push(Relation {
                from: x,
                label: "knows".to_string(),
                to: y,
            });
        }
        assert_eq!(collector.len(), 2);
    }
}
