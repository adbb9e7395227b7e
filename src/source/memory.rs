//! In-memory relation dataset with the same mode semantics as the SQLite source.

use std::collections::HashSet;

use super::{QueryMode, RawRelation, RelationSource};
use crate::graph::normalize::entity_key;
use crate::Result;

struct Row {
    relation: RawRelation,
    from_key: String,
    to_key: String,
}

/// Relation dataset held in memory, for embedding and tests.
#[derive(Default)]
pub struct MemoryRelationSource {
    rows: Vec<Row>,
    persons: HashSet<String>,
}

impl MemoryRelationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as person-type.
    pub fn add_person(&mut self, name: &str) -> &mut Self {
        self.persons.insert(entity_key(name));
        self
    }

    pub fn add_relation(&mut self, from: &str, label: &str, to: &str) -> &mut Self {
        self.rows.push(Row {
            relation: RawRelation::new(from, label, to),
            from_key: entity_key(from),
            to_key: entity_key(to),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn outgoing<'a>(
        &'a self,
        key: &'a str,
        persons_only: bool,
    ) -> impl Iterator<Item = &'a RawRelation> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.from_key == key && (!persons_only || self.persons.contains(&row.to_key)))
            .map(|row| &row.relation)
    }

    fn incoming<'a>(
        &'a self,
        key: &'a str,
        persons_only: bool,
    ) -> impl Iterator<Item = &'a RawRelation> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.to_key == key && (!persons_only || self.persons.contains(&row.from_key)))
            .map(|row| &row.relation)
    }
}

impl RelationSource for MemoryRelationSource {
    fn find_relations(&self, name: &str, mode: QueryMode) -> Result<Vec<RawRelation>> {
        let key = entity_key(name);
        let found: Vec<RawRelation> = match mode {
            QueryMode::OutgoingPersonOnly => self
                .incoming(&key, true)
                .chain(self.outgoing(&key, true))
                .cloned()
                .collect(),
            QueryMode::OutgoingAny => self.outgoing(&key, false).cloned().collect(),
            QueryMode::BothDirectionsAny => self
                .rows
                .iter()
                .filter(|row| row.from_key == key || row.to_key == key)
                .map(|row| row.relation.clone())
                .collect(),
            QueryMode::OutgoingPersonOnlyStrict => self.outgoing(&key, true).cloned().collect(),
        };
        Ok(found)
    }

    fn is_person(&self, name: &str) -> Result<bool> {
        Ok(self.persons.contains(&entity_key(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> MemoryRelationSource {
        let mut source = MemoryRelationSource::new();
        source
            .add_person("Ada_Lovelace")
            .add_person("Charles_Babbage")
            .add_person("Lord_Byron")
            .add_relation("Ada_Lovelace", "father", "Lord_Byron")
            .add_relation("Ada_Lovelace", "collaborator", "Charles_Babbage")
            .add_relation("Ada_Lovelace", "known_for", "Analytical_Engine")
            .add_relation("Lord_Byron", "child", "Ada_Lovelace")
            .add_relation("Analytical_Engine", "designer", "Ada_Lovelace")
            .add_relation("London", "notable_resident", "Ada_Lovelace");
        source
    }

    fn targets(found: &[RawRelation]) -> Vec<(&str, &str)> {
        found.iter().map(|r| (r.from.as_str(), r.to.as_str())).collect()
    }

    #[test]
    fn test_strict_is_outgoing_to_persons() {
        let found = dataset()
            .find_relations("Ada Lovelace", QueryMode::OutgoingPersonOnlyStrict)
            .unwrap();
        assert_eq!(
            targets(&found),
            vec![("Ada_Lovelace", "Lord_Byron"), ("Ada_Lovelace", "Charles_Babbage")]
        );
    }

    #[test]
    fn test_person_only_lists_incoming_first() {
        let found = dataset()
            .find_relations("Ada_Lovelace", QueryMode::OutgoingPersonOnly)
            .unwrap();
        assert_eq!(
            targets(&found),
            vec![
                ("Lord_Byron", "Ada_Lovelace"),
                ("Ada_Lovelace", "Lord_Byron"),
                ("Ada_Lovelace", "Charles_Babbage"),
            ]
        );
    }

    #[test]
    fn test_outgoing_any_includes_non_persons() {
        let found = dataset()
            .find_relations("ada_lovelace", QueryMode::OutgoingAny)
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|r| r.from == "Ada_Lovelace"));
        assert!(found.iter().any(|r| r.to == "Analytical_Engine"));
    }

    #[test]
    fn test_both_directions_any() {
        let found = dataset()
            .find_relations("Ada_Lovelace", QueryMode::BothDirectionsAny)
            .unwrap();
        assert_eq!(found.len(), 6);
        assert!(found.iter().any(|r| r.from == "London"));
    }

    #[test]
    fn test_is_person() {
        let source = dataset();
        assert!(source.is_person("charles babbage").unwrap());
        assert!(!source.is_person("London").unwrap());
    }
}
