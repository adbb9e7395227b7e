//! Relation source contract consumed by the expansion engine.
//!
//! A source answers one question: which `(from, label, to)` triples touch a
//! given entity name under a given [`QueryMode`]. The engine never assumes an
//! ordering beyond "stable per call".

mod memory;
mod sqlite;

pub use memory::MemoryRelationSource;
pub use sqlite::SqliteRelationSource;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Which directions and endpoint kinds to include for one anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryMode {
    /// Anchor as source with a person target, or anchor as target with a
    /// person source.
    OutgoingPersonOnly,
    /// Anchor as source, any target.
    OutgoingAny,
    /// Anchor as source or target, any entity on the other end.
    BothDirectionsAny,
    /// Anchor as source with a person target. Narrowest mode.
    OutgoingPersonOnlyStrict,
}

impl QueryMode {
    pub fn includes_incoming(self) -> bool {
        matches!(self, Self::OutgoingPersonOnly | Self::BothDirectionsAny)
    }

    pub fn persons_only(self) -> bool {
        matches!(self, Self::OutgoingPersonOnly | Self::OutgoingPersonOnlyStrict)
    }
}

/// A triple as returned by a source, names in storage form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelation {
    pub from: String,
    pub label: String,
    pub to: String,
}

impl RawRelation {
    pub fn new(from: impl Into<String>, label: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            label: label.into(),
            to: to.into(),
        }
    }
}

/// Lookup contract for relation data.
///
/// Failures must be reported as [`ExploreError::SourceUnavailable`](crate::ExploreError::SourceUnavailable)
/// so a build aborts instead of continuing with partial data.
pub trait RelationSource {
    /// Triples touching `name` under `mode`.
    fn find_relations(&self, name: &str, mode: QueryMode) -> Result<Vec<RawRelation>>;

    /// Whether `name` is a person-type entity.
    fn is_person(&self, name: &str) -> Result<bool>;
}

impl<S: RelationSource + ?Sized> RelationSource for &S {
    fn find_relations(&self, name: &str, mode: QueryMode) -> Result<Vec<RawRelation>> {
        (**self).find_relations(name, mode)
    }

    fn is_person(&self, name: &str) -> Result<bool> {
        (**self).is_person(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        assert!(QueryMode::OutgoingPersonOnly.includes_incoming());
        assert!(QueryMode::OutgoingPersonOnly.persons_only());
        assert!(!QueryMode::OutgoingAny.includes_incoming());
        assert!(!QueryMode::OutgoingAny.persons_only());
        assert!(QueryMode::BothDirectionsAny.includes_incoming());
        assert!(!QueryMode::BothDirectionsAny.persons_only());
        assert!(!QueryMode::OutgoingPersonOnlyStrict.includes_incoming());
        assert!(QueryMode::OutgoingPersonOnlyStrict.persons_only());
    }
}
