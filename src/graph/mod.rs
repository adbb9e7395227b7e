//! Graph expansion: bounded, adaptive BFS over a relation source.
//!
//! A build starts from one seed entity and keeps querying the
//! [`RelationSource`](crate::source::RelationSource) for the entities it
//! discovers until the work queue is empty or the entity cap is reached.
//! Sparse results are retried once in aggressive mode.

mod engine;
pub mod normalize;
mod registry;
mod session;

pub use engine::ExpansionEngine;
pub use registry::{EntityRegistry, RelationCollector};
pub use session::{BuildSession, ExpansionLimits, GraphBuilder};

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Index of an entity inside one session's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// One discovered node.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Name as the source first spells it, in storage form.
    pub name: String,
    /// Normalized comparison key.
    pub key: String,
    /// Depth at which the entity was first enqueued.
    pub discovery_depth: u32,
    /// Approximate hop count from the seed, set once at discovery.
    pub distance_from_origin: Option<u32>,
}

/// One directed, labeled edge between two registered entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub from: EntityId,
    pub label: String,
    pub to: EntityId,
}

/// Per-entity payload of a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub discovery_depth: u32,
    pub distance_from_origin: u32,
}

/// Edge of a finished build, by entity name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub label: String,
    pub to: String,
}

/// Final node and edge sets of one build.
#[derive(Debug, Clone, Serialize)]
pub struct GraphResult {
    pub seed: String,
    pub entities: BTreeMap<String, GraphNode>,
    pub relations: Vec<GraphEdge>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// True when the result comes from the aggressive retry.
    pub aggressive: bool,
    /// True when the build deadline cut expansion short.
    pub truncated: bool,
}

impl GraphResult {
    /// Graph with no nodes, returned for blank input at the HTTP layer.
    pub fn empty() -> Self {
        Self {
            seed: String::new(),
            entities: BTreeMap::new(),
            relations: Vec::new(),
            elapsed: Duration::ZERO,
            aggressive: false,
            truncated: false,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}s for generating graph of {} nodes.",
            self.elapsed.as_secs_f64(),
            self.entities.len()
        )
    }
}

fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
