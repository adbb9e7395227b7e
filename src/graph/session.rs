//! Build entry point: one session per request, one aggressive retry at most.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use super::engine::ExpansionEngine;
use super::normalize::{denormalize, entity_key};
use super::{EntityId, EntityRegistry, GraphEdge, GraphNode, GraphResult, RelationCollector};
use crate::source::{QueryMode, RelationSource};
use crate::{ExploreError, Result};

/// Size thresholds steering one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// Hard cap on entities per pass.
    pub max_entities: usize,
    /// A first pass smaller than this is redone in aggressive mode.
    pub quality_floor: usize,
    /// Below this many entities a depth-1 narrow expansion is widened.
    pub early_floor: usize,
    /// Shallow anchors keep the wide person mode while the queue is shorter than this.
    pub wide_queue_limit: usize,
    /// Stop expanding after this long and return what was found.
    pub timeout: Option<Duration>,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            max_entities: 100,
            quality_floor: 60,
            early_floor: 5,
            wide_queue_limit: 30,
            timeout: None,
        }
    }
}

/// Mutable state of one expansion pass.
#[derive(Debug, Default)]
pub struct BuildSession {
    pub registry: EntityRegistry,
    pub collector: RelationCollector,
    pub queue: VecDeque<EntityId>,
    /// Set when the deadline stopped the pass early.
    pub truncated: bool,
    /// Relation source calls made.
    pub queries: usize,
    /// Triples skipped because they would exceed the entity cap.
    pub dropped: usize,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    fn into_graph(self, seed: String, elapsed: Duration, aggressive: bool) -> GraphResult {
        let BuildSession {
            registry,
            collector,
            truncated,
            ..
        } = self;

        // the origin is registered first; report it as the source spells it
        let seed = registry.iter().next().map_or(seed, |origin| origin.name.clone());

        let entities: BTreeMap<String, GraphNode> = registry
            .iter()
            .map(|entity| {
                (
                    entity.name.clone(),
                    GraphNode {
                        discovery_depth: entity.discovery_depth,
                        distance_from_origin: entity.distance_from_origin.unwrap_or(0),
                    },
                )
            })
            .collect();

        let relations = collector
            .iter()
            .map(|relation| GraphEdge {
                from: registry.get(relation.from).name.clone(),
                label: relation.label.clone(),
                to: registry.get(relation.to).name.clone(),
            })
            .collect();

        GraphResult {
            seed,
            entities,
            relations,
            elapsed,
            aggressive,
            truncated,
        }
    }
}

/// Builds bounded graphs around a seed entity.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    limits: ExpansionLimits,
}

impl GraphBuilder {
    pub fn new(limits: ExpansionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ExpansionLimits {
        &self.limits
    }

    /// Build the graph around `seed`.
    ///
    /// A blank seed fails with [`ExploreError::InvalidSeed`]; a source failure
    /// aborts the build. A sparse first pass is discarded and redone once in
    /// aggressive mode, looking at the seed's links in both directions.
    pub fn build<S>(&self, source: &S, seed: &str) -> Result<GraphResult>
    where
        S: RelationSource + ?Sized,
    {
        let started = Instant::now();
        let seed_name = denormalize(seed);
        if entity_key(&seed_name).is_empty() {
            return Err(ExploreError::InvalidSeed(format!("{:?} is blank", seed)));
        }

        let deadline = self.limits.timeout.map(|timeout| started + timeout);
        let engine = ExpansionEngine::new(source, &self.limits, deadline);

        log::info!("Building graph for {}", seed_name);
        let mut session = self.run_pass(&engine, &seed_name, QueryMode::OutgoingPersonOnly, false)?;
        let mut aggressive = false;

        if session.entity_count() < self.limits.quality_floor && !session.truncated {
            log::info!(
                "Only {} entities around {} (floor {}), restarting in aggressive mode",
                session.entity_count(),
                seed_name,
                self.limits.quality_floor
            );
            session = self.run_pass(&engine, &seed_name, QueryMode::BothDirectionsAny, true)?;
            aggressive = true;
        }

        let elapsed = started.elapsed();
        log::info!(
            "Graph for {}: {} entities, {} relations, {} queries in {:?}{}",
            seed_name,
            session.entity_count(),
            session.collector.len(),
            session.queries,
            elapsed,
            if session.truncated { " (deadline reached)" } else { "" }
        );
        Ok(session.into_graph(seed_name, elapsed, aggressive))
    }

    fn run_pass<S>(
        &self,
        engine: &ExpansionEngine<'_, S>,
        seed: &str,
        mode: QueryMode,
        aggressive: bool,
    ) -> Result<BuildSession>
    where
        S: RelationSource + ?Sized,
    {
        let mut session = BuildSession::new();
        let origin = session.registry.seed(seed)?;
        engine.expand(&mut session, origin, 1, mode, aggressive)?;
        Ok(session)
    }
}
