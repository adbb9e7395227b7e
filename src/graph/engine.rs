//! Expansion engine: adaptive breadth-first expansion over a relation source.
//!
//! Each expansion of an anchor queries the source once, merges the triples,
//! optionally widens a sparse depth-1 anchor, then drains the shared work
//! queue. Every dequeued anchor is expanded the same way, its own drain loop
//! running before control comes back, so nested expansions are kept on an
//! explicit frame stack instead of the call stack.

use std::time::Instant;

use super::normalize::entity_key;
use super::session::{BuildSession, ExpansionLimits};
use super::{EntityId, Relation};
use crate::source::{QueryMode, RawRelation, RelationSource};
use crate::{ExploreError, Result};

/// Aggressive anchors shallower than this are expanded in both directions.
const AGGRESSIVE_WIDE_DEPTH: u32 = 3;
/// Aggressive anchors shallower than this keep the wide person mode.
const AGGRESSIVE_PERSON_DEPTH: u32 = 4;
/// Regular anchors shallower than this may use the wide person mode.
const WIDE_DEPTH: u32 = 3;

/// Mode for the aggressive dequeue of a drain iteration, if any.
pub(crate) fn aggressive_mode(depth: u32) -> Option<QueryMode> {
    if depth < AGGRESSIVE_WIDE_DEPTH {
        Some(QueryMode::BothDirectionsAny)
    } else if depth < AGGRESSIVE_PERSON_DEPTH {
        Some(QueryMode::OutgoingPersonOnly)
    } else {
        None
    }
}

/// Mode for the regular dequeue of a drain iteration.
pub(crate) fn regular_mode(depth: u32, queue_len: usize, wide_queue_limit: usize) -> QueryMode {
    if depth < WIDE_DEPTH && queue_len < wide_queue_limit {
        QueryMode::OutgoingPersonOnly
    } else {
        QueryMode::OutgoingPersonOnlyStrict
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Query,
    Widen,
    WidenFurther,
    Drain,
    DrainRegular,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    anchor: EntityId,
    depth: u32,
    mode: QueryMode,
    aggressive: bool,
    stage: Stage,
}

impl Frame {
    fn new(anchor: EntityId, depth: u32, mode: QueryMode, aggressive: bool) -> Self {
        Self {
            anchor,
            depth,
            mode,
            aggressive,
            stage: Stage::Query,
        }
    }
}

/// Drives expansions for one build against one relation source.
pub struct ExpansionEngine<'a, S: ?Sized> {
    source: &'a S,
    limits: &'a ExpansionLimits,
    deadline: Option<Instant>,
}

impl<'a, S> ExpansionEngine<'a, S>
where
    S: RelationSource + ?Sized,
{
    pub fn new(source: &'a S, limits: &'a ExpansionLimits, deadline: Option<Instant>) -> Self {
        Self {
            source,
            limits,
            deadline,
        }
    }

    /// Expand `anchor` at `depth` with `mode`, then drain the session queue.
    ///
    /// Within one drain iteration an aggressive anchor may trigger two
    /// dequeues: the aggressive one and then the regular one.
    pub fn expand(
        &self,
        session: &mut BuildSession,
        anchor: EntityId,
        depth: u32,
        mode: QueryMode,
        aggressive: bool,
    ) -> Result<()> {
        let mut stack = vec![Frame::new(anchor, depth, mode, aggressive)];

        while let Some(frame) = stack.last().copied() {
            let top = stack.len() - 1;
            match frame.stage {
                Stage::Query => {
                    self.query(session, frame.anchor, frame.depth, frame.mode)?;
                    stack[top].stage = Stage::Widen;
                }
                Stage::Widen => {
                    stack[top].stage = Stage::Drain;
                    if frame.depth == 1
                        && frame.mode == QueryMode::OutgoingPersonOnlyStrict
                        && !self.expired(session)
                        && session.entity_count() < self.limits.early_floor
                    {
                        log::debug!(
                            "Widening {} after {} entities",
                            session.registry.get(frame.anchor).name,
                            session.entity_count()
                        );
                        stack[top].stage = Stage::WidenFurther;
                        stack.push(Frame::new(frame.anchor, 1, QueryMode::OutgoingPersonOnly, false));
                    }
                }
                Stage::WidenFurther => {
                    stack[top].stage = Stage::Drain;
                    if !self.expired(session) && session.entity_count() < self.limits.early_floor {
                        stack.push(Frame::new(frame.anchor, 1, QueryMode::BothDirectionsAny, false));
                    }
                }
                Stage::Drain => {
                    if self.expired(session)
                        || session.queue.is_empty()
                        || session.entity_count() >= self.limits.max_entities
                    {
                        stack.pop();
                        continue;
                    }
                    stack[top].stage = Stage::DrainRegular;
                    if frame.aggressive {
                        if let Some(mode) = aggressive_mode(frame.depth) {
                            if let Some(next) = session.queue.pop_front() {
                                stack.push(Frame::new(next, frame.depth + 1, mode, true));
                            }
                        }
                    }
                }
                Stage::DrainRegular => {
                    stack[top].stage = Stage::Drain;
                    let mode = regular_mode(frame.depth, session.queue.len(), self.limits.wide_queue_limit);
                    if let Some(next) = session.queue.pop_front() {
                        stack.push(Frame::new(next, frame.depth + 1, mode, false));
                    }
                }
            }
        }

        Ok(())
    }

    fn query(&self, session: &mut BuildSession, anchor: EntityId, depth: u32, mode: QueryMode) -> Result<()> {
        let (name, key) = {
            let entity = session.registry.get(anchor);
            (entity.name.clone(), entity.key.clone())
        };

        let triples = self.source.find_relations(&name, mode)?;
        session.queries += 1;
        log::debug!("depth {} {:?} {}: {} relations", depth, mode, name, triples.len());

        for triple in triples {
            self.merge(session, &name, &key, depth, triple)?;
        }
        Ok(())
    }

    fn merge(
        &self,
        session: &mut BuildSession,
        anchor_name: &str,
        anchor_key: &str,
        depth: u32,
        triple: RawRelation,
    ) -> Result<()> {
        let from_key = entity_key(&triple.from);
        let to_key = entity_key(&triple.to);
        if from_key.is_empty() || to_key.is_empty() {
            return Err(ExploreError::SourceUnavailable(format!(
                "relation with a blank endpoint returned for {}: {:?}",
                anchor_name, triple
            )));
        }
        if from_key != anchor_key && to_key != anchor_key {
            return Err(ExploreError::SourceUnavailable(format!(
                "relation not touching {} returned: {:?}",
                anchor_name, triple
            )));
        }

        let unseen = [&triple.from, &triple.to]
            .iter()
            .filter(|name| session.registry.find(name).is_none())
            .count();
        if session.entity_count() + unseen > self.limits.max_entities {
            session.dropped += 1;
            log::debug!("Entity cap reached, dropping {:?}", triple);
            return Ok(());
        }

        let registry = &mut session.registry;
        let (from, from_new) = registry.get_or_create(&triple.from, depth)?;
        let (to, to_new) = registry.get_or_create(&triple.to, depth)?;

        // The anchor end is always registered and placed, so at most one end
        // is new and its neighbor already has a distance.
        let discovered = match (from_new, to_new) {
            (true, false) => Some((from, to)),
            (false, true) => Some((to, from)),
            (false, false) => None,
            (true, true) => {
                return Err(ExploreError::SourceUnavailable(format!(
                    "relation with no known endpoint returned for {}: {:?}",
                    anchor_name, triple
                )))
            }
        };
        if let Some((new, known)) = discovered {
            let Some(distance) = registry.get(known).distance_from_origin else {
                return Err(ExploreError::SourceUnavailable(format!(
                    "{} was reached from unplaced entity {}",
                    registry.get(new).name,
                    registry.get(known).name
                )));
            };
            registry.assign_distance(new, distance + 1);
            session.queue.push_back(new);
        }

        session.collector.push(Relation {
            from,
            label: triple.label,
            to,
        });
        Ok(())
    }

    fn expired(&self, session: &mut BuildSession) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if Instant::now() < deadline {
            return false;
        }
        if !session.truncated {
            log::warn!("Build deadline reached with {} entities", session.entity_count());
            session.truncated = true;
        }
        true
    }
}
