//! Relation source over the `persons` / `properties` tables.

use rusqlite::{params, Connection};

use super::{QueryMode, RawRelation, RelationSource};
use crate::graph::normalize::entity_key;
use crate::{ExploreError, Result};

const OUTGOING_PERSONS: &str = "SELECT entity_name, property_name, link2 FROM properties \
     WHERE entity_key = ?1 AND link2 IS NOT NULL AND link2_is_person = 1 \
     ORDER BY property_id";

const INCOMING_FROM_PERSONS: &str = "SELECT entity_name, property_name, link2 FROM properties \
     WHERE link2_key = ?1 \
       AND EXISTS (SELECT 1 FROM persons WHERE persons.name_key = properties.entity_key) \
     ORDER BY property_id";

const OUTGOING_ANY: &str = "SELECT entity_name, property_name, link2 FROM properties \
     WHERE entity_key = ?1 AND link2 IS NOT NULL \
     ORDER BY property_id";

const BOTH_DIRECTIONS_ANY: &str = "SELECT entity_name, property_name, link2 FROM properties \
     WHERE link2_key = ?1 OR (entity_key = ?1 AND link2 IS NOT NULL) \
     ORDER BY property_id";

/// Relation source bound to one SQLite connection.
///
/// One build uses one connection; concurrent builds open their own through
/// [`Db::with_connection`](crate::db::Db::with_connection).
pub struct SqliteRelationSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRelationSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, key: &str) -> rusqlite::Result<Vec<RawRelation>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params![key], |row| {
            Ok(RawRelation {
                from: row.get(0)?,
                label: row.get(1)?,
                to: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    fn lookup(&self, key: &str, mode: QueryMode) -> rusqlite::Result<Vec<RawRelation>> {
        match mode {
            QueryMode::OutgoingPersonOnly => {
                let mut found = self.query(INCOMING_FROM_PERSONS, key)?;
                found.extend(self.query(OUTGOING_PERSONS, key)?);
                Ok(found)
            }
            QueryMode::OutgoingAny => self.query(OUTGOING_ANY, key),
            QueryMode::BothDirectionsAny => self.query(BOTH_DIRECTIONS_ANY, key),
            QueryMode::OutgoingPersonOnlyStrict => self.query(OUTGOING_PERSONS, key),
        }
    }
}

impl RelationSource for SqliteRelationSource<'_> {
    fn find_relations(&self, name: &str, mode: QueryMode) -> Result<Vec<RawRelation>> {
        let key = entity_key(name);
        let found = self.lookup(&key, mode).map_err(|e| {
            ExploreError::SourceUnavailable(format!("lookup of {} ({:?}) failed: {}", name, mode, e))
        })?;
        log::debug!("{:?} lookup for {} returned {} relations", mode, name, found.len());
        Ok(found)
    }

    fn is_person(&self, name: &str) -> Result<bool> {
        self.conn
            .prepare_cached("SELECT 1 FROM persons WHERE name_key = ?1")
            .and_then(|mut stmt| stmt.exists(params![entity_key(name)]))
            .map_err(|e| ExploreError::SourceUnavailable(format!("person lookup failed: {}", e)))
    }
}
