//! Person-name autocomplete by key prefix.

use lru::LruCache;
use rusqlite::{params, Connection};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::db::Db;
use crate::error::Result;
use crate::graph::normalize::{display_name, entity_key};

/// Escape LIKE wildcards; keys use `_` as their word separator.
fn like_prefix(key: &str) -> String {
    let mut pattern = String::with_capacity(key.len() + 1);
    for c in key.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Up to `limit` person names whose key starts with the key of `term`, in display form.
pub fn suggest_persons(conn: &Connection, term: &str, limit: usize) -> Result<Vec<String>> {
    let key = entity_key(term);
    if key.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare_cached(
        "SELECT name FROM persons WHERE name_key LIKE ?1 ESCAPE '\\' ORDER BY name_key LIMIT ?2",
    )?;
    let names = stmt
        .query_map(params![like_prefix(&key), limit as i64], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(names.iter().map(|name| display_name(name)).collect())
}

/// Autocomplete service with an LRU cache of recent prefixes.
pub struct Suggester {
    db: Db,
    limit: usize,
    cache: Mutex<LruCache<String, Vec<String>>>,
}

impl Suggester {
    pub fn new(db: Db, limit: usize, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            db,
            limit,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn suggest(&self, term: &str) -> Result<Vec<String>> {
        let key = entity_key(term);
        if key.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(hit) = self.cache.lock().unwrap().get(&key).cloned() {
            log::debug!("Autocomplete cache hit for {}", key);
            return Ok(hit);
        }

        let limit = self.limit;
        let lookup = key.clone();
        let names = self
            .db
            .with_connection(move |conn| suggest_persons(conn, &lookup, limit))
            .await?;

        self.cache.lock().unwrap().put(key, names.clone());
        Ok(names)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}
