//! Load a relation dataset from plain text files.
//!
//! Persons file: one name per line. Properties file: tab-separated
//! `entity_name`, `property_name` and an optional `link2` target; a row
//! without a target is an attribute. Blank lines and `#` comments are skipped.

use std::io::BufRead;

use rusqlite::{params, Connection};

use crate::error::{ExploreError, Result};
use crate::graph::normalize::{denormalize, entity_key};

fn data_lines<R: BufRead>(reader: R) -> impl Iterator<Item = (usize, std::io::Result<String>)> {
    reader
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| match line {
            Ok(text) => {
                let trimmed = text.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            }
            Err(_) => true,
        })
}

/// Recompute `link2_is_person` after either table changed.
fn refresh_person_links(conn: &Connection) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE properties SET link2_is_person = \
         EXISTS (SELECT 1 FROM persons WHERE persons.name_key = properties.link2_key)",
        [],
    )?;
    Ok(updated)
}

/// Insert person names. Returns the number of new persons.
pub fn import_persons<R: BufRead>(conn: &mut Connection, reader: R) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO persons (name_key, name) VALUES (?1, ?2)")?;
        for (line_no, line) in data_lines(reader) {
            let name = denormalize(&line?);
            let key = entity_key(&name);
            if key.is_empty() {
                return Err(ExploreError::Parse(format!("line {}: blank person name", line_no)));
            }
            inserted += stmt.execute(params![key, name])?;
        }
    }
    refresh_person_links(&tx)?;
    tx.commit()?;

    log::info!("Imported {} persons", inserted);
    Ok(inserted)
}

/// Insert property rows. Returns the number of rows written.
pub fn import_properties<R: BufRead>(conn: &mut Connection, reader: R) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO properties (entity_name, entity_key, property_name, link2, link2_key) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (line_no, line) in data_lines(reader) {
            let line = line?;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 || fields.len() > 3 {
                return Err(ExploreError::Parse(format!(
                    "line {}: expected entity_name<TAB>property_name[<TAB>link2], got {} fields",
                    line_no,
                    fields.len()
                )));
            }

            let entity = denormalize(fields[0]);
            let key = entity_key(&entity);
            let property = fields[1].trim();
            if key.is_empty() || property.is_empty() {
                return Err(ExploreError::Parse(format!(
                    "line {}: entity and property names must not be blank",
                    line_no
                )));
            }

            let link2 = fields.get(2).map(|s| denormalize(s)).filter(|s| !s.is_empty());
            let link2_key = link2.as_deref().map(entity_key);

            inserted += stmt.execute(params![entity, key, property, link2, link2_key])?;
        }
    }
    refresh_person_links(&tx)?;
    tx.commit()?;

    log::info!("Imported {} property rows", inserted);
    Ok(inserted)
}
