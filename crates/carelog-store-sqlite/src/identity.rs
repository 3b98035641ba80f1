//! Identity resolution: find-or-create and duplicate merging.
//!
//! These are synchronous helpers run inside a `tokio_rusqlite` closure. The
//! caller owns the transaction for find-or-create (so imports can share it);
//! merging opens its own.

use carelog_core::person::{MergeOutcome, PersonId, normalize_national_id};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use tracing::{debug, warn};

use crate::schema::{ABSENT_NATIONAL_ID, DEPENDENT_TABLES};

// ─── Find-or-create ──────────────────────────────────────────────────────────

/// How an incoming `(name, national_id)` pair was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  Existing(PersonId),
  /// An existing person without an id received the supplied one.
  Backfilled(PersonId),
  Created(PersonId),
}

impl Resolution {
  pub fn person_id(self) -> PersonId {
    match self {
      Self::Existing(id) | Self::Backfilled(id) | Self::Created(id) => id,
    }
  }
}

/// Resolve `name` (already trimmed, non-empty) and an optional national id
/// (already normalised) to a person.
pub fn find_or_create(
  conn: &Connection,
  name: &str,
  national_id: Option<&str>,
  now: &str,
) -> rusqlite::Result<Resolution> {
  let resolution = match national_id {
    Some(national_id) => {
      if let Some(id) = find_by_national_id(conn, national_id)? {
        Resolution::Existing(id)
      } else if let Some(id) = find_by_name_without_id(conn, name)? {
        conn.execute(
          "UPDATE persons SET national_id = ?1, updated_at = ?2 WHERE id = ?3",
          params![national_id, now, id],
        )?;
        Resolution::Backfilled(id)
      } else {
        Resolution::Created(insert_person(conn, name, Some(national_id), now)?)
      }
    }
    None => {
      if let Some(id) = find_by_name_without_id(conn, name)? {
        Resolution::Existing(id)
      } else if let Some(id) = find_by_name(conn, name)? {
        Resolution::Existing(id)
      } else {
        Resolution::Created(insert_person(conn, name, None, now)?)
      }
    }
  };

  debug!(name, ?resolution, "resolved person identity");
  Ok(resolution)
}

fn find_by_national_id(conn: &Connection, national_id: &str) -> rusqlite::Result<Option<PersonId>> {
  conn
    .query_row(
      "SELECT id FROM persons WHERE national_id = ?1 ORDER BY id LIMIT 1",
      params![national_id],
      |row| row.get(0),
    )
    .optional()
}

fn find_by_name_without_id(conn: &Connection, name: &str) -> rusqlite::Result<Option<PersonId>> {
  conn
    .query_row(
      &format!(
        "SELECT id FROM persons WHERE name = ?1 AND {ABSENT_NATIONAL_ID} ORDER BY id LIMIT 1"
      ),
      params![name],
      |row| row.get(0),
    )
    .optional()
}

fn find_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<PersonId>> {
  conn
    .query_row(
      "SELECT id FROM persons WHERE name = ?1 ORDER BY id LIMIT 1",
      params![name],
      |row| row.get(0),
    )
    .optional()
}

fn insert_person(
  conn: &Connection,
  name: &str,
  national_id: Option<&str>,
  now: &str,
) -> rusqlite::Result<PersonId> {
  conn.execute(
    "INSERT INTO persons (name, national_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    params![name, national_id, now],
  )?;
  Ok(conn.last_insert_rowid())
}

// ─── Duplicate groups ────────────────────────────────────────────────────────

/// `(name, ascending ids)` for every name held by more than one person.
pub fn duplicate_groups(conn: &Connection) -> rusqlite::Result<Vec<(String, Vec<PersonId>)>> {
  let mut stmt = conn.prepare(
    "SELECT name, id FROM persons
     WHERE name IN (SELECT name FROM persons GROUP BY name HAVING COUNT(*) > 1)
     ORDER BY name, id",
  )?;
  let rows = stmt
    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, PersonId>(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut groups: Vec<(String, Vec<PersonId>)> = Vec::new();
  for (name, id) in rows {
    match groups.last_mut() {
      Some((current, ids)) if *current == name => ids.push(id),
      _ => groups.push((name, vec![id])),
    }
  }
  Ok(groups)
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Merge every person named `name` into one primary, in a single IMMEDIATE
/// transaction. Returns `None` if nobody has that name.
///
/// The primary is the lowest-id row holding a national id, else the lowest-id
/// row. Rows holding a different national id are left untouched and reported
/// as conflicts. Every other row has its dependent records moved to the
/// primary and is then deleted. Any failure rolls the whole group back.
pub fn merge_group(
  conn: &mut Connection,
  name: &str,
  now: &str,
) -> rusqlite::Result<Option<MergeOutcome>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let group: Vec<(PersonId, Option<String>)> = {
    let mut stmt =
      tx.prepare("SELECT id, national_id FROM persons WHERE name = ?1 ORDER BY id")?;
    stmt
      .query_map(params![name], |row| {
        let raw: Option<String> = row.get(1)?;
        Ok((row.get(0)?, normalize_national_id(raw.as_deref())))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let Some((primary_id, primary_national_id)) = group
    .iter()
    .find(|(_, national_id)| national_id.is_some())
    .or_else(|| group.first())
    .cloned()
  else {
    return Ok(None);
  };

  let mut merged_ids = Vec::new();
  let mut conflicting_ids = Vec::new();

  for (id, national_id) in &group {
    if *id == primary_id {
      continue;
    }
    if national_id.is_some() && *national_id != primary_national_id {
      conflicting_ids.push(*id);
      continue;
    }

    for table in DEPENDENT_TABLES {
      tx.execute(
        &format!("UPDATE {table} SET person_id = ?1 WHERE person_id = ?2"),
        params![primary_id, id],
      )?;
    }
    tx.execute("DELETE FROM persons WHERE id = ?1", params![id])?;
    merged_ids.push(*id);
  }

  if !merged_ids.is_empty() {
    tx.execute(
      "UPDATE persons SET updated_at = ?1 WHERE id = ?2",
      params![now, primary_id],
    )?;
  }

  tx.commit()?;

  if !conflicting_ids.is_empty() {
    warn!(
      name,
      primary_id,
      ?conflicting_ids,
      "persons share a name but hold different national ids; left unmerged"
    );
  }

  Ok(Some(MergeOutcome {
    name: name.to_owned(),
    primary_id,
    merged_ids,
    conflicting_ids,
  }))
}
