//! Inserts for per-person records and the per-row import unit.

use carelog_core::{
  import::ImportRecord,
  person::{NewCheckIn, NewFamilyInfo, NewMedicalInfo, NewProfile, PersonId},
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  encode::encode_uuid,
  identity::{self, Resolution},
};

pub fn person_exists(conn: &Connection, id: PersonId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM persons WHERE id = ?1", params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

pub fn insert_profile(conn: &Connection, p: &NewProfile, now: &str) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO profiles (
       person_id, import_id, gender, birth_date, hometown, ethnicity, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      p.person_id,
      p.import_id.map(encode_uuid),
      p.gender,
      p.birth_date,
      p.hometown,
      p.ethnicity,
      now,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn insert_check_in(conn: &Connection, c: &NewCheckIn, now: &str) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO check_in_records (
       person_id, import_id, check_in_date, attending_staff, notes, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      c.person_id,
      c.import_id.map(encode_uuid),
      c.check_in_date,
      c.attending_staff,
      c.notes,
      now,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn insert_medical_info(
  conn: &Connection,
  m: &NewMedicalInfo,
  now: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO medical_info (
       person_id, import_id, diagnosis, record_date, treatment, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      m.person_id,
      m.import_id.map(encode_uuid),
      m.diagnosis,
      m.record_date,
      m.treatment,
      now,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn insert_family_info(
  conn: &Connection,
  f: &NewFamilyInfo,
  now: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO family_info (
       person_id, import_id, guardian_name, relationship, phone, address, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      f.person_id,
      f.import_id.map(encode_uuid),
      f.guardian_name,
      f.relationship,
      f.phone,
      f.address,
      now,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Resolve one import row and write everything it carries, atomically.
///
/// `name` and `national_id` are the record's normalised identity fields.
pub fn import_one(
  conn: &mut Connection,
  record: &ImportRecord,
  name: &str,
  national_id: Option<&str>,
  import_id: Uuid,
  now: &str,
) -> rusqlite::Result<Resolution> {
  let tx = conn.transaction()?;

  let resolution = identity::find_or_create(&tx, name, national_id, now)?;
  let person_id = resolution.person_id();

  insert_profile(&tx, &record.profile(person_id, import_id), now)?;
  if let Some(check_in) = record.check_in(person_id, import_id) {
    insert_check_in(&tx, &check_in, now)?;
  }
  if let Some(medical) = record.medical_info(person_id, import_id) {
    insert_medical_info(&tx, &medical, now)?;
  }
  if let Some(family) = record.family_info(person_id, import_id) {
    insert_family_info(&tx, &family, now)?;
  }

  tx.commit()?;
  Ok(resolution)
}
