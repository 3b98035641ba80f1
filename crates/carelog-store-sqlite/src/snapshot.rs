//! Reads the flat row sets behind [`StatsSnapshot`] in one transaction.

use carelog_core::{
  person::normalize_national_id,
  projection::{CheckInEvent, MedicalEvent, PersonRow, StatsSnapshot},
};
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn read_snapshot(conn: &mut Connection, today: NaiveDate) -> rusqlite::Result<StatsSnapshot> {
  let tx = conn.transaction()?;

  let persons = {
    let mut stmt = tx.prepare(
      "SELECT person_id, name, national_id, gender, birth_date, hometown, ethnicity
       FROM person_latest_profile
       ORDER BY person_id",
    )?;
    stmt
      .query_map([], |row| {
        let national_id: Option<String> = row.get(2)?;
        Ok(PersonRow {
          person_id:   row.get(0)?,
          name:        row.get(1)?,
          national_id: normalize_national_id(national_id.as_deref()),
          gender:      row.get(3)?,
          birth_date:  row.get(4)?,
          hometown:    row.get(5)?,
          ethnicity:   row.get(6)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let medical = {
    let mut stmt = tx.prepare(
      "SELECT id, person_id, TRIM(diagnosis), record_date
       FROM medical_info
       WHERE TRIM(COALESCE(diagnosis, '')) != ''
       ORDER BY id",
    )?;
    stmt
      .query_map([], |row| {
        Ok(MedicalEvent {
          medical_id:  row.get(0)?,
          person_id:   row.get(1)?,
          diagnosis:   row.get(2)?,
          record_date: row.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let check_ins = {
    let mut stmt = tx.prepare(
      "SELECT id, person_id, check_in_date, NULLIF(TRIM(attending_staff), '')
       FROM check_in_records
       ORDER BY id",
    )?;
    stmt
      .query_map([], |row| {
        Ok(CheckInEvent {
          check_in_id:     row.get(0)?,
          person_id:       row.get(1)?,
          check_in_date:   row.get(2)?,
          attending_staff: row.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  tx.commit()?;
  Ok(StatsSnapshot::build(today, persons, medical, check_ins))
}
