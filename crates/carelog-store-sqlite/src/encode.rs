//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and import ids as hyphenated
//! lowercase UUIDs. Row ids are SQLite integers and need no encoding.

use carelog_core::person::{
  CheckInRecord, FamilyInfo, MedicalInfo, Person, PersonId, Profile,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  Ok(s.map(Uuid::parse_str).transpose()?)
}

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub id:          PersonId,
  pub name:        String,
  pub national_id: Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawPerson {
  pub const COLUMNS: &'static str = "id, name, national_id, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      national_id: row.get(2)?,
      created_at:  row.get(3)?,
      updated_at:  row.get(4)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:          self.id,
      name:        self.name,
      national_id: carelog_core::person::normalize_national_id(
        self.national_id.as_deref(),
      ),
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub id:          i64,
  pub person_id:   PersonId,
  pub import_id:   Option<String>,
  pub gender:      Option<String>,
  pub birth_date:  Option<String>,
  pub hometown:    Option<String>,
  pub ethnicity:   Option<String>,
  pub recorded_at: String,
}

impl RawProfile {
  pub const COLUMNS: &'static str =
    "id, person_id, import_id, gender, birth_date, hometown, ethnicity, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      person_id:   row.get(1)?,
      import_id:   row.get(2)?,
      gender:      row.get(3)?,
      birth_date:  row.get(4)?,
      hometown:    row.get(5)?,
      ethnicity:   row.get(6)?,
      recorded_at: row.get(7)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id:  self.id,
      person_id:   self.person_id,
      import_id:   decode_opt_uuid(self.import_id.as_deref())?,
      gender:      self.gender,
      birth_date:  self.birth_date,
      hometown:    self.hometown,
      ethnicity:   self.ethnicity,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `check_in_records` row.
pub struct RawCheckIn {
  pub id:              i64,
  pub person_id:       PersonId,
  pub import_id:       Option<String>,
  pub check_in_date:   Option<String>,
  pub attending_staff: Option<String>,
  pub notes:           Option<String>,
  pub recorded_at:     String,
}

impl RawCheckIn {
  pub const COLUMNS: &'static str =
    "id, person_id, import_id, check_in_date, attending_staff, notes, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      person_id:       row.get(1)?,
      import_id:       row.get(2)?,
      check_in_date:   row.get(3)?,
      attending_staff: row.get(4)?,
      notes:           row.get(5)?,
      recorded_at:     row.get(6)?,
    })
  }

  pub fn into_check_in(self) -> Result<CheckInRecord> {
    Ok(CheckInRecord {
      check_in_id:     self.id,
      person_id:       self.person_id,
      import_id:       decode_opt_uuid(self.import_id.as_deref())?,
      check_in_date:   self.check_in_date,
      attending_staff: self.attending_staff,
      notes:           self.notes,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `medical_info` row.
pub struct RawMedicalInfo {
  pub id:          i64,
  pub person_id:   PersonId,
  pub import_id:   Option<String>,
  pub diagnosis:   Option<String>,
  pub record_date: Option<String>,
  pub treatment:   Option<String>,
  pub recorded_at: String,
}

impl RawMedicalInfo {
  pub const COLUMNS: &'static str =
    "id, person_id, import_id, diagnosis, record_date, treatment, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      person_id:   row.get(1)?,
      import_id:   row.get(2)?,
      diagnosis:   row.get(3)?,
      record_date: row.get(4)?,
      treatment:   row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_medical_info(self) -> Result<MedicalInfo> {
    Ok(MedicalInfo {
      medical_id:  self.id,
      person_id:   self.person_id,
      import_id:   decode_opt_uuid(self.import_id.as_deref())?,
      diagnosis:   self.diagnosis,
      record_date: self.record_date,
      treatment:   self.treatment,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `family_info` row.
pub struct RawFamilyInfo {
  pub id:            i64,
  pub person_id:     PersonId,
  pub import_id:     Option<String>,
  pub guardian_name: Option<String>,
  pub relationship:  Option<String>,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub recorded_at:   String,
}

impl RawFamilyInfo {
  pub const COLUMNS: &'static str =
    "id, person_id, import_id, guardian_name, relationship, phone, address, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      person_id:     row.get(1)?,
      import_id:     row.get(2)?,
      guardian_name: row.get(3)?,
      relationship:  row.get(4)?,
      phone:         row.get(5)?,
      address:       row.get(6)?,
      recorded_at:   row.get(7)?,
    })
  }

  pub fn into_family_info(self) -> Result<FamilyInfo> {
    Ok(FamilyInfo {
      family_id:     self.id,
      person_id:     self.person_id,
      import_id:     decode_opt_uuid(self.import_id.as_deref())?,
      guardian_name: self.guardian_name,
      relationship:  self.relationship,
      phone:         self.phone,
      address:       self.address,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}
