//! Person identity and the per-person record types that hang off it.
//!
//! A person is the canonical identity for one individual. Everything else
//! (profiles, check-ins, medical and family information) is owned by exactly
//! one person and follows it through merges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Surrogate key of a [`Person`]. Assigned in ascending insertion order, so
/// "lowest id" means "oldest record".
pub type PersonId = i64;

/// National-id values that spreadsheets use to mean "not known".
const PLACEHOLDER_IDS: &[&str] = &["", "-"];

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Trim a person name, rejecting names that are empty afterwards.
pub fn normalize_name(raw: &str) -> Result<String> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(Error::EmptyName);
  }
  Ok(name.to_owned())
}

/// Trim a national id and collapse the placeholder spellings to `None`.
pub fn normalize_national_id(raw: Option<&str>) -> Option<String> {
  let id = raw?.trim();
  if PLACEHOLDER_IDS.contains(&id) {
    None
  } else {
    Some(id.to_owned())
  }
}

/// Trim free text, treating blank values as absent.
pub fn non_empty(raw: Option<String>) -> Option<String> {
  let value = raw?;
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else if trimmed.len() == value.len() {
    Some(value)
  } else {
    Some(trimmed.to_owned())
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// The canonical identity record for one individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:          PersonId,
  pub name:        String,
  /// Always normalised: placeholder spellings are stored as `None`.
  pub national_id: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A demographic snapshot recorded for a person by one import event.
///
/// Profiles are never updated. For each field the most recently inserted
/// non-empty value is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id:  i64,
  pub person_id:   PersonId,
  /// The import event that produced this profile, if any.
  pub import_id:   Option<Uuid>,
  pub gender:      Option<String>,
  /// Free text exactly as imported; see [`crate::date::parse_date`].
  pub birth_date:  Option<String>,
  pub hometown:    Option<String>,
  pub ethnicity:   Option<String>,
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::CareStore::record_profile`].
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
  pub person_id:  PersonId,
  pub import_id:  Option<Uuid>,
  pub gender:     Option<String>,
  pub birth_date: Option<String>,
  pub hometown:   Option<String>,
  pub ethnicity:  Option<String>,
}

impl NewProfile {
  pub fn new(person_id: PersonId) -> Self {
    Self { person_id, ..Self::default() }
  }

  /// Blank out whitespace-only fields so "latest non-empty" lookups never
  /// see them.
  pub fn normalized(self) -> Self {
    Self {
      person_id:  self.person_id,
      import_id:  self.import_id,
      gender:     non_empty(self.gender),
      birth_date: non_empty(self.birth_date),
      hometown:   non_empty(self.hometown),
      ethnicity:  non_empty(self.ethnicity),
    }
  }
}

// ─── Check-ins ───────────────────────────────────────────────────────────────

/// One admission of a person to the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
  pub check_in_id:     i64,
  pub person_id:       PersonId,
  pub import_id:       Option<Uuid>,
  pub check_in_date:   Option<String>,
  pub attending_staff: Option<String>,
  pub notes:           Option<String>,
  pub recorded_at:     DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCheckIn {
  pub person_id:       PersonId,
  pub import_id:       Option<Uuid>,
  pub check_in_date:   Option<String>,
  pub attending_staff: Option<String>,
  pub notes:           Option<String>,
}

impl NewCheckIn {
  pub fn normalized(self) -> Self {
    Self {
      person_id:       self.person_id,
      import_id:       self.import_id,
      check_in_date:   non_empty(self.check_in_date),
      attending_staff: non_empty(self.attending_staff),
      notes:           non_empty(self.notes),
    }
  }
}

// ─── Medical information ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalInfo {
  pub medical_id:  i64,
  pub person_id:   PersonId,
  pub import_id:   Option<Uuid>,
  pub diagnosis:   Option<String>,
  pub record_date: Option<String>,
  pub treatment:   Option<String>,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewMedicalInfo {
  pub person_id:   PersonId,
  pub import_id:   Option<Uuid>,
  pub diagnosis:   Option<String>,
  pub record_date: Option<String>,
  pub treatment:   Option<String>,
}

impl NewMedicalInfo {
  pub fn normalized(self) -> Self {
    Self {
      person_id:   self.person_id,
      import_id:   self.import_id,
      diagnosis:   non_empty(self.diagnosis),
      record_date: non_empty(self.record_date),
      treatment:   non_empty(self.treatment),
    }
  }
}

// ─── Family information ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyInfo {
  pub family_id:     i64,
  pub person_id:     PersonId,
  pub import_id:     Option<Uuid>,
  pub guardian_name: Option<String>,
  /// The guardian's relation to the person, e.g. "mother".
  pub relationship:  Option<String>,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub recorded_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewFamilyInfo {
  pub person_id:     PersonId,
  pub import_id:     Option<Uuid>,
  pub guardian_name: Option<String>,
  pub relationship:  Option<String>,
  pub phone:         Option<String>,
  pub address:       Option<String>,
}

impl NewFamilyInfo {
  pub fn normalized(self) -> Self {
    Self {
      person_id:     self.person_id,
      import_id:     self.import_id,
      guardian_name: non_empty(self.guardian_name),
      relationship:  non_empty(self.relationship),
      phone:         non_empty(self.phone),
      address:       non_empty(self.address),
    }
  }
}

// ─── Merge results ───────────────────────────────────────────────────────────

/// Names shared by more than one person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
  pub name:       String,
  /// Ascending.
  pub person_ids: Vec<PersonId>,
}

/// Result of merging one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
  pub name:            String,
  pub primary_id:      PersonId,
  /// Rows folded into the primary and deleted.
  pub merged_ids:      Vec<PersonId>,
  /// Rows left alone because they carry a national id different from the
  /// primary's. Two ids means two people; a human has to decide.
  pub conflicting_ids: Vec<PersonId>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholder_ids_are_absent() {
    assert_eq!(normalize_national_id(None), None);
    assert_eq!(normalize_national_id(Some("")), None);
    assert_eq!(normalize_national_id(Some("-")), None);
    assert_eq!(normalize_national_id(Some("  - ")), None);
    assert_eq!(
      normalize_national_id(Some(" 110101199001011234 ")).as_deref(),
      Some("110101199001011234")
    );
  }

  #[test]
  fn names_are_trimmed_and_required() {
    assert_eq!(normalize_name("  张三 ").unwrap(), "张三");
    assert!(matches!(normalize_name("   "), Err(Error::EmptyName)));
  }

  #[test]
  fn blank_profile_fields_become_none() {
    let profile = NewProfile {
      gender: Some(" 男 ".into()),
      birth_date: Some("   ".into()),
      ..NewProfile::new(1)
    }
    .normalized();
    assert_eq!(profile.gender.as_deref(), Some("男"));
    assert_eq!(profile.birth_date, None);
  }
}
