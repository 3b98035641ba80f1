//! The record shape produced by the spreadsheet import pipeline.
//!
//! Column-header detection happens upstream; by the time a row reaches the
//! store it is an [`ImportRecord`] of raw strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  person::{NewCheckIn, NewFamilyInfo, NewMedicalInfo, NewProfile, PersonId, non_empty},
};

/// One spreadsheet row. Only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRecord {
  pub name:                  String,
  pub national_id:           Option<String>,
  pub gender:                Option<String>,
  pub birth_date:            Option<String>,
  pub hometown:              Option<String>,
  pub ethnicity:             Option<String>,
  pub check_in_date:         Option<String>,
  pub attending_staff:       Option<String>,
  pub notes:                 Option<String>,
  pub diagnosis:             Option<String>,
  pub treatment:             Option<String>,
  pub guardian_name:         Option<String>,
  pub guardian_relationship: Option<String>,
  pub guardian_phone:        Option<String>,
  pub address:               Option<String>,
}

impl ImportRecord {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  /// The demographic snapshot carried by this row. Always recorded, even when
  /// empty, so every import event leaves a profile behind.
  pub fn profile(&self, person_id: PersonId, import_id: Uuid) -> NewProfile {
    NewProfile {
      person_id,
      import_id: Some(import_id),
      gender: self.gender.clone(),
      birth_date: self.birth_date.clone(),
      hometown: self.hometown.clone(),
      ethnicity: self.ethnicity.clone(),
    }
    .normalized()
  }

  pub fn check_in(&self, person_id: PersonId, import_id: Uuid) -> Option<NewCheckIn> {
    let check_in = NewCheckIn {
      person_id,
      import_id: Some(import_id),
      check_in_date: self.check_in_date.clone(),
      attending_staff: self.attending_staff.clone(),
      notes: self.notes.clone(),
    }
    .normalized();
    let present = check_in.check_in_date.is_some()
      || check_in.attending_staff.is_some()
      || check_in.notes.is_some();
    present.then_some(check_in)
  }

  pub fn medical_info(&self, person_id: PersonId, import_id: Uuid) -> Option<NewMedicalInfo> {
    let diagnosis = non_empty(self.diagnosis.clone());
    let treatment = non_empty(self.treatment.clone());
    if diagnosis.is_none() && treatment.is_none() {
      return None;
    }
    // A diagnosis is dated by the admission it was recorded with.
    Some(NewMedicalInfo {
      person_id,
      import_id: Some(import_id),
      diagnosis,
      record_date: non_empty(self.check_in_date.clone()),
      treatment,
    })
  }

  pub fn family_info(&self, person_id: PersonId, import_id: Uuid) -> Option<NewFamilyInfo> {
    let family = NewFamilyInfo {
      person_id,
      import_id: Some(import_id),
      guardian_name: self.guardian_name.clone(),
      relationship: self.guardian_relationship.clone(),
      phone: self.guardian_phone.clone(),
      address: self.address.clone(),
    }
    .normalized();
    let present = family.guardian_name.is_some()
      || family.relationship.is_some()
      || family.phone.is_some()
      || family.address.is_some();
    present.then_some(family)
  }
}

/// Parse a JSON array of [`ImportRecord`]s.
pub fn parse_batch(json: &str) -> Result<Vec<ImportRecord>> {
  Ok(serde_json::from_str(json)?)
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A row that failed validation and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
  /// Zero-based position in the submitted batch.
  pub index:  usize,
  pub name:   String,
  pub reason: String,
}

/// What one import run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub import_id:          Uuid,
  pub imported:           usize,
  pub persons_created:    usize,
  /// Existing persons whose missing national id this import supplied.
  pub persons_backfilled: usize,
  pub rejected:           Vec<RejectedRecord>,
}

impl ImportReport {
  pub fn new(import_id: Uuid) -> Self {
    Self {
      import_id,
      imported: 0,
      persons_created: 0,
      persons_backfilled: 0,
      rejected: Vec::new(),
    }
  }
}
