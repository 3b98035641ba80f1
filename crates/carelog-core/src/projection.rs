//! The shared per-person projection every statistics view reads from.
//!
//! A storage backend fetches three flat row sets inside one read transaction
//! ([`PersonRow`], [`MedicalEvent`], [`CheckInEvent`]) and hands them to
//! [`StatsSnapshot::build`]. The builder produces exactly one
//! [`PersonProjection`] per person; nothing downstream joins, so nothing
//! downstream can multiply rows.

use std::{cmp::Ordering, collections::HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  bucket::AgeBucket,
  date::{age_on, parse_date},
  person::PersonId,
};

// ─── Input rows ──────────────────────────────────────────────────────────────

/// One person with the latest non-empty value of each profile field already
/// resolved by the backend.
#[derive(Debug, Clone, Default)]
pub struct PersonRow {
  pub person_id:   PersonId,
  pub name:        String,
  pub national_id: Option<String>,
  pub gender:      Option<String>,
  pub birth_date:  Option<String>,
  pub hometown:    Option<String>,
  pub ethnicity:   Option<String>,
}

/// A non-empty diagnosis from `medical_info`.
#[derive(Debug, Clone)]
pub struct MedicalEvent {
  pub medical_id:  i64,
  pub person_id:   PersonId,
  pub diagnosis:   String,
  pub record_date: Option<String>,
}

/// One row of `check_in_records`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInEvent {
  pub check_in_id:     i64,
  pub person_id:       PersonId,
  pub check_in_date:   Option<String>,
  pub attending_staff: Option<String>,
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// Everything the statistics views know about one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonProjection {
  pub person_id:        PersonId,
  pub name:             String,
  pub national_id:      Option<String>,
  pub gender:           Option<String>,
  /// Normalised birth date; `None` when missing or unparseable.
  pub birth_date:       Option<NaiveDate>,
  pub age:              Option<u32>,
  /// Derived from `age`; `None` exactly when `age` is.
  pub bucket:           Option<AgeBucket>,
  pub hometown:         Option<String>,
  pub ethnicity:        Option<String>,
  /// Earliest diagnosis on record.
  pub first_diagnosis:  Option<String>,
  /// Most recent diagnosis on record.
  pub latest_diagnosis: Option<String>,
  /// Staff named on the most recent check-in that names anyone.
  pub latest_staff:     Option<String>,
  pub visit_count:      usize,
}

impl PersonProjection {
  /// The one bucket-membership test used by every view.
  pub fn in_bucket(&self, bucket: AgeBucket) -> bool {
    self.bucket == Some(bucket)
  }
}

/// The projection plus the per-admission rows the trend view needs, all read
/// at one instant and evaluated against one `today`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
  pub today:     NaiveDate,
  /// Ascending by `person_id`.
  pub persons:   Vec<PersonProjection>,
  pub check_ins: Vec<CheckInEvent>,
}

impl StatsSnapshot {
  pub fn build(
    today: NaiveDate,
    mut persons: Vec<PersonRow>,
    medical: Vec<MedicalEvent>,
    check_ins: Vec<CheckInEvent>,
  ) -> Self {
    persons.sort_by_key(|p| p.person_id);

    let mut first_diagnosis: HashMap<PersonId, (EventKey, &str)> = HashMap::new();
    let mut latest_diagnosis: HashMap<PersonId, (EventKey, &str)> = HashMap::new();
    for event in &medical {
      let key = EventKey::new(event.record_date.as_deref(), event.medical_id);
      keep_earliest(&mut first_diagnosis, event.person_id, key, &event.diagnosis);
      keep_latest(&mut latest_diagnosis, event.person_id, key, &event.diagnosis);
    }

    let mut visit_count: HashMap<PersonId, usize> = HashMap::new();
    let mut latest_staff: HashMap<PersonId, (EventKey, &str)> = HashMap::new();
    for event in &check_ins {
      *visit_count.entry(event.person_id).or_default() += 1;
      if let Some(staff) = event.attending_staff.as_deref() {
        let key = EventKey::new(event.check_in_date.as_deref(), event.check_in_id);
        keep_latest(&mut latest_staff, event.person_id, key, staff);
      }
    }

    let pick = |map: &HashMap<PersonId, (EventKey, &str)>, id: PersonId| {
      map.get(&id).map(|(_, value)| (*value).to_owned())
    };

    let projected = persons
      .into_iter()
      .map(|row| {
        let birth_date = row.birth_date.as_deref().and_then(parse_date);
        let age = birth_date.and_then(|birth| age_on(birth, today));
        PersonProjection {
          first_diagnosis:  pick(&first_diagnosis, row.person_id),
          latest_diagnosis: pick(&latest_diagnosis, row.person_id),
          latest_staff:     pick(&latest_staff, row.person_id),
          visit_count:      visit_count.get(&row.person_id).copied().unwrap_or(0),
          person_id:        row.person_id,
          name:             row.name,
          national_id:      row.national_id,
          gender:           row.gender,
          birth_date,
          age,
          bucket:           age.map(AgeBucket::for_age),
          hometown:         row.hometown,
          ethnicity:        row.ethnicity,
        }
      })
      .collect();

    Self { today, persons: projected, check_ins }
  }

  pub fn known_age(&self) -> impl Iterator<Item = (&PersonProjection, u32)> {
    self.persons.iter().filter_map(|p| p.age.map(|age| (p, age)))
  }

  pub fn in_bucket(&self, bucket: AgeBucket) -> impl Iterator<Item = &PersonProjection> {
    self.persons.iter().filter(move |p| p.in_bucket(bucket))
  }
}

// ─── Event ordering ──────────────────────────────────────────────────────────

/// Chronological position of an event row: by normalised date, then by
/// insertion order. Rows with an unparseable date only win when a person has
/// no dated rows at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EventKey {
  date: Option<NaiveDate>,
  id:   i64,
}

impl EventKey {
  fn new(raw_date: Option<&str>, id: i64) -> Self {
    Self { date: raw_date.and_then(parse_date), id }
  }

  /// Dated rows sort before undated ones.
  fn earliest_order(&self, other: &Self) -> Ordering {
    self
      .date
      .is_none()
      .cmp(&other.date.is_none())
      .then(self.date.cmp(&other.date))
      .then(self.id.cmp(&other.id))
  }

  /// Dated rows sort after undated ones.
  fn latest_order(&self, other: &Self) -> Ordering {
    self
      .date
      .is_some()
      .cmp(&other.date.is_some())
      .then(self.date.cmp(&other.date))
      .then(self.id.cmp(&other.id))
  }
}

fn keep_earliest<'a>(
  map: &mut HashMap<PersonId, (EventKey, &'a str)>,
  person_id: PersonId,
  key: EventKey,
  value: &'a str,
) {
  map
    .entry(person_id)
    .and_modify(|current| {
      if key.earliest_order(&current.0) == Ordering::Less {
        *current = (key, value);
      }
    })
    .or_insert((key, value));
}

fn keep_latest<'a>(
  map: &mut HashMap<PersonId, (EventKey, &'a str)>,
  person_id: PersonId,
  key: EventKey,
  value: &'a str,
) {
  map
    .entry(person_id)
    .and_modify(|current| {
      if key.latest_order(&current.0) == Ordering::Greater {
        *current = (key, value);
      }
    })
    .or_insert((key, value));
}
