//! [`SqliteStore`], the SQLite implementation of [`CareStore`].

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use carelog_core::{
  import::{ImportRecord, ImportReport, RejectedRecord},
  person::{
    CheckInRecord, DuplicateGroup, FamilyInfo, MedicalInfo, MergeOutcome,
    NewCheckIn, NewFamilyInfo, NewMedicalInfo, NewProfile, Person, PersonId,
    Profile, normalize_name, normalize_national_id,
  },
  projection::StatsSnapshot,
  store::CareStore,
};

use crate::{
  Error, Result,
  encode::{
    RawCheckIn, RawFamilyInfo, RawMedicalInfo, RawPerson, RawProfile, encode_dt,
  },
  identity::{self, Resolution},
  schema::SCHEMA,
  snapshot::read_snapshot,
  write,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Carelog store backed by a single SQLite file.
///
/// Clones share one background connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an empty in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert one row owned by `person_id`, failing with
  /// [`Error::PersonNotFound`] if that person does not exist.
  ///
  /// Returns the new row id, the input and the recording timestamp.
  async fn insert_owned<T>(
    &self,
    person_id: PersonId,
    input: T,
    insert: fn(&Connection, &T, &str) -> rusqlite::Result<i64>,
  ) -> Result<(i64, T, DateTime<Utc>)>
  where
    T: Send + 'static,
  {
    let recorded_at = Utc::now();
    let now = encode_dt(recorded_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !write::person_exists(&tx, person_id)? {
          return Ok(None);
        }
        let id = insert(&tx, &input, &now)?;
        tx.commit()?;
        Ok(Some((id, input)))
      })
      .await?;

    let (id, input) = inserted.ok_or(Error::PersonNotFound(person_id))?;
    Ok((id, input, recorded_at))
  }

  /// Every row of `table` owned by `person_id`, oldest first.
  async fn rows_for_person<R>(
    &self,
    table:     &'static str,
    columns:   &'static str,
    person_id: PersonId,
    from_row:  fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Vec<R>>
  where
    R: Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {columns} FROM {table} WHERE person_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![person_id], from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── CareStore impl ──────────────────────────────────────────────────────────

impl CareStore for SqliteStore {
  type Error = Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM persons WHERE id = ?1", RawPerson::COLUMNS),
              rusqlite::params![id],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {} FROM persons ORDER BY id", RawPerson::COLUMNS))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn find_or_create_person<'a>(
    &'a self,
    name:        &'a str,
    national_id: Option<&'a str>,
  ) -> Result<PersonId> {
    let name        = normalize_name(name)?;
    let national_id = normalize_national_id(national_id);
    let now         = encode_dt(Utc::now());

    let resolution = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let resolution =
          identity::find_or_create(&tx, &name, national_id.as_deref(), &now)?;
        tx.commit()?;
        Ok(resolution)
      })
      .await?;

    if let Resolution::Backfilled(person_id) = resolution {
      info!(person_id, "backfilled national id onto existing person");
    }
    Ok(resolution.person_id())
  }

  // ── Per-person records ────────────────────────────────────────────────────

  async fn record_profile(&self, input: NewProfile) -> Result<Profile> {
    let input = input.normalized();
    let (id, input, recorded_at) = self
      .insert_owned(input.person_id, input, write::insert_profile)
      .await?;

    Ok(Profile {
      profile_id: id,
      person_id: input.person_id,
      import_id: input.import_id,
      gender: input.gender,
      birth_date: input.birth_date,
      hometown: input.hometown,
      ethnicity: input.ethnicity,
      recorded_at,
    })
  }

  async fn profiles_for(&self, person_id: PersonId) -> Result<Vec<Profile>> {
    self
      .rows_for_person("profiles", RawProfile::COLUMNS, person_id, RawProfile::from_row)
      .await?
      .into_iter()
      .map(RawProfile::into_profile)
      .collect()
  }

  async fn check_ins_for(&self, person_id: PersonId) -> Result<Vec<CheckInRecord>> {
    self
      .rows_for_person("check_in_records", RawCheckIn::COLUMNS, person_id, RawCheckIn::from_row)
      .await?
      .into_iter()
      .map(RawCheckIn::into_check_in)
      .collect()
  }

  async fn medical_info_for(&self, person_id: PersonId) -> Result<Vec<MedicalInfo>> {
    self
      .rows_for_person(
        "medical_info",
        RawMedicalInfo::COLUMNS,
        person_id,
        RawMedicalInfo::from_row,
      )
      .await?
      .into_iter()
      .map(RawMedicalInfo::into_medical_info)
      .collect()
  }

  async fn family_info_for(&self, person_id: PersonId) -> Result<Vec<FamilyInfo>> {
    self
      .rows_for_person(
        "family_info",
        RawFamilyInfo::COLUMNS,
        person_id,
        RawFamilyInfo::from_row,
      )
      .await?
      .into_iter()
      .map(RawFamilyInfo::into_family_info)
      .collect()
  }

  async fn record_check_in(&self, input: NewCheckIn) -> Result<CheckInRecord> {
    let input = input.normalized();
    let (id, input, recorded_at) = self
      .insert_owned(input.person_id, input, write::insert_check_in)
      .await?;

    Ok(CheckInRecord {
      check_in_id: id,
      person_id: input.person_id,
      import_id: input.import_id,
      check_in_date: input.check_in_date,
      attending_staff: input.attending_staff,
      notes: input.notes,
      recorded_at,
    })
  }

  async fn record_medical_info(&self, input: NewMedicalInfo) -> Result<MedicalInfo> {
    let input = input.normalized();
    let (id, input, recorded_at) = self
      .insert_owned(input.person_id, input, write::insert_medical_info)
      .await?;

    Ok(MedicalInfo {
      medical_id: id,
      person_id: input.person_id,
      import_id: input.import_id,
      diagnosis: input.diagnosis,
      record_date: input.record_date,
      treatment: input.treatment,
      recorded_at,
    })
  }

  async fn record_family_info(&self, input: NewFamilyInfo) -> Result<FamilyInfo> {
    let input = input.normalized();
    let (id, input, recorded_at) = self
      .insert_owned(input.person_id, input, write::insert_family_info)
      .await?;

    Ok(FamilyInfo {
      family_id: id,
      person_id: input.person_id,
      import_id: input.import_id,
      guardian_name: input.guardian_name,
      relationship: input.relationship,
      phone: input.phone,
      address: input.address,
      recorded_at,
    })
  }

  async fn import_records(&self, records: Vec<ImportRecord>) -> Result<ImportReport> {
    let import_id = Uuid::new_v4();
    let mut report = ImportReport::new(import_id);

    for (index, record) in records.into_iter().enumerate() {
      let name = match normalize_name(&record.name) {
        Ok(name) => name,
        Err(e) => {
          warn!(%import_id, index, "rejected import record: {e}");
          report.rejected.push(RejectedRecord {
            index,
            name:   record.name,
            reason: e.to_string(),
          });
          continue;
        }
      };
      let national_id = normalize_national_id(record.national_id.as_deref());
      let now         = encode_dt(Utc::now());

      let resolution = self
        .conn
        .call(move |conn| {
          Ok(write::import_one(
            conn,
            &record,
            &name,
            national_id.as_deref(),
            import_id,
            &now,
          )?)
        })
        .await?;

      report.imported += 1;
      match resolution {
        Resolution::Created(_) => report.persons_created += 1,
        Resolution::Backfilled(_) => report.persons_backfilled += 1,
        Resolution::Existing(_) => {}
      }
    }

    info!(
      %import_id,
      imported = report.imported,
      created = report.persons_created,
      backfilled = report.persons_backfilled,
      rejected = report.rejected.len(),
      "import finished"
    );
    Ok(report)
  }

  // ── Merging ───────────────────────────────────────────────────────────────

  async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>> {
    let groups = self
      .conn
      .call(|conn| Ok(identity::duplicate_groups(conn)?))
      .await?;

    Ok(
      groups
        .into_iter()
        .map(|(name, person_ids)| DuplicateGroup { name, person_ids })
        .collect(),
    )
  }

  async fn merge_duplicate_persons<'a>(
    &'a self,
    name: &'a str,
  ) -> Result<Option<MergeOutcome>> {
    let name  = normalize_name(name)?;
    let group = name.clone();
    let now   = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| Ok(identity::merge_group(conn, &group, &now)?))
      .await
      .map_err(|source| {
        error!(name = %name, "merge rolled back: {source}");
        Error::MergeFailed { name: name.clone(), source }
      })?;

    let Some(outcome) = outcome else {
      debug!(name = %name, "no persons to merge");
      return Ok(None);
    };
    info!(
      name = %outcome.name,
      primary_id = outcome.primary_id,
      merged_ids = ?outcome.merged_ids,
      "merged duplicate persons"
    );
    Ok(Some(outcome))
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  async fn snapshot(&self, today: Option<NaiveDate>) -> Result<StatsSnapshot> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let snapshot = self
      .conn
      .call(move |conn| Ok(read_snapshot(conn, today)?))
      .await?;
    Ok(snapshot)
  }
}
