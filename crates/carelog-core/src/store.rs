//! The `CareStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `carelog-store-sqlite`).
//! Higher layers (`carelog-api`, `carelog-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  bucket::AgeBucket,
  import::{ImportRecord, ImportReport},
  person::{
    CheckInRecord, DuplicateGroup, FamilyInfo, MedicalInfo, MergeOutcome,
    NewCheckIn, NewFamilyInfo, NewMedicalInfo, NewProfile, Person, PersonId,
    Profile,
  },
  projection::StatsSnapshot,
  stats::{
    self, AdmissionTrend, BucketMember, BucketStatistics, CategoryDistribution,
    SummaryStatistics,
  },
};

/// Abstraction over a Carelog store backend.
///
/// Backends implement identity resolution, writes and [`snapshot`]. Every
/// statistics view is a provided method over a single snapshot, so no backend
/// can compute a view from a differently-shaped query.
///
/// `today` parameters default to the local date when `None`; it is fixed once
/// per call and shared by every row of that call.
///
/// [`snapshot`]: CareStore::snapshot
pub trait CareStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Persons ───────────────────────────────────────────────────────────

  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// All persons, ascending by id.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Map `(name, national_id)` to the canonical person, creating it if no
  /// existing identity matches. Placeholder ids (`""`, `"-"`) count as absent.
  ///
  /// Resolution order with an id: exact id match, then a same-named person
  /// without an id (whose id is backfilled), then a new person. Without an
  /// id: a same-named person without an id, then any same-named person
  /// (lowest id first), then a new person.
  fn find_or_create_person<'a>(
    &'a self,
    name: &'a str,
    national_id: Option<&'a str>,
  ) -> impl Future<Output = Result<PersonId, Self::Error>> + Send + 'a;

  // ── Per-person records ────────────────────────────────────────────────

  fn record_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// All profiles of a person, oldest first.
  fn profiles_for(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// All check-ins of a person, oldest first.
  fn check_ins_for(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<CheckInRecord>, Self::Error>> + Send + '_;

  fn medical_info_for(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<MedicalInfo>, Self::Error>> + Send + '_;

  fn family_info_for(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<FamilyInfo>, Self::Error>> + Send + '_;

  fn record_check_in(
    &self,
    input: NewCheckIn,
  ) -> impl Future<Output = Result<CheckInRecord, Self::Error>> + Send + '_;

  fn record_medical_info(
    &self,
    input: NewMedicalInfo,
  ) -> impl Future<Output = Result<MedicalInfo, Self::Error>> + Send + '_;

  fn record_family_info(
    &self,
    input: NewFamilyInfo,
  ) -> impl Future<Output = Result<FamilyInfo, Self::Error>> + Send + '_;

  /// Import a batch. Each record is resolved and written in its own
  /// transaction; records failing validation are reported, not fatal.
  fn import_records(
    &self,
    records: Vec<ImportRecord>,
  ) -> impl Future<Output = Result<ImportReport, Self::Error>> + Send + '_;

  // ── Merging ───────────────────────────────────────────────────────────

  /// Every name held by more than one person.
  fn duplicate_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<DuplicateGroup>, Self::Error>> + Send + '_;

  /// Fold every person named `name` into one, atomically. `None` when
  /// nobody has that name.
  fn merge_duplicate_persons<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<MergeOutcome>, Self::Error>> + Send + 'a;

  /// Merge every duplicate group, one transaction per group. Stops at the
  /// first failing group; groups merged before it stay merged.
  fn merge_all_duplicates(
    &self,
  ) -> impl Future<Output = Result<Vec<MergeOutcome>, Self::Error>> + Send + '_ {
    async move {
      let mut outcomes = Vec::new();
      for group in self.duplicate_groups().await? {
        outcomes.extend(self.merge_duplicate_persons(&group.name).await?);
      }
      Ok(outcomes)
    }
  }

  // ── Statistics ────────────────────────────────────────────────────────

  /// Read the shared per-person projection.
  fn snapshot(
    &self,
    today: Option<NaiveDate>,
  ) -> impl Future<Output = Result<StatsSnapshot, Self::Error>> + Send + '_;

  fn summary_statistics(
    &self,
    today: Option<NaiveDate>,
  ) -> impl Future<Output = Result<SummaryStatistics, Self::Error>> + Send + '_ {
    async move { Ok(stats::summary(&self.snapshot(today).await?)) }
  }

  fn age_distribution(
    &self,
    today: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<BucketStatistics>, Self::Error>> + Send + '_ {
    async move { Ok(stats::age_distribution(&self.snapshot(today).await?)) }
  }

  fn persons_in_bucket(
    &self,
    bucket: AgeBucket,
    today: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<BucketMember>, Self::Error>> + Send + '_ {
    async move {
      Ok(stats::persons_in_bucket(&self.snapshot(today).await?, bucket))
    }
  }

  fn hometown_distribution(
    &self,
  ) -> impl Future<Output = Result<CategoryDistribution, Self::Error>> + Send + '_ {
    async move { Ok(stats::hometown_distribution(&self.snapshot(None).await?)) }
  }

  fn diagnosis_distribution(
    &self,
  ) -> impl Future<Output = Result<CategoryDistribution, Self::Error>> + Send + '_ {
    async move { Ok(stats::diagnosis_distribution(&self.snapshot(None).await?)) }
  }

  fn staff_distribution(
    &self,
  ) -> impl Future<Output = Result<CategoryDistribution, Self::Error>> + Send + '_ {
    async move { Ok(stats::staff_distribution(&self.snapshot(None).await?)) }
  }

  fn ethnicity_distribution(
    &self,
  ) -> impl Future<Output = Result<CategoryDistribution, Self::Error>> + Send + '_ {
    async move { Ok(stats::ethnicity_distribution(&self.snapshot(None).await?)) }
  }

  /// Missing gender is reported as `missing`, not as a label.
  fn gender_distribution(
    &self,
  ) -> impl Future<Output = Result<CategoryDistribution, Self::Error>> + Send + '_ {
    async move { Ok(stats::gender_distribution(&self.snapshot(None).await?)) }
  }

  fn admission_trend(
    &self,
  ) -> impl Future<Output = Result<AdmissionTrend, Self::Error>> + Send + '_ {
    async move { Ok(stats::admission_trend(&self.snapshot(None).await?)) }
  }
}
