//! Statistics views over a [`StatsSnapshot`].
//!
//! Every function here is a thin consumer of the shared projection: none of
//! them parse dates, compute ages or decide bucket membership themselves.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  bucket::AgeBucket,
  date::parse_date,
  person::PersonId,
  projection::{PersonProjection, StatsSnapshot},
};

/// How many names a distribution row previews.
pub const EXAMPLE_NAME_LIMIT: usize = 5;

/// Key used in gender counts for persons with no recorded gender.
pub const UNKNOWN_GENDER: &str = "unknown";

// ─── Numeric helpers ─────────────────────────────────────────────────────────

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 { (value * 10.0).round() / 10.0 }

/// `part / whole` as a percentage rounded to one decimal; `0.0` when `whole`
/// is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  round1(part as f64 * 100.0 / whole as f64)
}

/// Mean age rounded to one decimal. Every view reporting an average uses
/// this, so equal populations always report equal averages.
pub fn average_age(ages: impl IntoIterator<Item = u32>) -> Option<f64> {
  let (sum, count) = ages
    .into_iter()
    .fold((0u64, 0u64), |(sum, count), age| (sum + u64::from(age), count + 1));
  (count > 0).then(|| round1(sum as f64 / count as f64))
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
  pub total:                usize,
  pub known_age_count:      usize,
  pub known_age_percentage: f64,
  pub average_age:          Option<f64>,
  pub min_age:              Option<u32>,
  pub max_age:              Option<u32>,
  pub gender_counts:        BTreeMap<String, usize>,
}

pub fn summary(snapshot: &StatsSnapshot) -> SummaryStatistics {
  let total = snapshot.persons.len();
  let ages: Vec<u32> = snapshot.known_age().map(|(_, age)| age).collect();

  let mut gender_counts: BTreeMap<String, usize> = BTreeMap::new();
  for person in &snapshot.persons {
    let key = person.gender.as_deref().unwrap_or(UNKNOWN_GENDER);
    *gender_counts.entry(key.to_owned()).or_default() += 1;
  }

  SummaryStatistics {
    total,
    known_age_count: ages.len(),
    known_age_percentage: percentage(ages.len(), total),
    average_age: average_age(ages.iter().copied()),
    min_age: ages.iter().copied().min(),
    max_age: ages.iter().copied().max(),
    gender_counts,
  }
}

// ─── Age distribution ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStatistics {
  pub bucket:        AgeBucket,
  pub count:         usize,
  /// Share of persons with a known age.
  pub percentage:    f64,
  pub average_age:   Option<f64>,
  /// Up to [`EXAMPLE_NAME_LIMIT`] names, oldest records first.
  pub example_names: Vec<String>,
}

/// One row per bucket, all six always present, in display order.
pub fn age_distribution(snapshot: &StatsSnapshot) -> Vec<BucketStatistics> {
  let known = snapshot.known_age().count();
  AgeBucket::all()
    .map(|bucket| {
      let members: Vec<&PersonProjection> = snapshot.in_bucket(bucket).collect();
      BucketStatistics {
        bucket,
        count: members.len(),
        percentage: percentage(members.len(), known),
        average_age: average_age(members.iter().filter_map(|p| p.age)),
        example_names: members
          .iter()
          .take(EXAMPLE_NAME_LIMIT)
          .map(|p| p.name.clone())
          .collect(),
      }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketMember {
  pub person_id:   PersonId,
  pub name:        String,
  pub age:         u32,
  pub gender:      Option<String>,
  /// Most recent diagnosis.
  pub diagnosis:   Option<String>,
  pub visit_count: usize,
}

/// Every person in `bucket`, ascending by id.
pub fn persons_in_bucket(snapshot: &StatsSnapshot, bucket: AgeBucket) -> Vec<BucketMember> {
  snapshot
    .in_bucket(bucket)
    .filter_map(|p| {
      Some(BucketMember {
        person_id:   p.person_id,
        name:        p.name.clone(),
        age:         p.age?,
        gender:      p.gender.clone(),
        diagnosis:   p.latest_diagnosis.clone(),
        visit_count: p.visit_count,
      })
    })
    .collect()
}

// ─── Categorical distributions ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub label:      String,
  pub count:      usize,
  /// Share of persons with a value for this category.
  pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDistribution {
  /// Persons with a value.
  pub total:   usize,
  /// Persons without one.
  pub missing: usize,
  /// Count descending, then label ascending.
  pub entries: Vec<CategoryCount>,
}

/// Group persons by the single value `key` picks for each of them.
pub fn categorical<F>(snapshot: &StatsSnapshot, key: F) -> CategoryDistribution
where
  F: Fn(&PersonProjection) -> Option<&str>,
{
  let mut counts: HashMap<&str, usize> = HashMap::new();
  let mut missing = 0;
  for person in &snapshot.persons {
    match key(person) {
      Some(label) => *counts.entry(label).or_default() += 1,
      None => missing += 1,
    }
  }

  let total = snapshot.persons.len() - missing;
  let mut entries: Vec<CategoryCount> = counts
    .into_iter()
    .map(|(label, count)| CategoryCount {
      label: label.to_owned(),
      count,
      percentage: percentage(count, total),
    })
    .collect();
  entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

  CategoryDistribution { total, missing, entries }
}

/// Latest non-empty hometown.
pub fn hometown_distribution(snapshot: &StatsSnapshot) -> CategoryDistribution {
  categorical(snapshot, |p| p.hometown.as_deref())
}

/// First-ever diagnosis, so repeat admissions never count a person twice.
pub fn diagnosis_distribution(snapshot: &StatsSnapshot) -> CategoryDistribution {
  categorical(snapshot, |p| p.first_diagnosis.as_deref())
}

/// Staff on the most recent check-in.
pub fn staff_distribution(snapshot: &StatsSnapshot) -> CategoryDistribution {
  categorical(snapshot, |p| p.latest_staff.as_deref())
}

pub fn ethnicity_distribution(snapshot: &StatsSnapshot) -> CategoryDistribution {
  categorical(snapshot, |p| p.ethnicity.as_deref())
}

pub fn gender_distribution(snapshot: &StatsSnapshot) -> CategoryDistribution {
  categorical(snapshot, |p| p.gender.as_deref())
}

// ─── Admission trend ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAdmissions {
  /// `YYYY-MM`.
  pub month:      String,
  /// Check-in records in the month.
  pub admissions: usize,
  /// Distinct persons admitted in the month.
  pub persons:    usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionTrend {
  /// Ascending by month.
  pub months:  Vec<MonthlyAdmissions>,
  /// Check-ins whose date is missing or unparseable.
  pub undated: usize,
}

pub fn admission_trend(snapshot: &StatsSnapshot) -> AdmissionTrend {
  let mut months: BTreeMap<String, (usize, HashSet<PersonId>)> = BTreeMap::new();
  let mut undated = 0;

  for check_in in &snapshot.check_ins {
    match check_in.check_in_date.as_deref().and_then(parse_date) {
      Some(date) => {
        let (admissions, persons) = months
          .entry(date.format("%Y-%m").to_string())
          .or_default();
        *admissions += 1;
        persons.insert(check_in.person_id);
      }
      None => undated += 1,
    }
  }

  AdmissionTrend {
    months: months
      .into_iter()
      .map(|(month, (admissions, persons))| MonthlyAdmissions {
        month,
        admissions,
        persons: persons.len(),
      })
      .collect(),
    undated,
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::projection::{CheckInEvent, MedicalEvent, PersonRow};

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() }

  fn row(id: PersonId, birth: Option<&str>, gender: Option<&str>) -> PersonRow {
    PersonRow {
      person_id: id,
      name: format!("person-{id}"),
      birth_date: birth.map(Into::into),
      gender: gender.map(Into::into),
      ..PersonRow::default()
    }
  }

  fn sample() -> StatsSnapshot {
    StatsSnapshot::build(
      today(),
      vec![
        row(1, Some("2023.5.1"), Some("男")),   // 1
        row(2, Some("2021-01-01"), Some("女")), // 3
        row(3, Some("2018/6/1"), Some("男")),   // 5
        row(4, Some("2000年1月1日"), None),     // 24
        row(5, Some("garbage"), Some("女")),
        row(6, None, None),
        row(7, Some("2024.1.1"), Some("男")), // 0
      ],
      vec![
        MedicalEvent {
          medical_id:  1,
          person_id:   1,
          diagnosis:   "肺炎".into(),
          record_date: Some("2024.1.1".into()),
        },
        MedicalEvent {
          medical_id:  2,
          person_id:   1,
          diagnosis:   "哮喘".into(),
          record_date: Some("2024.2.1".into()),
        },
        MedicalEvent {
          medical_id:  3,
          person_id:   2,
          diagnosis:   "肺炎".into(),
          record_date: None,
        },
      ],
      vec![
        CheckInEvent {
          check_in_id:     1,
          person_id:       1,
          check_in_date:   Some("2024.1.1".into()),
          attending_staff: Some("王医生".into()),
        },
        CheckInEvent {
          check_in_id:     2,
          person_id:       1,
          check_in_date:   Some("2024-01-20".into()),
          attending_staff: None,
        },
        CheckInEvent {
          check_in_id:     3,
          person_id:       2,
          check_in_date:   Some("2024年2月3日".into()),
          attending_staff: Some("王医生".into()),
        },
        CheckInEvent {
          check_in_id:     4,
          person_id:       3,
          check_in_date:   Some("?".into()),
          attending_staff: None,
        },
      ],
    )
  }

  #[test]
  fn summary_counts_unknown_ages_in_total_only() {
    let s = summary(&sample());
    assert_eq!(s.total, 7);
    assert_eq!(s.known_age_count, 5);
    assert_eq!(s.known_age_percentage, 71.4);
    assert_eq!(s.min_age, Some(0));
    assert_eq!(s.max_age, Some(24));
    // (1 + 3 + 5 + 24 + 0) / 5
    assert_eq!(s.average_age, Some(6.6));
    assert_eq!(s.gender_counts["男"], 3);
    assert_eq!(s.gender_counts["女"], 2);
    assert_eq!(s.gender_counts[UNKNOWN_GENDER], 2);
  }

  #[test]
  fn distribution_has_six_stable_rows() {
    let d = age_distribution(&sample());
    let rows: Vec<_> = d.iter().map(|b| (b.bucket.label(), b.count)).collect();
    assert_eq!(
      rows,
      [("0-1", 1), ("1-3", 2), ("4-6", 1), ("7-12", 0), ("13-18", 0), ("18+", 1)]
    );
    assert_eq!(d[1].percentage, 40.0);
    assert_eq!(d[1].average_age, Some(2.0));
    assert_eq!(d[1].example_names, ["person-1", "person-2"]);
    assert_eq!(d[3].average_age, None);
    assert!(d[3].example_names.is_empty());
  }

  #[test]
  fn views_agree_with_each_other() {
    let snapshot = sample();
    let s = summary(&snapshot);
    let d = age_distribution(&snapshot);

    assert_eq!(d.iter().map(|b| b.count).sum::<usize>(), s.known_age_count);
    for bucket in &d {
      let members = persons_in_bucket(&snapshot, bucket.bucket);
      assert_eq!(members.len(), bucket.count, "bucket {}", bucket.bucket);
      assert_eq!(
        average_age(members.iter().map(|m| m.age)),
        bucket.average_age,
        "bucket {}",
        bucket.bucket
      );
    }
  }

  #[test]
  fn example_names_are_bounded() {
    // Age 9 on 2024-05-01.
    let rows = (1..=8).map(|id| row(id, Some("2015.1.1"), None)).collect();
    let snapshot = StatsSnapshot::build(today(), rows, vec![], vec![]);
    let d = age_distribution(&snapshot);
    let school = d.iter().find(|b| b.bucket == AgeBucket::School).unwrap();
    assert_eq!(school.count, 8);
    assert_eq!(school.example_names.len(), EXAMPLE_NAME_LIMIT);
    assert_eq!(school.example_names[0], "person-1");
    assert_eq!(school.example_names[4], "person-5");
  }

  #[test]
  fn drill_down_reports_latest_diagnosis_and_visits() {
    let members = persons_in_bucket(&sample(), AgeBucket::Toddler);
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].person_id, 1);
    assert_eq!(members[0].diagnosis.as_deref(), Some("哮喘"));
    assert_eq!(members[0].visit_count, 2);
    assert_eq!(members[1].diagnosis.as_deref(), Some("肺炎"));
  }

  #[test]
  fn diagnosis_distribution_counts_each_person_once() {
    let d = diagnosis_distribution(&sample());
    assert_eq!(d.total, 2);
    assert_eq!(d.missing, 5);
    assert_eq!(d.entries.len(), 1);
    assert_eq!(d.entries[0].label, "肺炎");
    assert_eq!(d.entries[0].count, 2);
    assert_eq!(d.entries[0].percentage, 100.0);
  }

  #[test]
  fn staff_distribution_uses_latest_named_staff() {
    let d = staff_distribution(&sample());
    assert_eq!(d.total, 2);
    assert_eq!(d.entries[0].label, "王医生");
    assert_eq!(d.entries[0].count, 2);
  }

  #[test]
  fn categorical_entries_sort_by_count_then_label() {
    let d = gender_distribution(&sample());
    let labels: Vec<_> = d.entries.iter().map(|e| (e.label.as_str(), e.count)).collect();
    assert_eq!(labels, [("男", 3), ("女", 2)]);
    assert_eq!(d.entries[0].percentage, 60.0);
  }

  #[test]
  fn admission_trend_groups_by_month() {
    let trend = admission_trend(&sample());
    assert_eq!(trend.undated, 1);
    assert_eq!(
      trend.months,
      [
        MonthlyAdmissions { month: "2024-01".into(), admissions: 2, persons: 1 },
        MonthlyAdmissions { month: "2024-02".into(), admissions: 1, persons: 1 },
      ]
    );
  }

  #[test]
  fn empty_snapshot_is_all_zeroes() {
    let snapshot = StatsSnapshot::build(today(), vec![], vec![], vec![]);
    let s = summary(&snapshot);
    assert_eq!(s.total, 0);
    assert_eq!(s.known_age_percentage, 0.0);
    assert_eq!(s.average_age, None);
    let d = age_distribution(&snapshot);
    assert_eq!(d.len(), 6);
    assert!(d.iter().all(|b| b.count == 0 && b.percentage == 0.0));
  }
}
