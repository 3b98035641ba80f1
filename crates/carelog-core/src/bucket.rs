//! The fixed age ranges used by every age-based view.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};

use crate::Error;

/// One of six semantic age ranges, in display order.
///
/// The labels overlap at their edges (`0-1` / `1-3`, `13-18` / `18+`);
/// membership is decided on whole-year age by [`AgeBucket::for_age`] alone:
///
/// | Bucket  | Ages        |
/// |---------|-------------|
/// | `0-1`   | 0           |
/// | `1-3`   | 1 ..= 3     |
/// | `4-6`   | 4 ..= 6     |
/// | `7-12`  | 7 ..= 12    |
/// | `13-18` | 13 ..= 17   |
/// | `18+`   | 18 and over |
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
pub enum AgeBucket {
  #[serde(rename = "0-1")]
  #[strum(serialize = "0-1")]
  Infant,
  #[serde(rename = "1-3")]
  #[strum(serialize = "1-3")]
  Toddler,
  #[serde(rename = "4-6")]
  #[strum(serialize = "4-6")]
  Preschool,
  #[serde(rename = "7-12")]
  #[strum(serialize = "7-12")]
  School,
  #[serde(rename = "13-18")]
  #[strum(serialize = "13-18")]
  Adolescent,
  #[serde(rename = "18+")]
  #[strum(serialize = "18+")]
  Adult,
}

impl AgeBucket {
  /// The bucket a person of `age` whole years belongs to.
  pub fn for_age(age: u32) -> Self {
    match age {
      0 => Self::Infant,
      1..=3 => Self::Toddler,
      4..=6 => Self::Preschool,
      7..=12 => Self::School,
      13..=17 => Self::Adolescent,
      _ => Self::Adult,
    }
  }

  /// All buckets in display order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  pub fn label(self) -> &'static str { self.into() }

  /// Parse a bucket label such as `"7-12"` or `"18+"`.
  pub fn from_label(label: &str) -> crate::Result<Self> {
    label
      .trim()
      .parse()
      .map_err(|_| Error::UnknownBucket(label.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_order_is_fixed() {
    let labels: Vec<_> = AgeBucket::all().map(AgeBucket::label).collect();
    assert_eq!(labels, ["0-1", "1-3", "4-6", "7-12", "13-18", "18+"]);
  }

  #[test]
  fn every_age_has_exactly_one_bucket() {
    let expected = [
      (0, AgeBucket::Infant),
      (1, AgeBucket::Toddler),
      (3, AgeBucket::Toddler),
      (4, AgeBucket::Preschool),
      (6, AgeBucket::Preschool),
      (7, AgeBucket::School),
      (12, AgeBucket::School),
      (13, AgeBucket::Adolescent),
      (17, AgeBucket::Adolescent),
      (18, AgeBucket::Adult),
      (90, AgeBucket::Adult),
    ];
    for (age, bucket) in expected {
      assert_eq!(AgeBucket::for_age(age), bucket, "age {age}");
    }
  }

  #[test]
  fn labels_round_trip_through_parse_and_serde() {
    for bucket in AgeBucket::all() {
      assert_eq!(AgeBucket::from_label(bucket.label()).unwrap(), bucket);
      let json = serde_json::to_string(&bucket).unwrap();
      assert_eq!(json, format!("\"{}\"", bucket.label()));
    }
    assert!(matches!(
      AgeBucket::from_label("2-5"),
      Err(Error::UnknownBucket(_))
    ));
  }
}
