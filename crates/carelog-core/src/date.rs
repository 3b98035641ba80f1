//! Free-text date normalisation and age arithmetic.
//!
//! Spreadsheet exports write dates as `2014.3.27`, `2014-03-27`,
//! `2014/3/27`, `2014年3月27日`, sometimes followed by a time of day. This is
//! the only parser for those strings; birth dates, check-in dates and medical
//! record dates all go through it.

use chrono::NaiveDate;

/// Days per year used for age arithmetic.
const DAYS_PER_YEAR: f64 = 365.25;

/// Parse a free-text date into a calendar date.
///
/// Returns `None` when the text matches no known layout or names a day that
/// does not exist (e.g. `2023-02-30`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let text = strip_time(raw.trim());
  let (year, month, day) = if text.contains('年') {
    split_cjk(text)?
  } else {
    split_delimited(text)?
  };
  NaiveDate::from_ymd_opt(year, month, day)
}

/// Whole years between `birth` and `today`, floored.
///
/// `None` when `birth` lies in the future.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
  let days = (today - birth).num_days();
  if days < 0 {
    return None;
  }
  Some((days as f64 / DAYS_PER_YEAR).floor() as u32)
}

/// Parse `raw` and compute the age on `today` in one step.
pub fn age_from_text(raw: &str, today: NaiveDate) -> Option<u32> {
  age_on(parse_date(raw)?, today)
}

// ─── Layouts ─────────────────────────────────────────────────────────────────

/// Drop a trailing time of day (`2014-03-27 00:00:00`, `2014-03-27T08:00`).
fn strip_time(text: &str) -> &str {
  text
    .split(|c: char| c.is_whitespace() || c == 'T')
    .next()
    .unwrap_or(text)
}

/// `YYYY年M月D日`; the closing `日` is optional.
fn split_cjk(text: &str) -> Option<(i32, u32, u32)> {
  let (year, rest) = text.split_once('年')?;
  let (month, rest) = rest.split_once('月')?;
  let day = rest.strip_suffix('日').unwrap_or(rest);
  Some((year_part(year)?, short_part(month)?, short_part(day)?))
}

/// `YYYY?M?D` with one separator out of `.`, `-`, `/` used throughout.
fn split_delimited(text: &str) -> Option<(i32, u32, u32)> {
  let sep = text.chars().find(|c| !c.is_ascii_digit())?;
  if !matches!(sep, '.' | '-' | '/') {
    return None;
  }

  let mut parts = text.split(sep);
  let year = year_part(parts.next()?)?;
  let month = short_part(parts.next()?)?;
  let day = short_part(parts.next()?)?;
  if parts.next().is_some() {
    return None;
  }
  Some((year, month, day))
}

fn year_part(s: &str) -> Option<i32> {
  if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

/// One- or two-digit month or day.
fn short_part(s: &str) -> Option<u32> {
  if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}
