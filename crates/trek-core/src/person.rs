//! One recorded state of a participant, and its orderings.
//!
//! A person's identity is the `(name, birthday)` pair and never changes.
//! Everything else (category, start number, timestamps, finisher flag) is
//! trip state. Snapshots are values: an update never touches a published
//! `Person`, it builds a new one with the `with_*` methods.

use std::{
  cmp::Ordering,
  fmt,
  hash::{Hash, Hasher},
};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// The route a participant takes part in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
  /// The short route.
  Tour,
  /// The middle route.
  Doghike,
  /// The long route.
  Dogtrekking,
  /// Route for participants with limited mobility.
  BarrierFree,
  /// Other or unknown route.
  Unknown,
}

impl Category {
  /// Classify free text from a registration form by keyword.
  ///
  /// Matching is case-insensitive and the first matching rule wins:
  /// `tour`, then `roll`/`wheel`/`barrier`, then `hike`, then `trekking`.
  pub fn classify(text: &str) -> Self {
    let lower = text.to_lowercase();
    if lower.contains("tour") {
      Self::Tour
    } else if ["roll", "wheel", "barrier"]
      .iter()
      .any(|keyword| lower.contains(keyword))
    {
      Self::BarrierFree
    } else if lower.contains("hike") {
      Self::Doghike
    } else if lower.contains("trekking") {
      Self::Dogtrekking
    } else {
      Self::Unknown
    }
  }
}

// ─── Names ───────────────────────────────────────────────────────────────────

/// Characters that cannot be stored in a `;`-separated, line-based file.
const FORBIDDEN: [char; 2] = [';', '\n'];

/// Data-file lines starting with this are comments.
const COMMENT: char = '#';

/// Strip every character the data file cannot hold, and any leading `#`.
pub fn sanitize_name(name: &str) -> String {
  let kept: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
  kept.trim_start_matches(COMMENT).to_owned()
}

/// `true` if `name` survives [`sanitize_name`] unchanged.
pub fn is_valid_name(name: &str) -> bool {
  !name.contains(FORBIDDEN) && !name.starts_with(COMMENT)
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A participant snapshot.
///
/// `==` and `Hash` compare identity only (case-sensitive name and birthday).
/// Use [`Person::deep_eq`] to find out whether two snapshots differ.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
  name:     String,
  birthday: NaiveDate,
  category: Option<Category>,
  number:   Option<u32>,
  start:    Option<DateTime<Utc>>,
  stop:     Option<DateTime<Utc>>,
  finished: bool,
}

impl Person {
  /// Create a participant with no trip state.
  ///
  /// Fails if the name holds `;` or a line break, or starts with `#`.
  pub fn new(name: impl Into<String>, birthday: NaiveDate) -> Result<Self> {
    let name = name.into();
    if !is_valid_name(&name) {
      return Err(Error::InvalidName(name));
    }
    Ok(Self {
      name,
      birthday,
      category: None,
      number: None,
      start: None,
      stop: None,
      finished: false,
    })
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn birthday(&self) -> NaiveDate { self.birthday }

  pub fn category(&self) -> Option<Category> { self.category }

  pub fn number(&self) -> Option<u32> { self.number }

  pub fn start(&self) -> Option<DateTime<Utc>> { self.start }

  pub fn stop(&self) -> Option<DateTime<Utc>> { self.stop }

  /// The raw finisher flag as recorded, regardless of timestamps.
  pub fn finished_flag(&self) -> bool { self.finished }

  /// A participant counts as finisher only with the flag set and both
  /// timestamps present.
  pub fn is_finisher(&self) -> bool {
    self.finished && self.start.is_some() && self.stop.is_some()
  }

  /// Time between start and stop; `None` unless [`Self::is_finisher`].
  pub fn trip_time(&self) -> Option<TimeDelta> {
    match (self.is_finisher(), self.start, self.stop) {
      (true, Some(start), Some(stop)) => Some(stop - start),
      _ => None,
    }
  }

  /// `true` if this snapshot belongs to the participant `(name, birthday)`.
  pub fn has_identity(&self, name: &str, birthday: NaiveDate) -> bool {
    self.name == name && self.birthday == birthday
  }

  /// Identity plus every piece of trip state, including the derived ones.
  pub fn deep_eq(&self, other: &Self) -> bool {
    self == other
      && self.category == other.category
      && self.number == other.number
      && self.start == other.start
      && self.stop == other.stop
      && self.is_finisher() == other.is_finisher()
      && self.trip_time() == other.trip_time()
  }

  // ── Snapshot builders ────────────────────────────────────────────────────

  pub fn with_category(mut self, category: Option<Category>) -> Self {
    self.category = category;
    self
  }

  pub fn with_number(mut self, number: Option<u32>) -> Self {
    self.number = number;
    self
  }

  pub fn with_start(mut self, start: Option<DateTime<Utc>>) -> Self {
    self.start = start;
    self
  }

  pub fn with_stop(mut self, stop: Option<DateTime<Utc>>) -> Self {
    self.stop = stop;
    self
  }

  pub fn with_finished(mut self, finished: bool) -> Self {
    self.finished = finished;
    self
  }
}

impl PartialEq for Person {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name && self.birthday == other.birthday
  }
}

impl Eq for Person {}

impl Hash for Person {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.name.hash(state);
    self.birthday.hash(state);
  }
}

impl fmt::Display for Person {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.name) }
}

// ─── Orderings ───────────────────────────────────────────────────────────────

/// Display order: name ignoring case, then birthday, then category.
///
/// Snapshots of the same identity compare equal. Names that differ only in
/// case fall back to a case-sensitive comparison so that two distinct
/// identities are never reported as equal.
pub fn alphabetic(a: &Person, b: &Person) -> Ordering {
  if a == b {
    return Ordering::Equal;
  }
  a.name
    .to_lowercase()
    .cmp(&b.name.to_lowercase())
    .then_with(|| a.birthday.cmp(&b.birthday))
    .then_with(|| a.category.cmp(&b.category))
    .then_with(|| a.name.cmp(&b.name))
}

/// Result order: category, then trip time with non-finishers last, then name
/// and birthday.
pub fn by_trip_time(a: &Person, b: &Person) -> Ordering {
  if a == b {
    return Ordering::Equal;
  }
  let trip_time = match (a.trip_time(), b.trip_time()) {
    (Some(x), Some(y)) => x.cmp(&y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  };
  a.category
    .cmp(&b.category)
    .then(trip_time)
    .then_with(|| a.name.cmp(&b.name))
    .then_with(|| a.birthday.cmp(&b.birthday))
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, 1, hour, 0, 0).unwrap()
  }

  fn person(name: &str, category: Category) -> Person {
    Person::new(name, date(1990, 1, 1))
      .unwrap()
      .with_category(Some(category))
  }

  #[test]
  fn name_validation() {
    assert!(is_valid_name("Anton Meier"));
    assert!(is_valid_name("Anton \"AM\" Meier"));
    assert!(is_valid_name("Meier, Anton"));
    assert!(!is_valid_name("Meier; Anton"));
    assert!(!is_valid_name("Meier\nAnton"));
    assert_eq!(sanitize_name("Meier;\nAnton"), "MeierAnton");
    assert!(is_valid_name("Anton #2 Meier"));
    assert!(!is_valid_name("#Anton"));
    assert_eq!(sanitize_name("##Anton #2"), "Anton #2");
    assert_eq!(sanitize_name(";#Anton"), "Anton");
  }

  #[test]
  fn new_rejects_forbidden_characters() {
    let err = Person::new("Ann;Bob", date(1990, 1, 1)).unwrap_err();
    assert!(matches!(err, Error::InvalidName(n) if n == "Ann;Bob"));
  }

  #[test]
  fn finisher_requires_flag_and_both_timestamps() {
    let p = person("Ann", Category::Tour).with_finished(true);
    assert!(!p.is_finisher());
    assert!(p.trip_time().is_none());

    let p = p.with_start(Some(at(2)));
    assert!(!p.is_finisher());

    let p = p.with_stop(Some(at(5)));
    assert!(p.is_finisher());
    assert_eq!(p.trip_time(), Some(TimeDelta::hours(3)));

    let p = p.with_finished(false);
    assert!(!p.is_finisher());
    assert!(!p.finished_flag());
  }

  #[test]
  fn identity_equality_vs_deep_equality() {
    let a = person("Ann", Category::Tour);
    let b = a.clone().with_number(Some(7));
    assert_eq!(a, b);
    assert!(!a.deep_eq(&b));
    assert!(a.deep_eq(&a.clone()));

    let c = Person::new("ann", date(1990, 1, 1)).unwrap();
    assert_ne!(a, c);
  }

  #[test]
  fn category_classification() {
    assert_eq!(Category::classify("Dog Tour 5km"), Category::Tour);
    assert_eq!(Category::classify("Rollstuhl"), Category::BarrierFree);
    assert_eq!(Category::classify("WHEELCHAIR"), Category::BarrierFree);
    assert_eq!(Category::classify("barrier-free"), Category::BarrierFree);
    assert_eq!(Category::classify("DogHike"), Category::Doghike);
    assert_eq!(Category::classify("Dogtrekking 50km"), Category::Dogtrekking);
    assert_eq!(Category::classify("walk"), Category::Unknown);
    // first rule wins
    assert_eq!(Category::classify("hike tour"), Category::Tour);
  }

  #[test]
  fn category_names_roundtrip_through_strum() {
    assert_eq!(Category::BarrierFree.to_string(), "BARRIER_FREE");
    assert_eq!("DOGHIKE".parse::<Category>().unwrap(), Category::Doghike);
  }

  #[test]
  fn alphabetic_ignores_case_then_birthday() {
    let a = Person::new("anna", date(1990, 1, 1)).unwrap();
    let b = Person::new("Bert", date(1980, 1, 1)).unwrap();
    let c = Person::new("bert", date(1985, 1, 1)).unwrap();
    let mut all = vec![c.clone(), b.clone(), a.clone()];
    all.sort_by(alphabetic);
    assert_eq!(all, vec![a, b, c]);
  }

  #[test]
  fn trip_time_ordering() {
    let p1 = person("P1", Category::Dogtrekking)
      .with_start(Some(at(2)))
      .with_stop(Some(at(12)))
      .with_finished(true);
    let p2 = person("P2", Category::Dogtrekking)
      .with_start(Some(at(4)))
      .with_stop(Some(at(13)))
      .with_finished(true);
    let p3 = person("P3", Category::Dogtrekking).with_start(Some(at(2)));
    let p4 = person("P4", Category::Dogtrekking)
      .with_stop(Some(at(2)))
      .with_finished(true);
    let p5 = person("P5", Category::Doghike)
      .with_start(Some(at(4)))
      .with_stop(Some(at(9)))
      .with_finished(true);
    let p6 = person("P6", Category::Doghike)
      .with_start(Some(at(5)))
      .with_stop(Some(at(12)))
      .with_finished(true);

    let expected = vec![p5, p6, p2, p1, p3, p4];
    let mut sorted = expected.clone();
    sorted.reverse();
    sorted.sort_by(by_trip_time);
    assert_eq!(sorted, expected);
  }
}
