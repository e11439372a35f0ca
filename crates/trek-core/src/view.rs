//! Read models derived from the snapshot history.
//!
//! The history is append-only and may hold many snapshots per identity. The
//! "current" state of a participant is never stored, it is always computed by
//! collapsing the history with [`latest_state`].

use std::collections::HashMap;

use tracing::warn;

use crate::{
  person::{self, Person},
  report::Reporter,
};

// ─── Latest-state collapse ───────────────────────────────────────────────────

/// Keep, per identity, the last snapshot in iteration order and return the
/// survivors in [`person::alphabetic`] order.
///
/// Grouping happens by identity before sorting, so a snapshot whose category
/// changed between versions still replaces its predecessor. Collapsing an
/// already-collapsed view returns the same view.
pub fn latest_state<'a, I>(snapshots: I) -> Vec<Person>
where
  I: IntoIterator<Item = &'a Person>,
{
  let mut latest: HashMap<&Person, &Person> = HashMap::new();
  for snapshot in snapshots {
    // keys compare by identity, so this replaces the value only
    latest.insert(snapshot, snapshot);
  }

  let mut view: Vec<Person> = latest.into_values().cloned().collect();
  view.sort_by(person::alphabetic);
  view
}

// ─── Start-number index ──────────────────────────────────────────────────────

/// Message shared by every component that detects a start-number clash.
pub fn number_conflict_message(number: u32, a: &Person, b: &Person) -> String {
  format!("Starting number {number} is in use by {a} and {b}. Please fix that immediately!")
}

/// Start number → the snapshot currently holding it.
#[derive(Debug, Clone, Default)]
pub struct StartNumberIndex {
  holders: HashMap<u32, Person>,
}

impl StartNumberIndex {
  /// Build the index from a latest-state view.
  ///
  /// The first holder of a number wins; any further identity using the same
  /// number is reported but kept out of the index, so corrupted historic data
  /// stays visible instead of being silently resolved.
  pub fn build(latest: &[Person], reporter: &dyn Reporter) -> Self {
    let mut holders: HashMap<u32, Person> = HashMap::with_capacity(latest.len());
    for participant in latest {
      let Some(number) = participant.number() else { continue };
      match holders.get(&number) {
        Some(existing) if existing != participant => {
          warn!(number, "start number used by more than one participant");
          reporter.report(&number_conflict_message(number, existing, participant));
        }
        Some(_) => {}
        None => {
          holders.insert(number, participant.clone());
        }
      }
    }
    Self { holders }
  }

  /// The participant that would clash with `candidate`'s start number: a
  /// different identity already holding it.
  pub fn conflict_for(&self, candidate: &Person) -> Option<&Person> {
    candidate
      .number()
      .and_then(|number| self.holders.get(&number))
      .filter(|holder| *holder != candidate)
  }

  /// Record `snapshot` as the newest state of its identity.
  ///
  /// Any number previously bound to the same identity is released first.
  pub fn apply(&mut self, snapshot: &Person) {
    self.holders.retain(|_, holder| holder != snapshot);
    if let Some(number) = snapshot.number() {
      self.holders.insert(number, snapshot.clone());
    }
  }

  pub fn len(&self) -> usize { self.holders.len() }

  pub fn is_empty(&self) -> bool { self.holders.is_empty() }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::NaiveDate;

  use super::*;
  use crate::person::Category;

  fn p(name: &str) -> Person {
    Person::new(name, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()).unwrap()
  }

  #[test]
  fn latest_state_keeps_last_snapshot_per_identity() {
    let history = vec![
      p("Bob").with_number(Some(1)),
      p("Ann"),
      p("Bob").with_number(Some(2)),
      p("Ann").with_number(Some(3)),
    ];
    let view = latest_state(&history);
    assert_eq!(view.len(), 2);
    assert_eq!(view[0].name(), "Ann");
    assert_eq!(view[0].number(), Some(3));
    assert_eq!(view[1].name(), "Bob");
    assert_eq!(view[1].number(), Some(2));
  }

  #[test]
  fn latest_state_with_changed_category_has_no_duplicates() {
    let history = vec![
      p("Ann").with_category(Some(Category::Tour)),
      p("Ann").with_category(Some(Category::Unknown)),
      p("Ann").with_category(Some(Category::Doghike)),
    ];
    let view = latest_state(&history);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].category(), Some(Category::Doghike));
  }

  #[test]
  fn latest_state_is_idempotent() {
    let history = vec![
      p("Carl").with_number(Some(5)),
      p("ann"),
      p("Bob"),
      p("Carl").with_number(Some(6)),
      p("Ann"),
    ];
    let once = latest_state(&history);
    let twice = latest_state(&once);
    assert_eq!(once.len(), twice.len());
    assert!(once.iter().zip(&twice).all(|(a, b)| a.deep_eq(b)));
    // names differing only in case are separate identities
    assert_eq!(once.len(), 4);
  }

  fn holder_of(index: &StartNumberIndex, number: u32) -> Option<&str> {
    let outsider = p("Zed").with_number(Some(number));
    index.conflict_for(&outsider).map(Person::name)
  }

  #[test]
  fn build_reports_but_keeps_first_holder() {
    let messages = Mutex::new(Vec::<String>::new());
    let reporter = |m: &str| messages.lock().unwrap().push(m.to_owned());
    let view = latest_state(&[p("Ann").with_number(Some(1)), p("Bob").with_number(Some(1))]);

    let index = StartNumberIndex::build(&view, &reporter);
    assert_eq!(index.len(), 1);
    assert_eq!(holder_of(&index, 1), Some("Ann"));

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Starting number 1 is in use by Ann and Bob"));
  }

  #[test]
  fn conflict_only_for_other_identities() {
    let reporter = |_: &str| {};
    let index = StartNumberIndex::build(&[p("Ann").with_number(Some(1))], &reporter);
    assert!(index.conflict_for(&p("Ann").with_number(Some(1))).is_none());
    assert_eq!(
      index.conflict_for(&p("Bob").with_number(Some(1))).map(Person::name),
      Some("Ann")
    );
    assert!(index.conflict_for(&p("Bob")).is_none());
  }

  #[test]
  fn apply_moves_an_identity_to_its_new_number() {
    let reporter = |_: &str| {};
    let mut index = StartNumberIndex::build(&[p("Ann").with_number(Some(1))], &reporter);
    index.apply(&p("Ann").with_number(Some(2)));
    assert_eq!(holder_of(&index, 1), None);
    assert_eq!(holder_of(&index, 2), Some("Ann"));

    index.apply(&p("Ann"));
    assert!(index.is_empty());
  }
}
