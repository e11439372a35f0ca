//! The console's copy of the participant list, kept current from events.

use std::sync::{
  Mutex, MutexGuard, PoisonError,
  atomic::{AtomicUsize, Ordering},
};

use chrono::NaiveDate;
use tracing::debug;
use trek_bus::EventHandler;
use trek_core::{
  Person, TrekEvent,
  event::{InputChanged, ParticipantProcessor, Update},
  person,
};

/// Latest state of every participant as last broadcast by the store.
///
/// `None` until an init or replace has succeeded.
#[derive(Default)]
pub struct Roster {
  participants: Mutex<Option<Vec<Person>>>,
  revision:     AtomicUsize,
}

impl Roster {
  /// Bumped on every participant event.
  pub fn revision(&self) -> usize { self.revision.load(Ordering::Acquire) }

  pub fn is_initialized(&self) -> bool { self.lock().is_some() }

  pub fn find(&self, name: &str, birthday: NaiveDate) -> Option<Person> {
    self
      .lock()
      .iter()
      .flatten()
      .find(|p| p.has_identity(name, birthday))
      .cloned()
  }

  /// Alphabetically ordered; empty before initialization.
  pub fn participants(&self) -> Vec<Person> { self.lock().clone().unwrap_or_default() }

  fn lock(&self) -> MutexGuard<'_, Option<Vec<Person>>> {
    self.participants.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn bump(&self) { self.revision.fetch_add(1, Ordering::AcqRel); }
}

impl ParticipantProcessor for Roster {
  fn set_input(&self, event: &InputChanged) {
    let view = event.input_view();
    debug!(participants = view.as_ref().map(Vec::len), "roster reset");
    *self.lock() = view;
    self.bump();
  }

  fn update_person(&self, event: &Update) {
    {
      let mut participants = self.lock();
      let list = participants.get_or_insert_with(Vec::new);
      if let Some(old) = event.old() {
        list.retain(|p| p != old);
      }
      if let Some(new) = event.new_state() {
        list.retain(|p| p != new);
        list.push(new.clone());
        list.sort_by(person::alphabetic);
      }
    }
    debug!(%event, "roster updated");
    self.bump();
  }
}

impl EventHandler<TrekEvent> for Roster {
  fn handle(&self, event: &TrekEvent) { self.process(event) }
}
