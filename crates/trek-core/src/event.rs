//! Requests and events exchanged over the bus.
//!
//! A request is what a caller proposes; an event is what the participant
//! store has accepted and broadcasts as fact. The two families mirror each
//! other: [`UpdateRequest`] ↔ [`Update`], [`InputChangeRequest`] ↔
//! [`InputChanged`].
//!
//! All payloads are immutable once built. Collections are shared through
//! `Arc<[Person]>` so every observer sees the same snapshot.

use std::{fmt, path::PathBuf, sync::Arc};

use trek_bus::{Event, Kind};

use crate::{Charset, Error, Result, person::Person, view::latest_state};

// ─── Single-participant change ───────────────────────────────────────────────

fn check_identity(old: Option<&Person>, new: Option<&Person>) -> Result<()> {
  match (old, new) {
    (Some(old), Some(new)) if old != new => Err(Error::IdentityMismatch {
      old: old.to_string(),
      new: new.to_string(),
    }),
    _ => Ok(()),
  }
}

fn fmt_state(state: Option<&Person>) -> String {
  state.map_or_else(|| "none".to_owned(), Person::to_string)
}

/// An accepted change of a single participant.
///
/// `old == None` marks a creation, `new == None` a deletion.
#[derive(Debug, Clone)]
pub struct Update {
  old: Option<Person>,
  new: Option<Person>,
}

impl Update {
  /// Fails if both states are present but belong to different identities.
  pub fn new(old: Option<Person>, new: Option<Person>) -> Result<Self> {
    check_identity(old.as_ref(), new.as_ref())?;
    Ok(Self { old, new })
  }

  pub fn old(&self) -> Option<&Person> { self.old.as_ref() }

  pub fn new_state(&self) -> Option<&Person> { self.new.as_ref() }
}

impl fmt::Display for Update {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Update {}->{}", fmt_state(self.old()), fmt_state(self.new_state()))
  }
}

/// A proposed change of a single participant.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
  proposed: Update,
}

impl UpdateRequest {
  /// Fails if both states are present but belong to different identities.
  pub fn new(old: Option<Person>, new: Option<Person>) -> Result<Self> {
    Ok(Self { proposed: Update::new(old, new)? })
  }

  pub fn old(&self) -> Option<&Person> { self.proposed.old() }

  pub fn new_state(&self) -> Option<&Person> { self.proposed.new_state() }

  /// The event to broadcast once the store has accepted this request.
  pub fn to_event(&self) -> Update { self.proposed.clone() }
}

impl fmt::Display for UpdateRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Update request {}->{}",
      fmt_state(self.old()),
      fmt_state(self.new_state())
    )
  }
}

// ─── Whole-input change ──────────────────────────────────────────────────────

/// The data model was (re)set.
///
/// `None` signals a failed initialisation, so observers can still react.
#[derive(Debug, Clone, Default)]
pub struct InputChanged {
  input: Option<Arc<[Person]>>,
}

impl InputChanged {
  pub fn new(input: Option<Arc<[Person]>>) -> Self { Self { input } }

  /// The full snapshot history, possibly with several versions per identity.
  pub fn input(&self) -> Option<&[Person]> { self.input.as_deref() }

  /// The latest state of every participant, alphabetically ordered.
  pub fn input_view(&self) -> Option<Vec<Person>> { self.input().map(latest_state) }
}

impl fmt::Display for InputChanged {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let size = self.input().map_or(0, <[Person]>::len);
    write!(f, "Input changed: {size} persons")
  }
}

/// Replace the whole data model with `input`.
#[derive(Debug, Clone)]
pub struct InputChangeRequest {
  input: Arc<[Person]>,
}

impl InputChangeRequest {
  pub fn new(input: impl Into<Arc<[Person]>>) -> Self { Self { input: input.into() } }

  pub fn input(&self) -> &[Person] { &self.input }

  /// Shared handle to the proposed collection.
  pub fn shared_input(&self) -> Arc<[Person]> { Arc::clone(&self.input) }

  /// The event to broadcast once the store has accepted this request.
  pub fn to_event(&self) -> InputChanged { InputChanged::new(Some(self.shared_input())) }
}

impl fmt::Display for InputChangeRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Input change request: {} persons", self.input.len())
  }
}

/// Re-read the registered participants from an external table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputResetRequest {
  pub path:    PathBuf,
  pub charset: Charset,
}

impl InputResetRequest {
  pub fn new(path: impl Into<PathBuf>, charset: Charset) -> Self {
    Self { path: path.into(), charset }
  }
}

impl fmt::Display for InputResetRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Reset with {}'s content ({})", self.path.display(), self.charset)
  }
}

// ─── Bus message ─────────────────────────────────────────────────────────────

/// Every message that travels over the participant bus.
#[derive(Debug, Clone)]
pub enum TrekEvent {
  // ── Requests ────────────────────────────────────────────────────────────
  InitRequest,
  UpdateRequest(UpdateRequest),
  InputChangeRequest(InputChangeRequest),
  InputResetRequest(InputResetRequest),

  // ── Participant events ──────────────────────────────────────────────────
  InputChanged(InputChanged),
  Update(Update),
}

impl fmt::Display for TrekEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InitRequest => f.write_str("Init request"),
      Self::UpdateRequest(r) => write!(f, "{r}"),
      Self::InputChangeRequest(r) => write!(f, "{r}"),
      Self::InputResetRequest(r) => write!(f, "{r}"),
      Self::InputChanged(e) => write!(f, "{e}"),
      Self::Update(e) => write!(f, "{e}"),
    }
  }
}

/// The declared type of a [`TrekEvent`], arranged as a hierarchy:
///
/// ```text
/// Any
/// ├── Request ── InitRequest, UpdateRequest, InputChangeRequest, InputResetRequest
/// └── Participant ── InputChanged, Update
/// ```
///
/// A listener registered for a kind receives every message of that kind or
/// any kind below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Any,
  Request,
  Participant,
  InitRequest,
  UpdateRequest,
  InputChangeRequest,
  InputResetRequest,
  InputChanged,
  Update,
}

impl EventKind {
  /// The direct ancestor in the hierarchy; `None` for [`EventKind::Any`].
  pub fn parent(self) -> Option<Self> {
    match self {
      Self::Any => None,
      Self::Request | Self::Participant => Some(Self::Any),
      Self::InitRequest
      | Self::UpdateRequest
      | Self::InputChangeRequest
      | Self::InputResetRequest => Some(Self::Request),
      Self::InputChanged | Self::Update => Some(Self::Participant),
    }
  }
}

impl Kind for EventKind {
  fn is_assignable_from(self, actual: Self) -> bool {
    std::iter::successors(Some(actual), |kind| kind.parent()).any(|kind| kind == self)
  }
}

impl Event for TrekEvent {
  type Kind = EventKind;

  fn kind(&self) -> EventKind {
    match self {
      Self::InitRequest => EventKind::InitRequest,
      Self::UpdateRequest(_) => EventKind::UpdateRequest,
      Self::InputChangeRequest(_) => EventKind::InputChangeRequest,
      Self::InputResetRequest(_) => EventKind::InputResetRequest,
      Self::InputChanged(_) => EventKind::InputChanged,
      Self::Update(_) => EventKind::Update,
    }
  }
}

// ─── Observers ───────────────────────────────────────────────────────────────

/// An observer of participant events, typically registered for
/// [`EventKind::Participant`].
pub trait ParticipantProcessor: Send + Sync {
  /// The whole data model was (re)set.
  fn set_input(&self, event: &InputChanged);

  /// A single participant changed.
  fn update_person(&self, event: &Update);

  /// Route a bus message to the matching method; requests are ignored.
  fn process(&self, event: &TrekEvent) {
    match event {
      TrekEvent::InputChanged(e) => self.set_input(e),
      TrekEvent::Update(e) => self.update_person(e),
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn p(name: &str) -> Person {
    Person::new(name, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()).unwrap()
  }

  #[test]
  fn update_requires_matching_identity() {
    assert!(Update::new(Some(p("Ann")), Some(p("Ann").with_number(Some(3)))).is_ok());
    assert!(Update::new(None, Some(p("Ann"))).is_ok());
    assert!(Update::new(Some(p("Ann")), None).is_ok());
    assert!(matches!(
      UpdateRequest::new(Some(p("Ann")), Some(p("Bob"))),
      Err(Error::IdentityMismatch { .. })
    ));
  }

  #[test]
  fn request_converts_to_equivalent_event() {
    let request = UpdateRequest::new(None, Some(p("Ann").with_number(Some(1)))).unwrap();
    let event = request.to_event();
    assert!(event.old().is_none());
    assert!(event.new_state().unwrap().deep_eq(request.new_state().unwrap()));

    let change = InputChangeRequest::new(vec![p("Ann"), p("Ann"), p("Bob")]);
    let changed = change.to_event();
    assert_eq!(changed.input().unwrap().len(), 3);
    assert_eq!(changed.input_view().unwrap().len(), 2);
    assert_eq!(changed.to_string(), "Input changed: 3 persons");
  }

  #[test]
  fn failed_init_event_has_no_input() {
    let event = InputChanged::new(None);
    assert!(event.input().is_none());
    assert!(event.input_view().is_none());
  }

  #[test]
  fn kind_hierarchy_matching() {
    let update = TrekEvent::Update(Update::new(None, Some(p("Ann"))).unwrap());
    assert!(EventKind::Any.is_assignable_from(update.kind()));
    assert!(EventKind::Participant.is_assignable_from(update.kind()));
    assert!(EventKind::Update.is_assignable_from(update.kind()));
    assert!(!EventKind::Request.is_assignable_from(update.kind()));
    assert!(!EventKind::InputChanged.is_assignable_from(update.kind()));

    assert!(EventKind::Request.is_assignable_from(TrekEvent::InitRequest.kind()));
    assert!(!EventKind::Update.is_assignable_from(EventKind::Participant));
  }

  #[test]
  fn processor_dispatches_by_variant() {
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl ParticipantProcessor for Recorder {
      fn set_input(&self, _: &InputChanged) { self.0.lock().unwrap().push("input"); }

      fn update_person(&self, _: &Update) { self.0.lock().unwrap().push("update"); }
    }

    let recorder = Recorder::default();
    recorder.process(&TrekEvent::InitRequest);
    recorder.process(&TrekEvent::InputChanged(InputChanged::default()));
    recorder.process(&TrekEvent::Update(Update::new(None, Some(p("Ann"))).unwrap()));
    assert_eq!(*recorder.0.lock().unwrap(), vec!["input", "update"]);
  }
}
