//! The single writer of participant state.

use std::{
  path::PathBuf,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};
use trek_bus::{EventHandler, Publisher};
use trek_core::{
  Person, Reporter, TrekEvent,
  event::{InputChanged, InputResetRequest, UpdateRequest},
  view::{StartNumberIndex, latest_state},
};
use trek_import::{TableImporter, duplicates, duplicates_message};

use crate::{Error, Result, datafile::DataFile};

// ─── State ───────────────────────────────────────────────────────────────────

/// Everything guarded by the store lock.
#[derive(Default)]
struct State {
  /// Every accepted snapshot in acceptance order; `None` until the first
  /// successful restore or replace.
  history: Option<Vec<Person>>,
  /// Built from the latest state of `history`.
  index:   StartNumberIndex,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Owns the participant history, its data file and the start-number index.
///
/// Requests are handled one at a time under a single lock that covers
/// validation, the file write and the in-memory change. Accepted changes are
/// broadcast through the publisher; every rejection or failure is reported
/// to the operator and never escapes [`EventHandler::handle`].
pub struct ParticipantStore {
  state:     Mutex<State>,
  file:      DataFile,
  importer:  TableImporter,
  publisher: Arc<dyn Publisher<TrekEvent>>,
  reporter:  Arc<dyn Reporter>,
}

impl ParticipantStore {
  pub fn new(
    data_file: impl Into<PathBuf>,
    importer: TableImporter,
    publisher: Arc<dyn Publisher<TrekEvent>>,
    reporter: Arc<dyn Reporter>,
  ) -> Self {
    Self {
      state: Mutex::default(),
      file: DataFile::new(data_file),
      importer,
      publisher,
      reporter,
    }
  }

  /// Handle one request and broadcast its outcome.
  ///
  /// Failures are reported before they are returned. Init and reset always
  /// broadcast an [`InputChanged`]; after a failure it carries the unchanged
  /// history, or no input if the store is still uninitialized.
  /// Participant events are not addressed to the store and are ignored.
  pub fn process(&self, event: &TrekEvent) -> Result<()> {
    let mut state = self.lock();
    let outcome = match event {
      TrekEvent::InitRequest => {
        let restored = self.restore(&mut state);
        self.publish_input(&state);
        restored
      }
      TrekEvent::UpdateRequest(request) => self.update(&mut state, request),
      TrekEvent::InputChangeRequest(request) => self.replace(&mut state, request.shared_input()),
      TrekEvent::InputResetRequest(request) => {
        let reset = self.reset(&mut state, request);
        if reset.is_err() {
          self.publish_input(&state);
        }
        reset
      }
      TrekEvent::InputChanged(_) | TrekEvent::Update(_) => return Ok(()),
    };

    if let Err(e) = &outcome {
      match e {
        Error::NotInitialized => error!(request = %event, "request before initialization"),
        e if e.is_conflict() => warn!(request = %event, error = %e, "request rejected"),
        e => error!(request = %event, error = %e, "request failed"),
      }
      self.reporter.report(&e.to_string());
    }
    outcome
  }

  // ── Queries ──────────────────────────────────────────────────────────────

  pub fn is_initialized(&self) -> bool { self.lock().history.is_some() }

  /// The latest state of every participant, alphabetically ordered.
  pub fn current_view(&self) -> Option<Vec<Person>> {
    self.lock().history.as_deref().map(latest_state)
  }

  /// Every recorded snapshot of one participant, oldest first.
  pub fn history_of(&self, name: &str, birthday: NaiveDate) -> Vec<Person> {
    self
      .lock()
      .history
      .iter()
      .flatten()
      .filter(|p| p.has_identity(name, birthday))
      .cloned()
      .collect()
  }

  fn publish_input(&self, state: &State) {
    let input = state.history.as_deref().map(Arc::<[Person]>::from);
    self.publisher.publish(TrekEvent::InputChanged(InputChanged::new(input)));
  }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Operations ───────────────────────────────────────────────────────────

  /// Load the data file. A missing or empty file leaves the store as it was.
  fn restore(&self, state: &mut State) -> Result<()> {
    let restored = self
      .file
      .read_all()
      .map_err(|e| Error::Restore(Box::new(e)))?;
    match restored {
      Some(history) if !history.is_empty() => {
        state.index = StartNumberIndex::build(&latest_state(&history), self.reporter.as_ref());
        info!(snapshots = history.len(), numbers = state.index.len(), "participant data restored");
        state.history = Some(history);
      }
      _ => info!(path = %self.file.path().display(), "no previous participant data"),
    }
    Ok(())
  }

  fn update(&self, state: &mut State, request: &UpdateRequest) -> Result<()> {
    let new = request.new_state().ok_or(Error::DeletionUnsupported)?;
    let history = state.history.as_mut().ok_or(Error::NotInitialized)?;

    if request.old().is_none() && history.contains(new) {
      return Err(Error::AlreadyExists(new.to_string()));
    }
    if let (Some(number), Some(holder)) = (new.number(), state.index.conflict_for(new)) {
      return Err(Error::NumberInUse {
        number,
        requested: new.to_string(),
        holder: holder.to_string(),
      });
    }

    self.file.append(new).map_err(|e| Error::Store {
      name:   new.to_string(),
      source: Box::new(e),
    })?;
    history.push(new.clone());
    state.index.apply(new);
    debug!(participant = %new, number = ?new.number(), "update stored");
    self.reporter.report(&format!("Stored updates for {new}."));

    self.publisher.publish(TrekEvent::Update(request.to_event()));
    Ok(())
  }

  fn replace(&self, state: &mut State, input: Arc<[Person]>) -> Result<()> {
    let index = StartNumberIndex::build(&latest_state(input.iter()), self.reporter.as_ref());
    let backup = self
      .file
      .rewrite(&input)
      .map_err(|e| Error::Replace(Box::new(e)))?;
    if let Some(backup) = backup {
      self
        .reporter
        .report(&format!("Creating backup file '{}' for old data.", backup.display()));
    }

    state.history = Some(input.to_vec());
    state.index = index;
    info!(snapshots = input.len(), numbers = state.index.len(), "participant data replaced");

    self.publisher.publish(TrekEvent::InputChanged(InputChanged::new(Some(input))));
    Ok(())
  }

  fn reset(&self, state: &mut State, request: &InputResetRequest) -> Result<()> {
    let rows = self.importer.read_file(&request.path, request.charset)?;
    if let Some(message) = duplicates_message(&duplicates(&rows)) {
      self.reporter.report(&message);
    }
    self.replace(state, rows.into())
  }
}

impl EventHandler<TrekEvent> for ParticipantStore {
  /// Outcomes are reported inside [`ParticipantStore::process`].
  fn handle(&self, event: &TrekEvent) { let _ = self.process(event); }
}
