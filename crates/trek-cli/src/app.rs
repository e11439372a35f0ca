//! Wiring of bus, store and roster, plus the operations behind each command.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use tokio::runtime::Handle;
use tracing::debug;
use trek_bus::{ForegroundThread, Listener, Publisher, ThreadAwarePublisher};
use trek_core::{
  Category, Charset, EventKind, Person, TracingReporter, TrekEvent,
  event::{InputChangeRequest, InputResetRequest, UpdateRequest},
};
use trek_import::{BirthdayFormat, TableImporter};
use trek_store::ParticipantStore;

use crate::{roster::Roster, settings::Settings};

pub struct App {
  bus:      Arc<ThreadAwarePublisher<TrekEvent>>,
  store:    Arc<ParticipantStore>,
  roster:   Arc<Roster>,
  birthday: BirthdayFormat,
}

impl App {
  /// Must be called from within a tokio runtime.
  pub fn start(settings: &Settings) -> anyhow::Result<Self> {
    let executor =
      ForegroundThread::spawn("foreground").context("failed to start the foreground thread")?;
    let bus = Arc::new(ThreadAwarePublisher::new(Handle::current(), Arc::new(executor)));

    let importer = TableImporter::new(settings.table.clone(), settings.birthday_format())
      .context("invalid table configuration")?;
    let store = Arc::new(ParticipantStore::new(
      &settings.data_file,
      importer,
      Arc::clone(&bus) as Arc<dyn Publisher<TrekEvent>>,
      Arc::new(TracingReporter),
    ));
    bus.add_listener(EventKind::Request, Arc::clone(&store) as Listener<TrekEvent>);

    let roster = Arc::new(Roster::default());
    bus.add_foreground_listener(EventKind::Participant, Arc::clone(&roster) as Listener<TrekEvent>);

    Ok(Self { bus, store, roster, birthday: settings.birthday_format() })
  }

  /// Publish `request` and wait until it and everything it triggered has
  /// been delivered. `true` if the roster saw a participant event.
  async fn submit(&self, request: TrekEvent) -> bool {
    let before = self.roster.revision();
    debug!(%request, "publishing");
    self.bus.publish(request);
    self.bus.settled().await;
    self.roster.revision() != before
  }

  /// Load the persisted state into the roster.
  pub async fn init(&self) { self.submit(TrekEvent::InitRequest).await; }

  /// ISO dates are always accepted, the configured registration format
  /// otherwise.
  pub fn parse_birthday(&self, text: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
      .ok()
      .or_else(|| self.birthday.parse(text))
      .with_context(|| format!("cannot parse birthday {text:?}"))
  }

  /// The current snapshot of one participant.
  pub fn participant(&self, name: &str, birthday: &str) -> anyhow::Result<Person> {
    let birthday = self.parse_birthday(birthday)?;
    self
      .roster
      .find(name, birthday)
      .with_context(|| format!("no participant {name} born {birthday}"))
  }

  pub fn participants(&self) -> Vec<Person> { self.roster.participants() }

  pub fn history(&self, name: &str, birthday: &str) -> anyhow::Result<Vec<Person>> {
    let birthday = self.parse_birthday(birthday)?;
    Ok(self.store.history_of(name, birthday))
  }

  // ── Requests ─────────────────────────────────────────────────────────────

  /// A failed import still broadcasts the unchanged input, so the outcome
  /// comes from the store rather than the roster.
  pub async fn import(&self, file: PathBuf, charset: Charset) -> anyhow::Result<usize> {
    let request = TrekEvent::InputResetRequest(InputResetRequest::new(file, charset));
    debug!(%request, "processing");
    let store = Arc::clone(&self.store);
    let outcome = tokio::task::spawn_blocking(move || store.process(&request))
      .await
      .context("import task panicked")?;
    self.bus.settled().await;
    outcome.context("import failed")?;
    Ok(self.roster.participants().len())
  }

  /// Register a participant. The very first one initialises the data file.
  pub async fn add(
    &self,
    name: &str,
    birthday: &str,
    category: Option<Category>,
  ) -> anyhow::Result<Person> {
    let person = Person::new(name, self.parse_birthday(birthday)?)?.with_category(category);
    let request = if self.roster.is_initialized() {
      TrekEvent::UpdateRequest(UpdateRequest::new(None, Some(person.clone()))?)
    } else {
      TrekEvent::InputChangeRequest(InputChangeRequest::new(vec![person.clone()]))
    };
    if !self.submit(request).await {
      bail!("{person} was not added");
    }
    Ok(person)
  }

  /// Replace `old` with `new` unless they are already identical.
  pub async fn update(&self, old: Person, new: Person) -> anyhow::Result<Person> {
    if old.deep_eq(&new) {
      debug!(participant = %new, "nothing to update");
      return Ok(new);
    }
    let request = TrekEvent::UpdateRequest(UpdateRequest::new(Some(old), Some(new.clone()))?);
    if !self.submit(request).await {
      bail!("update of {new} was rejected");
    }
    Ok(new)
  }
}
