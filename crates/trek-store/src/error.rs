//! Error type for `trek-store`.
//!
//! The `Display` text of every variant is what the operator gets to read
//! through the report sink.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot access {}: {source}", path.display())]
  File {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  /// A data-file line that does not hold a participant snapshot.
  #[error("line {line}: {reason}")]
  Parse { line: usize, reason: String },

  #[error(transparent)]
  Core(#[from] trek_core::Error),

  #[error("Could not read initial data file: {0}. Did you set up the config file properly?")]
  Import(#[from] trek_import::Error),

  #[error("Could not restore the previous state: {0}")]
  Restore(#[source] Box<Error>),

  #[error("Could not store {name}: {source}")]
  Store {
    name:   String,
    #[source]
    source: Box<Error>,
  },

  #[error("Could not replace the participant data: {0}")]
  Replace(#[source] Box<Error>),

  /// An update arrived before any successful init or replace.
  #[error("participant store has not been initialized yet")]
  NotInitialized,

  #[error("{0} does already exist.")]
  AlreadyExists(String),

  #[error(
    "Starting number {number} is in use by {requested} and {holder}. Please fix that immediately!"
  )]
  NumberInUse {
    number:    u32,
    requested: String,
    holder:    String,
  },

  #[error("deleting participants is not supported")]
  DeletionUnsupported,
}

impl Error {
  /// `true` for a rejected request that conflicts with stored data, as
  /// opposed to a failure of the store itself.
  pub fn is_conflict(&self) -> bool {
    matches!(self, Self::AlreadyExists(_) | Self::NumberInUse { .. })
  }

  pub(crate) fn file(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
    let path = path.into();
    move |source| Self::File { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
