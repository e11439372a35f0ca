//! Error type for `trek-import`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read import file: {0}")]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Core(#[from] trek_core::Error),

  #[error("invalid table configuration: {0}")]
  Config(String),

  #[error("line {line}: column {column} is missing")]
  MissingColumn { line: usize, column: usize },

  #[error("line {line}: cannot parse birthday {value:?}")]
  Birthday { line: usize, value: String },

  #[error("line {line}: name {name:?} contains invalid characters")]
  InvalidName { line: usize, name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
