//! Error types for `trek-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0:?} contains invalid characters")]
  InvalidName(String),

  #[error("old and new state must relate to the same participant ({old} vs. {new})")]
  IdentityMismatch { old: String, new: String },

  #[error("unknown charset: {0:?}")]
  UnknownCharset(String),

  #[error("input is not valid {charset}: {reason}")]
  Decoding {
    charset: &'static str,
    reason:  String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
