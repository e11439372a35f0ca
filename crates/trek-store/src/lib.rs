//! Persistent participant store for the trekking tracker.
//!
//! [`ParticipantStore`] consumes requests from the bus, keeps the full
//! snapshot history in memory and on disk, and publishes accepted changes as
//! events. The data file is a plain `;`-separated log: single updates are
//! appended, bulk replacements rewrite it after rotating the old content to
//! a numbered backup.

mod datafile;
mod encode;
mod store;

pub mod error;

pub use datafile::DataFile;
pub use encode::HEADER;
pub use error::{Error, Result};
pub use store::ParticipantStore;
