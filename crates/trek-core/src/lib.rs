//! Core types for the trekking participant tracker.
//!
//! Participants, their orderings, the read models derived from the snapshot
//! history, and the requests and events exchanged over the bus. This crate
//! performs no I/O; persistence lives in `trek-store`, table import in
//! `trek-import`.

pub mod charset;
pub mod error;
pub mod event;
pub mod person;
pub mod report;
pub mod view;

pub use charset::Charset;
pub use error::{Error, Result};
pub use event::{EventKind, TrekEvent};
pub use person::{Category, Person};
pub use report::{Reporter, TracingReporter};
