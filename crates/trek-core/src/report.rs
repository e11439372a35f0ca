//! The user-facing report sink.
//!
//! Components that need to tell the operator something (a rejected update, a
//! backup being written) receive a [`Reporter`] at construction instead of
//! reaching for a global output.

use tracing::info;

/// Receives human-readable messages meant for the operator.
pub trait Reporter: Send + Sync {
  fn report(&self, message: &str);
}

impl<F> Reporter for F
where
  F: Fn(&str) + Send + Sync,
{
  fn report(&self, message: &str) { self(message) }
}

/// Emits every report as an `info` event on the `trekking::report` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
  fn report(&self, message: &str) {
    info!(target: "trekking::report", "{message}");
  }
}
