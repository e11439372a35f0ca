//! The single execution context foreground listeners run on.

use std::{
  io,
  panic::{self, AssertUnwindSafe},
  thread,
};

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A unit of foreground work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs one after another, never concurrently with itself, in the order
/// they were handed over.
pub trait ForegroundExecutor: Send + Sync {
  fn execute(&self, job: Job);
}

/// A dedicated, named OS thread draining a job queue, in the way a desktop
/// toolkit owns a single UI thread.
///
/// The thread stops once every handle to the queue has been dropped.
#[derive(Clone)]
pub struct ForegroundThread {
  queue: mpsc::UnboundedSender<Job>,
}

impl ForegroundThread {
  pub fn spawn(name: &str) -> io::Result<Self> {
    let (queue, mut jobs) = mpsc::unbounded_channel::<Job>();
    thread::Builder::new().name(name.to_owned()).spawn(move || {
      while let Some(job) = jobs.blocking_recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
          debug!("foreground job panicked");
        }
      }
      debug!("foreground queue closed");
    })?;
    Ok(Self { queue })
  }
}

impl ForegroundExecutor for ForegroundThread {
  fn execute(&self, job: Job) {
    if self.queue.send(job).is_err() {
      warn!("foreground thread has stopped; dropping job");
    }
  }
}
