//! Two-tier asynchronous delivery.
//!
//! Every call to [`Publisher::publish`] becomes its own unit of work on the
//! tokio blocking pool:
//!
//! 1. all background listeners run, in registration order, on that worker;
//! 2. once they have returned, a job delivering the event to the foreground
//!    listeners is queued on the [`ForegroundExecutor`].
//!
//! The two phases are ordered *within* one publish call only. Two publish
//! calls run on independent workers, so a later event may reach the
//! foreground before an earlier one. Observers that need cross-event
//! ordering must serialise upstream.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use tokio::{runtime::Handle, sync::Notify};
use tracing::trace;

use crate::{Event, EventPublisher, ForegroundExecutor, Listener, Publisher};

/// Which execution context a listener runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
  /// A blocking-pool worker, before any foreground listener.
  #[default]
  Background,
  /// The single foreground executor, after every background listener.
  Foreground,
}

// ─── In-flight tracking ──────────────────────────────────────────────────────

#[derive(Default)]
struct InFlight {
  count: AtomicUsize,
  idle:  Notify,
}

/// Marks one publish call as running until dropped, whether the foreground
/// job ran or was discarded.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
  fn begin(in_flight: &Arc<InFlight>) -> Self {
    in_flight.count.fetch_add(1, Ordering::AcqRel);
    Self(Arc::clone(in_flight))
  }
}

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
      self.0.idle.notify_waiters();
    }
  }
}

// ─── Publisher ───────────────────────────────────────────────────────────────

pub struct ThreadAwarePublisher<E: Event> {
  background: Arc<EventPublisher<E>>,
  foreground: Arc<EventPublisher<E>>,
  executor:   Arc<dyn ForegroundExecutor>,
  runtime:    Handle,
  in_flight:  Arc<InFlight>,
}

impl<E: Event> ThreadAwarePublisher<E> {
  /// Background phases are spawned on `runtime`'s blocking pool; foreground
  /// phases are handed to `executor`.
  pub fn new(runtime: Handle, executor: Arc<dyn ForegroundExecutor>) -> Self {
    Self {
      background: Arc::new(EventPublisher::new()),
      foreground: Arc::new(EventPublisher::new()),
      executor,
      runtime,
      in_flight: Arc::default(),
    }
  }

  /// Register `listener` on an explicit tier.
  pub fn add_listener_in(&self, tier: Tier, kind: E::Kind, listener: Listener<E>) {
    match tier {
      Tier::Background => self.background.add_listener(kind, listener),
      Tier::Foreground => self.foreground.add_listener(kind, listener),
    }
  }

  pub fn add_foreground_listener(&self, kind: E::Kind, listener: Listener<E>) {
    self.add_listener_in(Tier::Foreground, kind, listener);
  }

  /// Number of publish calls whose foreground phase has not finished yet.
  pub fn in_flight(&self) -> usize { self.in_flight.count.load(Ordering::Acquire) }

  /// Wait until no publish call is in flight.
  ///
  /// Events published by listeners while earlier events are still being
  /// delivered are waited for as well. This only observes completion; it
  /// does not order independent publish calls.
  pub async fn settled(&self) {
    loop {
      let idle = self.in_flight.idle.notified();
      tokio::pin!(idle);
      idle.as_mut().enable();
      if self.in_flight() == 0 {
        return;
      }
      idle.await;
    }
  }
}

impl<E: Event> Publisher<E> for ThreadAwarePublisher<E> {
  /// Registers on the background tier.
  fn add_listener(&self, kind: E::Kind, listener: Listener<E>) {
    self.add_listener_in(Tier::Background, kind, listener);
  }

  fn remove_listener(&self, listener: &Listener<E>) {
    self.background.remove_listener(listener);
    self.foreground.remove_listener(listener);
  }

  fn remove_listener_from(&self, kind: E::Kind, listener: &Listener<E>) {
    self.background.remove_listener_from(kind, listener);
    self.foreground.remove_listener_from(kind, listener);
  }

  /// Returns immediately; delivery happens asynchronously.
  fn publish(&self, event: E) {
    let guard = InFlightGuard::begin(&self.in_flight);
    let event = Arc::new(event);
    let background = Arc::clone(&self.background);
    let foreground = Arc::clone(&self.foreground);
    let executor = Arc::clone(&self.executor);

    self.runtime.spawn_blocking(move || {
      let kind = event.kind();
      let invoked = background.deliver(&event);
      trace!(?kind, invoked, "background phase done");
      executor.execute(Box::new(move || {
        let invoked = foreground.deliver(&event);
        trace!(?kind, invoked, "foreground phase done");
        drop(guard);
      }));
    });
  }
}
