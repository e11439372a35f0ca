//! Synchronous fan-out by declared kind.

use std::{
  any::Any,
  collections::HashMap,
  panic::{self, AssertUnwindSafe},
  sync::{PoisonError, RwLock},
};

use tracing::debug;

use crate::{Event, Kind, Listener, Publisher, same_listener};

/// Delivers each event to the listeners of every matching kind, on the
/// calling thread.
///
/// Kinds are visited in no particular order; listeners of one kind run in
/// registration order.
pub struct EventPublisher<E: Event> {
  listeners: RwLock<HashMap<E::Kind, Vec<Listener<E>>>>,
}

impl<E: Event> EventPublisher<E> {
  pub fn new() -> Self { Self { listeners: RwLock::new(HashMap::new()) } }

  /// Run every matching listener and return how many were invoked.
  ///
  /// The listener table is not locked while handlers run, so a handler may
  /// register or remove listeners itself.
  pub fn deliver(&self, event: &E) -> usize {
    let kind = event.kind();
    let matched = self.matching(kind);
    for listener in &matched {
      let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.handle(event)));
      if let Err(payload) = outcome {
        debug!(?kind, reason = panic_reason(payload.as_ref()), "event listener failed");
      }
    }
    matched.len()
  }

  /// Number of registrations across all kinds.
  pub fn listener_count(&self) -> usize {
    self
      .listeners
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .values()
      .map(Vec::len)
      .sum()
  }

  fn matching(&self, kind: E::Kind) -> Vec<Listener<E>> {
    self
      .listeners
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .filter(|(declared, _)| declared.is_assignable_from(kind))
      .flat_map(|(_, listeners)| listeners.iter().cloned())
      .collect()
  }
}

impl<E: Event> Default for EventPublisher<E> {
  fn default() -> Self { Self::new() }
}

impl<E: Event> Publisher<E> for EventPublisher<E> {
  fn add_listener(&self, kind: E::Kind, listener: Listener<E>) {
    self
      .listeners
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(kind)
      .or_default()
      .push(listener);
  }

  fn remove_listener(&self, listener: &Listener<E>) {
    let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
    for registered in listeners.values_mut() {
      registered.retain(|l| !same_listener(l, listener));
    }
    listeners.retain(|_, registered| !registered.is_empty());
  }

  fn remove_listener_from(&self, kind: E::Kind, listener: &Listener<E>) {
    let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(registered) = listeners.get_mut(&kind) {
      registered.retain(|l| !same_listener(l, listener));
      if registered.is_empty() {
        listeners.remove(&kind);
      }
    }
  }

  fn publish(&self, event: E) { self.deliver(&event); }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
  payload
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("unknown panic")
}
