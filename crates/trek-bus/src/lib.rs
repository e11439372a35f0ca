//! Typed, in-process event bus.
//!
//! Listeners register under a declared *kind*. A published event reaches
//! every listener whose declared kind is the event's own kind or one of its
//! ancestors, so one listener can follow a broad family while another
//! follows a single message type.
//!
//! Two publishers are provided:
//!
//! - [`EventPublisher`] delivers synchronously on the calling thread.
//! - [`ThreadAwarePublisher`] splits listeners into a background and a
//!   foreground tier and delivers each event asynchronously, background
//!   first, then foreground on a single designated executor.

mod foreground;
mod publisher;
mod thread_aware;

#[cfg(test)]
mod test_support;

use std::{fmt::Debug, hash::Hash, sync::Arc};

pub use foreground::{ForegroundExecutor, ForegroundThread, Job};
pub use publisher::EventPublisher;
pub use thread_aware::{ThreadAwarePublisher, Tier};

// ─── Typing ──────────────────────────────────────────────────────────────────

/// A declared event type in a closed hierarchy.
pub trait Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static {
  /// `true` if a value of kind `actual` may be delivered to a listener
  /// declared for `self`, i.e. `self` is `actual` or one of its ancestors.
  fn is_assignable_from(self, actual: Self) -> bool;
}

/// A message that can travel over the bus.
pub trait Event: Send + Sync + 'static {
  type Kind: Kind;

  /// The most specific kind of this value.
  fn kind(&self) -> Self::Kind;
}

// ─── Listeners ───────────────────────────────────────────────────────────────

/// Receives events of the kind it was registered for.
///
/// Panics raised by a handler are caught by the publisher and never reach
/// other listeners.
pub trait EventHandler<E>: Send + Sync {
  fn handle(&self, event: &E);
}

impl<E, F> EventHandler<E> for F
where
  F: Fn(&E) + Send + Sync,
{
  fn handle(&self, event: &E) { self(event) }
}

/// A registered handler. Identity is the allocation: removing a listener
/// removes every registration made with a clone of the same `Arc`.
pub type Listener<E> = Arc<dyn EventHandler<E>>;

pub(crate) fn same_listener<E>(a: &Listener<E>, b: &Listener<E>) -> bool {
  std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ─── Publishing ──────────────────────────────────────────────────────────────

/// The registration and publishing surface shared by both publishers.
pub trait Publisher<E: Event>: Send + Sync {
  /// Register `listener` for events of `kind` and its descendants.
  fn add_listener(&self, kind: E::Kind, listener: Listener<E>);

  /// Remove `listener` from every kind it is registered for.
  fn remove_listener(&self, listener: &Listener<E>);

  /// Remove `listener` from `kind` only.
  fn remove_listener_from(&self, kind: E::Kind, listener: &Listener<E>);

  fn publish(&self, event: E);
}
