//! A small event hierarchy for exercising the publishers.

use crate::{Event, Kind};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
  Text(String),
  Number(i64),
}

/// `Any` ⊃ {`Text`, `Number`}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
  Any,
  Text,
  Number,
}

impl Kind for MessageKind {
  fn is_assignable_from(self, actual: Self) -> bool {
    self == actual || self == Self::Any
  }
}

impl Event for Message {
  type Kind = MessageKind;

  fn kind(&self) -> MessageKind {
    match self {
      Self::Text(_) => MessageKind::Text,
      Self::Number(_) => MessageKind::Number,
    }
  }
}
