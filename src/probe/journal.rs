use std::{fmt, thread};

use crate::{
  error::Fault,
  rc::{MutArc, RcDeref, RcDerefMut},
};

/// A lifecycle event observed during a probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Subscribing,
  Subscribed,
  SourceStarted,
  SourceThrowing,
  SourceErroring,
  SourceCompleting,
  SourceEndedSilently,
  Next(i64),
  Error(Fault),
  Completed,
  FinallyEntered,
  Cancelling,
  Cancelled,
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Event::Subscribing => f.write_str("subscribing"),
      Event::Subscribed => f.write_str("subscribed"),
      Event::SourceStarted => f.write_str("source started"),
      Event::SourceThrowing => f.write_str("source is about to panic"),
      Event::SourceErroring => f.write_str("source is signalling an error"),
      Event::SourceCompleting => f.write_str("source is completing"),
      Event::SourceEndedSilently => f.write_str("source ended without a terminal signal"),
      Event::Next(v) => write!(f, "next: {v}"),
      Event::Error(fault) => write!(f, "error: {fault}"),
      Event::Completed => f.write_str("completed"),
      Event::FinallyEntered => f.write_str("finally entered"),
      Event::Cancelling => f.write_str("cancelling"),
      Event::Cancelled => f.write_str("cancelled"),
    }
  }
}

/// Ordered, thread-safe record of the events of one run.
#[derive(Clone, Default)]
pub struct Journal(MutArc<Vec<Event>>);

impl Journal {
  pub fn record(&self, event: Event) {
    let current = thread::current();
    let thread = current.name().unwrap_or("<unnamed>");
    match &event {
      Event::Error(_) => tracing::warn!(thread, "{event}"),
      _ => tracing::info!(thread, "{event}"),
    }
    self.0.rc_deref_mut().push(event);
  }

  pub fn events(&self) -> Vec<Event> { self.0.rc_deref().clone() }

  pub fn contains(&self, event: &Event) -> bool { self.0.rc_deref().contains(event) }
}
