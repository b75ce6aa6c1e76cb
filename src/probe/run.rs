use std::{
  fmt,
  panic::{catch_unwind, AssertUnwindSafe},
  thread,
};

use crate::{
  error::Fault,
  observable::ObservableExt,
  probe::{
    source::{self, RecordingScheduler},
    Event, Journal, ProbeConfig, ProbeError, Strategy,
  },
  subscription::Subscription,
};

/// Panic message of the finally callback.
pub const FINALLY_MESSAGE: &str = "FINALLY WENT BANG";

/// Where the finally callback's panic ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinallyOutcome {
  /// The callback never ran.
  NotReached,
  /// The callback ran and was not asked to panic.
  Clean,
  /// The panic unwound out of `subscribe` or `unsubscribe` on the caller.
  PropagatedToCaller,
  /// The panic ended a worker thread.
  EscapedOnWorker { thread: String },
  /// The panic was caught and handed to the subscriber's error handler.
  DeliveredToSubscriber,
  /// The callback panicked and nobody saw it.
  Swallowed,
}

impl fmt::Display for FinallyOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FinallyOutcome::NotReached => f.write_str("finally never ran"),
      FinallyOutcome::Clean => f.write_str("finally ran without panicking"),
      FinallyOutcome::PropagatedToCaller => f.write_str("finally panic reached the caller"),
      FinallyOutcome::EscapedOnWorker { thread } => {
        write!(f, "finally panic escaped on worker thread '{thread}'")
      }
      FinallyOutcome::DeliveredToSubscriber => {
        f.write_str("finally panic was delivered to the subscriber as an error")
      }
      FinallyOutcome::Swallowed => f.write_str("finally panic was swallowed"),
    }
  }
}

/// Everything one probe run observed.
#[derive(Debug, Clone)]
pub struct ProbeReport {
  pub config: ProbeConfig,
  pub events: Vec<Event>,
  /// Panic that unwound out of `subscribe` or the cancelling `unsubscribe`.
  pub caller_fault: Option<Fault>,
  /// Panics that ended worker threads, by thread name.
  pub worker_faults: Vec<(String, Fault)>,
  pub outcome: FinallyOutcome,
}

impl ProbeReport {
  #[inline]
  pub fn finally_reached_caller(&self) -> bool {
    self.outcome == FinallyOutcome::PropagatedToCaller
  }
}

impl fmt::Display for ProbeReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "scenario: strategy={:?} termination={:?} take={:?} infinite={} cancel={} reconnectable={}",
      self.config.strategy,
      self.config.termination,
      self.config.take,
      self.config.infinite,
      self.config.cancel,
      self.config.reconnectable,
    )?;
    for event in &self.events {
      writeln!(f, "  {event}")?;
    }
    if let Some(fault) = &self.caller_fault {
      writeln!(f, "caller fault: {fault}")?;
    }
    for (thread, fault) in &self.worker_faults {
      writeln!(f, "worker '{thread}' fault: {fault}")?;
    }
    write!(f, "outcome: {}", self.outcome)
  }
}

/// Runs one scenario and reports where the finally panic surfaced.
///
/// Panics raised on the calling thread are caught here and reported instead
/// of unwinding out of `run`. Worker threads are joined before returning.
pub fn run(config: &ProbeConfig) -> Result<ProbeReport, ProbeError> {
  config.validate()?;

  let journal = Journal::default();
  let scheduler = RecordingScheduler::new();
  let mut source = source::build(config, &journal, &scheduler);
  if let Some(count) = config.take {
    source = source.take(count).box_it();
  }
  let (c_journal, finally_panics) = (journal.clone(), config.finally_panics);
  let pipeline = source.finalize(move || {
    c_journal.record(Event::FinallyEntered);
    if finally_panics {
      panic!("{FINALLY_MESSAGE}");
    }
  });

  let mut caller_fault = None;
  journal.record(Event::Subscribing);
  let (on_next, on_error, on_complete) = (journal.clone(), journal.clone(), journal.clone());
  let subscribed = catch_unwind(AssertUnwindSafe(move || {
    pipeline.subscribe_all(
      move |v| on_next.record(Event::Next(v)),
      move |err| on_error.record(Event::Error(err)),
      move || on_complete.record(Event::Completed),
    )
  }));
  let subscription = match subscribed {
    Ok(subscription) => {
      journal.record(Event::Subscribed);
      Some(subscription)
    }
    Err(payload) => {
      let fault = Fault::from_panic(payload);
      tracing::error!(%fault, "subscribe unwound into the caller");
      caller_fault = Some(fault);
      None
    }
  };

  if config.strategy == Strategy::Async {
    thread::sleep(config.settle);
    if let Some(subscription) = subscription.filter(|_| config.cancel) {
      journal.record(Event::Cancelling);
      match catch_unwind(AssertUnwindSafe(move || subscription.unsubscribe())) {
        Ok(()) => journal.record(Event::Cancelled),
        Err(payload) => {
          let fault = Fault::from_panic(payload);
          tracing::error!(%fault, "unsubscribe unwound into the caller");
          caller_fault.get_or_insert(fault);
        }
      }
      thread::sleep(config.cancel_grace);
    }
  }

  let worker_faults = scheduler.join_all();
  for (thread, fault) in &worker_faults {
    tracing::error!(thread = %thread, %fault, "worker ended by a panic");
  }
  let events = journal.events();
  let outcome = classify(config, &events, caller_fault.as_ref(), &worker_faults);
  tracing::info!(%outcome, "probe finished");

  Ok(ProbeReport { config: config.clone(), events, caller_fault, worker_faults, outcome })
}

fn classify(
  config: &ProbeConfig, events: &[Event], caller_fault: Option<&Fault>,
  worker_faults: &[(String, Fault)],
) -> FinallyOutcome {
  let is_finally = |fault: &Fault| fault.message() == FINALLY_MESSAGE;

  if !events.contains(&Event::FinallyEntered) {
    FinallyOutcome::NotReached
  } else if !config.finally_panics {
    FinallyOutcome::Clean
  } else if caller_fault.map_or(false, is_finally) {
    FinallyOutcome::PropagatedToCaller
  } else if let Some((thread, _)) = worker_faults.iter().find(|(_, fault)| is_finally(fault)) {
    FinallyOutcome::EscapedOnWorker { thread: thread.clone() }
  } else if events.iter().any(|event| matches!(event, Event::Error(fault) if is_finally(fault))) {
    FinallyOutcome::DeliveredToSubscriber
  } else {
    FinallyOutcome::Swallowed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn finally_panicked() -> Fault { Fault::Panicked(FINALLY_MESSAGE.into()) }

  #[test]
  fn classify_order() {
    let config = ProbeConfig::default();
    let entered = [Event::FinallyEntered];

    assert_eq!(classify(&config, &[], None, &[]), FinallyOutcome::NotReached);
    assert_eq!(
      classify(&ProbeConfig { finally_panics: false, ..config.clone() }, &entered, None, &[]),
      FinallyOutcome::Clean
    );
    assert_eq!(
      classify(&config, &entered, Some(&finally_panicked()), &[]),
      FinallyOutcome::PropagatedToCaller
    );
    assert_eq!(
      classify(&config, &entered, None, &[("w".into(), finally_panicked())]),
      FinallyOutcome::EscapedOnWorker { thread: "w".into() }
    );
    assert_eq!(
      classify(&config, &[Event::FinallyEntered, Event::Error(finally_panicked())], None, &[]),
      FinallyOutcome::DeliveredToSubscriber
    );
    assert_eq!(
      classify(&config, &entered, Some(&Fault::Panicked("BANG".into())), &[]),
      FinallyOutcome::Swallowed
    );
  }

  #[test]
  fn invalid_config_is_rejected() {
    let config = ProbeConfig { infinite: true, ..Default::default() };
    assert!(matches!(run(&config), Err(ProbeError::Config(_))));
  }
}
