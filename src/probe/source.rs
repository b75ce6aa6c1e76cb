use std::thread;

use crate::{
  error::Fault,
  observable::{self, Connectable, ObservableExt},
  observer::Emitter,
  ops::box_it::BoxedObservable,
  probe::{Event, Journal, ProbeConfig, Strategy, Termination},
  rc::{MutArc, RcDerefMut},
  scheduler::{Scheduler, TaskHandle, ThreadScheduler},
  subscription::CancellationToken,
};

pub(crate) const WORKER_NAME: &str = "probe-source";

/// Runs every task on its own named thread and keeps the handles, so the
/// driver can join the workers and collect the panics that escaped them.
///
/// `schedule` hands back an already finished handle; the real one stays here.
#[derive(Clone)]
pub(crate) struct RecordingScheduler {
  inner: ThreadScheduler,
  handles: MutArc<Vec<TaskHandle>>,
}

impl RecordingScheduler {
  pub(crate) fn new() -> Self {
    RecordingScheduler { inner: ThreadScheduler::named(WORKER_NAME), handles: MutArc::default() }
  }

  /// Joins every worker scheduled so far and returns the faults of those that
  /// panicked, with the name of their thread.
  pub(crate) fn join_all(&self) -> Vec<(String, Fault)> {
    let handles = std::mem::take(&mut *self.handles.rc_deref_mut());
    handles
      .into_iter()
      .filter_map(|handle| {
        let name = handle.thread_name().unwrap_or(WORKER_NAME).to_owned();
        handle.join().err().map(|fault| (name, fault))
      })
      .collect()
  }
}

impl Scheduler for RecordingScheduler {
  fn schedule<T>(&self, task: T) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let handle = self.inner.schedule(task);
    self.handles.rc_deref_mut().push(handle);
    TaskHandle::finished()
  }
}

/// The producer body shared by both strategies.
fn produce(
  config: &ProbeConfig, journal: &Journal, emitter: &mut dyn Emitter<i64, Fault>,
  token: &CancellationToken,
) {
  journal.record(Event::SourceStarted);

  if config.infinite {
    let mut value = 0;
    while !token.is_cancelled() && !emitter.is_closed() {
      emitter.next(value);
      value += 1;
      thread::sleep(config.interval);
    }
  } else {
    for value in 1..=3 {
      emitter.next(value);
    }
  }

  match config.termination {
    Termination::Panic => {
      journal.record(Event::SourceThrowing);
      panic!("BANG");
    }
    Termination::Error => {
      journal.record(Event::SourceErroring);
      emitter.error(Fault::raised("ONERROR BANG"));
    }
    Termination::Complete => {
      journal.record(Event::SourceCompleting);
      emitter.complete();
    }
    Termination::Silent => journal.record(Event::SourceEndedSilently),
  }
}

/// Builds the source observable for `config`, optionally shared through a
/// reconnectable, ref-counted subject.
pub(crate) fn build(
  config: &ProbeConfig, journal: &Journal, scheduler: &RecordingScheduler,
) -> BoxedObservable<i64, Fault> {
  let (c_config, c_journal) = (config.clone(), journal.clone());
  match (config.strategy, config.reconnectable) {
    (Strategy::Sync, false) => observable::create(move |emitter: &mut dyn Emitter<i64, Fault>| {
      produce(&c_config, &c_journal, emitter, &CancellationToken::new())
    })
    .box_it(),
    (Strategy::Sync, true) => observable::create(move |emitter: &mut dyn Emitter<i64, Fault>| {
      produce(&c_config, &c_journal, emitter, &CancellationToken::new())
    })
    .publish_reconnectable()
    .ref_count()
    .box_it(),
    (Strategy::Async, false) => observable::create_task(
      scheduler.clone(),
      move |emitter: &mut dyn Emitter<i64, Fault>, token: CancellationToken| {
        produce(&c_config, &c_journal, emitter, &token)
      },
    )
    .box_it(),
    (Strategy::Async, true) => observable::create_task(
      scheduler.clone(),
      move |emitter: &mut dyn Emitter<i64, Fault>, token: CancellationToken| {
        produce(&c_config, &c_journal, emitter, &token)
      },
    )
    .publish_reconnectable()
    .ref_count()
    .box_it(),
  }
}
