use std::thread;

use crate::{
  error::Fault,
  scheduler::{Scheduler, TaskHandle},
};

/// Spawns a dedicated OS thread per task, the equivalent of a long-running
/// task in a thread-pool runtime.
///
/// A panic inside the task ends that thread only; `TaskHandle::join` reports
/// it.
#[derive(Clone, Debug, Default)]
pub struct ThreadScheduler {
  name: Option<String>,
}

impl ThreadScheduler {
  /// Threads spawned by this scheduler carry `name`.
  pub fn named(name: impl Into<String>) -> Self { ThreadScheduler { name: Some(name.into()) } }
}

impl Scheduler for ThreadScheduler {
  fn schedule<T>(&self, task: T) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let mut builder = thread::Builder::new();
    if let Some(name) = &self.name {
      builder = builder.name(name.clone());
    }
    match builder.spawn(task) {
      Ok(handle) => TaskHandle::thread(handle),
      Err(err) => {
        tracing::error!(error = %err, "failed to spawn scheduler thread");
        TaskHandle::rejected(Fault::raised(format!("thread spawn failed: {err}")))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::mpsc::channel;

  #[test]
  fn runs_on_another_thread() {
    let (tx, rx) = channel();
    let handle = ThreadScheduler::default().schedule(move || {
      tx.send(thread::current().id()).unwrap();
    });
    assert_eq!(handle.join(), Ok(()));
    assert_ne!(rx.recv().unwrap(), thread::current().id());
  }

  #[test]
  fn named_threads() {
    let (tx, rx) = channel();
    let handle = ThreadScheduler::named("rx-worker").schedule(move || {
      tx.send(thread::current().name().map(str::to_owned)).unwrap();
    });
    assert_eq!(handle.thread_name(), Some("rx-worker"));
    handle.join().unwrap();
    assert_eq!(rx.recv().unwrap().as_deref(), Some("rx-worker"));
  }

  #[test]
  fn join_reports_panic() {
    let handle = ThreadScheduler::default().schedule(|| panic!("worker bang"));
    assert_eq!(handle.join(), Err(Fault::Panicked("worker bang".into())));
  }
}
