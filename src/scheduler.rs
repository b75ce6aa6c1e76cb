//! Schedulers decide where a producer runs.
//!
//! `create_task` hands its producer to a [`Scheduler`]; the returned
//! [`TaskHandle`] lets the caller find out whether the task ended by
//! panicking.

use std::thread::JoinHandle;

use futures::channel::oneshot;

use crate::error::Fault;

mod thread_scheduler;
pub use thread_scheduler::ThreadScheduler;

#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::PoolScheduler;

/// A Scheduler is an object to order task and schedule their execution.
pub trait Scheduler {
  fn schedule<T>(&self, task: T) -> TaskHandle
  where
    T: FnOnce() + Send + 'static;
}

impl<S: Scheduler> Scheduler for &S {
  #[inline]
  fn schedule<T>(&self, task: T) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    (**self).schedule(task)
  }
}

/// Runs every task inline on the calling thread, before `schedule` returns.
///
/// A panicking task unwinds straight through `schedule`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule<T>(&self, task: T) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    task();
    TaskHandle::finished()
  }
}

/// Returns a Scheduler instance that creates a new thread for each unit of
/// work.
pub fn new_thread() -> ThreadScheduler { ThreadScheduler::default() }

/// Handle to a scheduled task.
pub struct TaskHandle(Handle);

enum Handle {
  Finished,
  Rejected(Fault),
  Thread(JoinHandle<()>),
  Pooled(oneshot::Receiver<Result<(), Fault>>),
}

impl TaskHandle {
  #[inline]
  pub fn finished() -> Self { TaskHandle(Handle::Finished) }

  pub(crate) fn rejected(fault: Fault) -> Self { TaskHandle(Handle::Rejected(fault)) }

  pub(crate) fn thread(handle: JoinHandle<()>) -> Self { TaskHandle(Handle::Thread(handle)) }

  #[cfg(feature = "futures-scheduler")]
  pub(crate) fn pooled(receiver: oneshot::Receiver<Result<(), Fault>>) -> Self {
    TaskHandle(Handle::Pooled(receiver))
  }

  /// Name of the thread running the task, when it has a dedicated one.
  pub fn thread_name(&self) -> Option<&str> {
    match &self.0 {
      Handle::Thread(handle) => handle.thread().name(),
      _ => None,
    }
  }

  /// Blocks until the task has ended. A panic that escaped the task is
  /// returned as `Fault::Panicked`.
  pub fn join(self) -> Result<(), Fault> {
    match self.0 {
      Handle::Finished => Ok(()),
      Handle::Rejected(fault) => Err(fault),
      Handle::Thread(handle) => handle.join().map_err(Fault::from_panic),
      Handle::Pooled(receiver) => futures::executor::block_on(receiver)
        .unwrap_or_else(|_| Err(Fault::Panicked("pooled task dropped before reporting".into()))),
    }
  }
}
