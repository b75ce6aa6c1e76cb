use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::{channel::oneshot, executor::ThreadPool};
use once_cell::sync::Lazy;

use crate::{
  error::Fault,
  scheduler::{Scheduler, TaskHandle},
};

pub(crate) static DEFAULT_POOL: Lazy<ThreadPool> =
  Lazy::new(|| ThreadPool::new().expect("create default thread pool failed."));

/// Runs tasks on a `futures` thread pool.
///
/// Pool workers are shared, so a panicking task is caught at the pool
/// boundary and reported through `TaskHandle::join` instead of unwinding the
/// worker.
#[derive(Clone)]
pub struct PoolScheduler {
  pool: ThreadPool,
}

impl PoolScheduler {
  pub fn new(pool: ThreadPool) -> Self { PoolScheduler { pool } }
}

impl Default for PoolScheduler {
  fn default() -> Self { PoolScheduler { pool: DEFAULT_POOL.clone() } }
}

impl Scheduler for PoolScheduler {
  fn schedule<T>(&self, task: T) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    self.pool.spawn_ok(async move {
      let outcome = catch_unwind(AssertUnwindSafe(task)).map_err(Fault::from_panic);
      let _ = tx.send(outcome);
    });
    TaskHandle::pooled(rx)
  }
}
