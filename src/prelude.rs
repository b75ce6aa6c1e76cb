//! Prelude module for convenient imports

pub use crate::{
  error::Fault,
  observable,
  observable::{
    Connectable, ConnectableObservable, Observable, ObservableExt, ReconnectableConnection,
    ReconnectableObservable,
  },
  observer::{BoxedObserver, Emitter, FnMutObserver, Observer, ObserverAll, SharedObserver},
  ops::{box_it::BoxedObservable, ref_count::RefCount},
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::{ImmediateScheduler, Scheduler, TaskHandle, ThreadScheduler},
  subject::{Subject, SubjectSubscription},
  subscription::*,
};

#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::PoolScheduler;
