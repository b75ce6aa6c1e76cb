//! The `Observable` trait and its operator extension.

use crate::{
  observer::{BoxedObserver, FnMutObserver, Observer, ObserverAll},
  ops::{box_it::BoxedObservable, finalize::FinalizeOp, take::TakeOp},
  subject::Subject,
  subscription::Subscription,
};

mod create;
pub use create::*;
mod create_task;
pub use create_task::*;
mod from_iter;
pub use from_iter::*;
pub mod connectable;
pub use connectable::{Connectable, ConnectableObservable};
pub mod reconnectable;
pub use reconnectable::{ReconnectableConnection, ReconnectableObservable};

/// A representation of any set of values over any amount of time.
///
/// `actual_subscribe` starts the sequence for one observer and returns the
/// handle that stops it. Cold observables run their side effects once per
/// call.
pub trait Observable<Item, Err, O>
where
  O: Observer<Item, Err>,
{
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Operators and subscribe helpers available on every observable.
pub trait ObservableExt<Item, Err>: Sized {
  /// Emits only the first `count` values emitted by the source, then
  /// completes.
  #[inline]
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp::new(self, count) }

  /// Calls `f` once the sequence completes, errors or is unsubscribed,
  /// whichever happens first.
  ///
  /// On completion and error `f` runs after the downstream observer has been
  /// notified. A panic in `f` unwinds from the call that triggered it: the
  /// producer's emission on the producing thread, or `unsubscribe` on the
  /// caller.
  #[inline]
  fn finalize<F>(self, f: F) -> FinalizeOp<Self, F>
  where
    F: FnOnce(),
  {
    FinalizeOp::new(self, f)
  }

  /// Shares one run of the source through `subject`. Nothing is emitted until
  /// `connect` is called.
  #[inline]
  fn multicast<P>(self, subject: P) -> ConnectableObservable<Self, P> {
    ConnectableObservable::new(self, subject)
  }

  /// `multicast` with a fresh `Subject`.
  #[inline]
  fn publish(self) -> ConnectableObservable<Self, Subject<Item, Err>> {
    self.multicast(Subject::default())
  }

  /// Like `multicast`, but every connection after a disconnect pushes into a
  /// new subject created by `factory`, so the source can be run again.
  #[inline]
  fn multicast_reconnectable<F, P>(self, factory: F) -> ReconnectableObservable<Self, F, P>
  where
    F: Fn() -> P,
  {
    ReconnectableObservable::new(self, factory)
  }

  /// `multicast_reconnectable` with `Subject::default` as the factory.
  #[inline]
  #[allow(clippy::type_complexity)]
  fn publish_reconnectable(
    self,
  ) -> ReconnectableObservable<Self, fn() -> Subject<Item, Err>, Subject<Item, Err>> {
    ReconnectableObservable::new(self, Subject::default as fn() -> Subject<Item, Err>)
  }

  /// Erases the type of the pipeline.
  #[inline]
  fn box_it(self) -> BoxedObservable<Item, Err>
  where
    Self: Observable<Item, Err, BoxedObserver<'static, Item, Err>> + Send + 'static,
    <Self as Observable<Item, Err, BoxedObserver<'static, Item, Err>>>::Unsub: Send + 'static,
  {
    BoxedObservable::new(self)
  }

  /// Subscribes with a `next` handler. Only available for sequences that
  /// cannot fail.
  #[inline]
  fn subscribe<N>(self, next: N) -> <Self as Observable<Item, Err, FnMutObserver<N>>>::Unsub
  where
    N: FnMut(Item),
    FnMutObserver<N>: Observer<Item, Err>,
    Self: Observable<Item, Err, FnMutObserver<N>>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  /// Subscribes with handlers for every notification.
  #[inline]
  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> <Self as Observable<Item, Err, ObserverAll<N, E, C>>>::Unsub
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, ObserverAll<N, E, C>>,
  {
    self.actual_subscribe(ObserverAll::new(next, error, complete))
  }
}
