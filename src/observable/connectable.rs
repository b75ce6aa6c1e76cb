//! Multicasting a single run of a source.
//!
//! A `ConnectableObservable` bridges a source `Observable` and a subject.
//! Subscribing to it attaches to the subject only. `connect()` subscribes the
//! subject to the source, so every attached observer sees the same run.
//!
//! ```rust
//! use rx_finally::prelude::*;
//!
//! let connectable = observable::from_iter(vec![1, 2]).publish();
//!
//! connectable.fork().subscribe(|v| println!("Observer 1: {v}"));
//! connectable.fork().subscribe(|v| println!("Observer 2: {v}"));
//!
//! // Start execution
//! connectable.connect();
//! ```

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  ops::ref_count::RefCount,
  subscription::Subscription,
};

/// Something that can be told to start pushing its source into a shared
/// channel.
pub trait Connectable<Item, Err> {
  type Connection: Subscription;

  /// Starts the source. Unsubscribing the returned connection stops it.
  fn connect(&self) -> Self::Connection;

  /// Returns an observable that connects when the first observer subscribes
  /// and disconnects when the last one unsubscribes.
  fn ref_count(self) -> RefCount<Self, Self::Connection>
  where
    Self: Sized,
  {
    RefCount::new(self)
  }
}

/// Holds a source and a subject. Subscribers listen to the subject, and
/// `connect()` subscribes the subject to the source.
///
/// This is not a regular cold observable: subscribing does not start the
/// source. Each `connect()` runs the source again into the same subject, so
/// once the subject has terminated later runs reach nobody. Use
/// `ReconnectableObservable` to get a fresh subject per connection.
#[derive(Clone)]
pub struct ConnectableObservable<S, P> {
  pub(crate) source: S,
  pub(crate) subject: P,
}

impl<S, P> ConnectableObservable<S, P> {
  #[inline]
  pub fn new(source: S, subject: P) -> Self { ConnectableObservable { source, subject } }
}

impl<S, P: Clone> ConnectableObservable<S, P> {
  /// A handle to the shared subject, to subscribe to it.
  #[inline]
  pub fn fork(&self) -> P { self.subject.clone() }
}

impl<Item, Err, S, P> Connectable<Item, Err> for ConnectableObservable<S, P>
where
  S: Observable<Item, Err, P> + Clone,
  P: Observer<Item, Err> + Clone,
{
  type Connection = S::Unsub;

  fn connect(&self) -> Self::Connection {
    self.source.clone().actual_subscribe(self.subject.clone())
  }
}

impl<Item, Err, O, S, P> Observable<Item, Err, O> for ConnectableObservable<S, P>
where
  O: Observer<Item, Err>,
  P: Observable<Item, Err, O>,
{
  type Unsub = P::Unsub;

  #[inline]
  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.subject.actual_subscribe(observer) }
}

impl<Item, Err, S, P> ObservableExt<Item, Err> for ConnectableObservable<S, P> where
  S: ObservableExt<Item, Err>
{
}
