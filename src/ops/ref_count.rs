//! Make a connectable behave like an ordinary observable and automate the
//! way you connect to it.
//!
//! Internally it counts the subscriptions to the observable and connects
//! (only once) when the count goes from zero to one. When the count drops back
//! to zero it disposes the connection. This way everything before the
//! ref-counted connectable has a single subscription, independently of the
//! number of subscribers to the target observable.
//!
//! Note that `publish().ref_count()` is what other Rx libraries call `share`.

use crate::{
  observable::{Connectable, Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  subscription::Subscription,
};

struct Inner<U> {
  subscribers: usize,
  connection: Option<U>,
}

pub struct RefCount<C, U> {
  connectable: C,
  inner: MutArc<Inner<U>>,
}

impl<C, U> RefCount<C, U> {
  pub(crate) fn new(connectable: C) -> Self {
    RefCount { connectable, inner: MutArc::own(Inner { subscribers: 0, connection: None }) }
  }

  /// Number of subscriptions currently counted.
  pub fn subscriber_count(&self) -> usize { self.inner.rc_deref_mut().subscribers }
}

impl<C: Clone, U> Clone for RefCount<C, U> {
  fn clone(&self) -> Self {
    RefCount { connectable: self.connectable.clone(), inner: self.inner.clone() }
  }
}

impl<Item, Err, O, C, U> Observable<Item, Err, O> for RefCount<C, U>
where
  O: Observer<Item, Err>,
  C: Connectable<Item, Err, Connection = U> + Observable<Item, Err, O> + Clone,
  U: Subscription,
{
  type Unsub = RefCountSubscription<<C as Observable<Item, Err, O>>::Unsub, U>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = self.connectable.clone().actual_subscribe(observer);
    let first = {
      let mut inner = self.inner.rc_deref_mut();
      inner.subscribers += 1;
      inner.subscribers == 1 && inner.connection.is_none()
    };

    if first {
      let connection = self.connectable.connect();
      // Every subscriber may already be gone if the source ran to completion
      // and they unsubscribed during `connect`, or a later first subscriber
      // may have stored its own connection meanwhile.
      let stale = {
        let mut inner = self.inner.rc_deref_mut();
        if inner.subscribers == 0 || inner.connection.is_some() {
          Some(connection)
        } else {
          inner.connection = Some(connection);
          None
        }
      };
      stale.unsubscribe();
    }

    RefCountSubscription { subscription, inner: self.inner }
  }
}

impl<Item, Err, C, U> ObservableExt<Item, Err> for RefCount<C, U> where C: ObservableExt<Item, Err> {}

pub struct RefCountSubscription<S, U> {
  subscription: S,
  inner: MutArc<Inner<U>>,
}

impl<S, U> Subscription for RefCountSubscription<S, U>
where
  S: Subscription,
  U: Subscription,
{
  fn unsubscribe(self) {
    self.subscription.unsubscribe();
    let connection = {
      let mut inner = self.inner.rc_deref_mut();
      inner.subscribers = inner.subscribers.saturating_sub(1);
      if inner.subscribers == 0 {
        inner.connection.take()
      } else {
        None
      }
    };
    connection.unsubscribe();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.subscription.is_closed() }
}
