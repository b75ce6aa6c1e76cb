//! Subscription handles.
//!
//! A subscription is the control handle returned by `actual_subscribe`.
//! Calling `unsubscribe` releases the resources of the running sequence and
//! stops any further notification from reaching the observer.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use smallvec::SmallVec;

use crate::rc::{MutArc, RcDeref, RcDerefMut};

pub trait Subscription {
  /// Release the resources held by the subscription. Consumes the handle, so
  /// it can run at most once.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard::new(self)
  }
}

impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: Subscription> Subscription for Option<T> {
  #[inline]
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.as_ref().map_or(true, Subscription::is_closed) }
}

/// A subscription that runs a closure when unsubscribed.
pub struct ClosureSubscription<F>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  #[inline]
  fn unsubscribe(self) { (self.0)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

// ==================== Boxed subscriptions ====================

/// Helper trait for calling unsubscribe on boxed trait objects
///
/// Since `Subscription::unsubscribe(self)` requires `Sized`, we need this
/// workaround trait to enable `Box<dyn Subscription>` to call unsubscribe.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased subscription that can cross threads.
///
/// Subscriptions are control handles, not data views, so the boxed form is
/// always `'static`.
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner + Send>);

impl BoxedSubscription {
  #[inline]
  pub fn new(subscription: impl Subscription + Send + 'static) -> Self {
    Self(Box::new(subscription))
  }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}

// ==================== Composite ====================

/// A subscription that tears down a group of subscriptions at once.
///
/// Handles added after the group was unsubscribed are unsubscribed
/// immediately.
#[derive(Clone, Default)]
pub struct MultiSubscription(MutArc<Teardown>);

#[derive(Default)]
struct Teardown {
  closed: bool,
  items: SmallVec<[BoxedSubscription; 1]>,
}

impl MultiSubscription {
  pub fn add(&self, subscription: impl Subscription + Send + 'static) {
    let rejected = {
      let mut teardown = self.0.rc_deref_mut();
      if teardown.closed {
        Some(subscription)
      } else {
        teardown.items.retain(|s| !s.is_closed());
        teardown.items.push(BoxedSubscription::new(subscription));
        None
      }
    };
    rejected.unsubscribe();
  }

  pub fn len(&self) -> usize { self.0.rc_deref().items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Subscription for MultiSubscription {
  fn unsubscribe(self) {
    let items = {
      let mut teardown = self.0.rc_deref_mut();
      teardown.closed = true;
      std::mem::take(&mut teardown.items)
    };
    items.into_iter().for_each(Subscription::unsubscribe);
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

// ==================== Cancellation ====================

/// Cooperative cancellation flag shared between a subscription and the
/// producer it controls.
///
/// Unsubscribing the token requests cancellation; producers poll
/// `is_cancelled` and stop on their own.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  #[inline]
  pub fn new() -> Self { Self::default() }

  #[inline]
  pub fn cancel(&self) { self.0.store(true, Ordering::Release) }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) }
}

impl Subscription for CancellationToken {
  #[inline]
  fn unsubscribe(self) { self.cancel() }

  #[inline]
  fn is_closed(&self) -> bool { self.is_cancelled() }
}

// ==================== RAII ====================

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Disarms the guard and returns the subscription.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe()
    }
  }
}
