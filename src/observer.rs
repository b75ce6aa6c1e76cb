//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::{
  convert::Infallible,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use crate::rc::{MutArc, RcDerefMut};

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  ///
  /// This consumes the observer, as no more values can be emitted after an
  /// error
  fn error(self, err: Err);

  /// Handle completion of the observable
  ///
  /// This consumes the observer, as no more values can be emitted after
  /// completion
  fn complete(self);

  /// Returns `true` if the observer will not accept more values.
  ///
  /// Sources poll this to stop producing early, e.g. once a downstream `take`
  /// has seen enough.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// A trait for emitting items to an Observer via mutable reference.
///
/// `create` producers receive a `&mut dyn Emitter` so the concrete observer
/// type of the downstream chain never leaks into the producer's signature.
/// Unlike `Observer`, terminal methods take `&mut self`; calls after the first
/// terminal signal are ignored.
pub trait Emitter<Item, Err> {
  fn next(&mut self, value: Item);
  fn error(&mut self, err: Err);
  fn complete(&mut self);
  fn is_closed(&self) -> bool;
}

/// Emitter over an owned observer slot.
pub(crate) struct OptionEmitter<O>(pub(crate) Option<O>);

impl<O, Item, Err> Emitter<Item, Err> for OptionEmitter<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { Observer::<Item, Err>::next(&mut self.0, value) }

  #[inline]
  fn error(&mut self, err: Err) {
    if let Some(observer) = self.0.take() {
      observer.error(err);
    }
  }

  #[inline]
  fn complete(&mut self) {
    if let Some(observer) = self.0.take() {
      observer.complete();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.0) }
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (Box<dyn Observer>)
///
/// Standard Observer trait is not object-safe because terminal methods take
/// `self` by value. DynObserver mirrors the interface but adapts it for
/// vtables.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed observer that can cross threads.
pub type BoxedObserver<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + Send + 'a>;

impl<'a, Item, Err> Observer<Item, Err> for BoxedObserver<'a, Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

/// Helper trait to convert observers into boxed trait objects
pub trait IntoBoxedObserver<'a, Item, Err> {
  fn into_boxed(self) -> BoxedObserver<'a, Item, Err>;
}

impl<'a, Item, Err, O> IntoBoxedObserver<'a, Item, Err> for O
where
  O: Observer<Item, Err> + Send + 'a,
{
  #[inline]
  fn into_boxed(self) -> BoxedObserver<'a, Item, Err> { Box::new(self) }
}

// ============================================================================
// FnMutObserver - Closure adapter
// ============================================================================

/// Adapter that turns a closure into the `next` handler of an observer.
///
/// Only sequences that cannot fail accept it; use `ObserverAll` to handle
/// errors.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, _err: Infallible) {}

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

// ============================================================================
// ObserverAll - one closure per notification
// ============================================================================

#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  #[inline(always)]
  pub fn new(next: N, error: E, complete: C) -> Self { ObserverAll { next, error, complete } }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline(always)]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline(always)]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline(always)]
  fn complete(self) { (self.complete)(); }

  #[inline(always)]
  fn is_closed(&self) -> bool { false }
}

// ============================================================================
// Option observer
// ============================================================================

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, |o| Observer::<Item, Err>::is_closed(o)) }
}

// ============================================================================
// SharedObserver - observer shared with a detaching handle
// ============================================================================

/// An observer shared between the producer that feeds it and the
/// subscription that may detach it from another thread.
///
/// Notifications hold the observer's lock, so they never interleave.
/// `detach` never waits for that lock: called from inside a notification, on
/// the same thread or another one, it only flags the slot, and the observer is
/// dropped as soon as the running notification returns.
pub struct SharedObserver<O> {
  detached: Arc<AtomicBool>,
  observer: MutArc<Option<O>>,
}

impl<O> SharedObserver<O> {
  pub fn new(observer: O) -> Self {
    SharedObserver { detached: Arc::default(), observer: MutArc::own(Some(observer)) }
  }

  /// Stops every further notification and releases the observer.
  pub fn detach(&self) {
    self.detached.store(true, Ordering::Release);
    let released = self.observer.try_rc_deref_mut().and_then(|mut slot| slot.take());
    drop(released);
  }

  #[inline]
  pub fn is_detached(&self) -> bool { self.detached.load(Ordering::Acquire) }

  #[inline]
  pub(crate) fn ptr_eq(&self, other: &Self) -> bool { self.observer.ptr_eq(&other.observer) }

  fn take_live(&self) -> Option<O> {
    if self.is_detached() {
      return None;
    }
    self.observer.rc_deref_mut().take()
  }
}

impl<O> Clone for SharedObserver<O> {
  fn clone(&self) -> Self {
    SharedObserver { detached: self.detached.clone(), observer: self.observer.clone() }
  }
}

impl<O, Item, Err> Observer<Item, Err> for SharedObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.is_detached() {
      return;
    }
    let released = {
      let mut slot = self.observer.rc_deref_mut();
      Observer::<Item, Err>::next(&mut *slot, value);
      if self.is_detached() {
        slot.take()
      } else {
        None
      }
    };
    drop(released);
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.take_live() {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.take_live() {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    if self.is_detached() {
      return true;
    }
    // A busy slot is in the middle of a notification, so it is still open.
    self
      .observer
      .try_rc_deref_mut()
      .map_or(false, |slot| Observer::<Item, Err>::is_closed(&*slot))
  }
}

// ============================================================================
// Tests
// ============================================================================
