use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  subscription::Subscription,
};

#[derive(Clone)]
pub struct FinalizeOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> FinalizeOp<S, F> {
  #[inline]
  pub fn new(source: S, func: F) -> Self { Self { source, func } }
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for FinalizeOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, FinalizerObserver<O, F>>,
  F: FnOnce(),
{
  type Unsub = FinalizerSubscription<S::Unsub, F>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let func = MutArc::own(Some(self.func));
    let subscription =
      self.source.actual_subscribe(FinalizerObserver { observer, func: func.clone() });
    FinalizerSubscription { subscription, func }
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for FinalizeOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

/// Takes the callback out of its slot and runs it, at most once across all
/// holders of the slot.
fn run_finally<F: FnOnce()>(func: &MutArc<Option<F>>) {
  let func = func.rc_deref_mut().take();
  if let Some(func) = func {
    func()
  }
}

pub struct FinalizerObserver<O, F> {
  observer: O,
  func: MutArc<Option<F>>,
}

impl<Item, Err, O, F> Observer<Item, Err> for FinalizerObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value); }

  fn error(self, err: Err) {
    self.observer.error(err);
    run_finally(&self.func);
  }

  fn complete(self) {
    self.observer.complete();
    run_finally(&self.func);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

pub struct FinalizerSubscription<U, F> {
  subscription: U,
  func: MutArc<Option<F>>,
}

impl<U, F> Subscription for FinalizerSubscription<U, F>
where
  U: Subscription,
  F: FnOnce(),
{
  fn unsubscribe(self) {
    self.subscription.unsubscribe();
    run_finally(&self.func);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.subscription.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
      atomic::{AtomicBool, AtomicUsize, Ordering},
      Arc,
    },
  };

  #[test]
  fn finalize_on_complete_simple() {
    // Given
    let finalized = Arc::new(AtomicBool::new(false));
    let mut nexted = false;
    let o = observable::from_iter(vec![1]);
    // When
    let finalized_clone = finalized.clone();
    o.finalize(move || finalized_clone.store(true, Ordering::Relaxed)).subscribe(|_| nexted = true);
    // Then
    assert!(finalized.load(Ordering::Relaxed));
    assert!(nexted);
  }

  #[test]
  fn finalize_on_complete_subject() {
    // Given
    let finalized = Arc::new(AtomicBool::new(false));
    let nexted = Arc::new(AtomicBool::new(false));
    let mut s = Subject::<i32, std::convert::Infallible>::default();
    // When
    let finalized_clone = finalized.clone();
    let nexted_clone = nexted.clone();
    s.clone()
      .finalize(move || finalized_clone.store(true, Ordering::Relaxed))
      .subscribe(move |_| nexted_clone.store(true, Ordering::Relaxed));
    s.next(1);
    s.next(2);
    assert!(!finalized.load(Ordering::Relaxed));
    s.complete();
    // Then
    assert!(finalized.load(Ordering::Relaxed));
    assert!(nexted.load(Ordering::Relaxed));
  }

  #[test]
  fn finalize_on_unsubscribe() {
    // Given
    let finalized = Arc::new(AtomicBool::new(false));
    let s = Subject::<i32, std::convert::Infallible>::default();
    // When
    let finalized_clone = finalized.clone();
    let subscription = s
      .clone()
      .finalize(move || finalized_clone.store(true, Ordering::Relaxed))
      .subscribe(|_| ());
    subscription.unsubscribe();
    // Then
    assert!(finalized.load(Ordering::Relaxed));
  }

  #[test]
  fn finalize_runs_after_error_reaches_observer() {
    let log = MutArc::own(vec![]);
    let (c_err, c_final) = (log.clone(), log.clone());
    observable::create(|emitter: &mut dyn Emitter<i32, Fault>| {
      emitter.error(Fault::raised("ONERROR BANG"))
    })
    .finalize(move || c_final.rc_deref_mut().push("finally".to_owned()))
    .subscribe_all(|_| {}, move |e| c_err.rc_deref_mut().push(e.to_string()), || {});

    assert_eq!(*log.rc_deref(), vec!["ONERROR BANG", "finally"]);
  }

  #[test]
  fn finalize_only_once() {
    // Given
    let finalize_count = Arc::new(AtomicUsize::new(0));
    let mut s = Subject::<i32, String>::default();
    // When
    let finalized_clone = finalize_count.clone();
    let subscription = s
      .clone()
      .finalize(move || {
        finalized_clone.fetch_add(1, Ordering::Relaxed);
      })
      .subscribe_all(|_| (), |_| (), || ());
    s.clone().error("oops".to_owned());
    s.next(1);
    s.clone().complete();
    subscription.unsubscribe();
    // Then
    assert_eq!(finalize_count.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn panic_in_finally_unwinds_from_completion() {
    let completed = Arc::new(AtomicBool::new(false));
    let c_completed = completed.clone();
    let result = catch_unwind(AssertUnwindSafe(|| {
      observable::from_iter(vec![1, 2, 3]).finalize(|| panic!("FINALLY WENT BANG")).subscribe_all(
        |_| {},
        |_: std::convert::Infallible| {},
        move || c_completed.store(true, Ordering::Relaxed),
      );
    }));

    assert!(result.is_err());
    assert!(completed.load(Ordering::Relaxed));
  }

  #[test]
  fn panic_in_finally_unwinds_from_unsubscribe() {
    let s = Subject::<i32, std::convert::Infallible>::default();
    let subscription = s.clone().finalize(|| panic!("FINALLY WENT BANG")).subscribe(|_| ());
    let result = catch_unwind(AssertUnwindSafe(|| subscription.unsubscribe()));
    assert_eq!(
      result.map_err(Fault::from_panic),
      Err(Fault::Panicked("FINALLY WENT BANG".into()))
    );
    assert_eq!(s.subscriber_count(), 0);
  }
}
