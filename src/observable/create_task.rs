use std::{
  marker::PhantomData,
  panic::{catch_unwind, AssertUnwindSafe},
};

use crate::{
  error::Fault,
  observable::{Observable, ObservableExt},
  observer::{Emitter, Observer, SharedObserver},
  scheduler::Scheduler,
  subscription::{CancellationToken, ClosureSubscription, MultiSubscription},
};

/// Creates an observable whose producer runs as a task on `scheduler`.
///
/// Every subscription schedules its own run of `f`. The producer receives an
/// emitter and a `CancellationToken`; unsubscribing cancels the token and
/// detaches the observer, so anything emitted afterwards is dropped.
///
/// When `f` returns the sequence completes, unless the producer already sent
/// a terminal notification. When `f` panics the panic is caught at the task
/// boundary and delivered to the observer as an error.
///
/// A panic raised by a downstream callback after `f` has returned is not
/// caught. It unwinds the scheduler's task and shows up in the task's
/// `TaskHandle`.
pub fn create_task<SD, F, Item, Err>(scheduler: SD, f: F) -> CreateTask<SD, F, Item, Err>
where
  F: FnOnce(&mut dyn Emitter<Item, Err>, CancellationToken),
{
  CreateTask { scheduler, f, _marker: PhantomData }
}

pub struct CreateTask<SD, F, Item, Err> {
  scheduler: SD,
  f: F,
  _marker: PhantomData<(Item, Err)>,
}

impl<SD: Clone, F: Clone, Item, Err> Clone for CreateTask<SD, F, Item, Err> {
  fn clone(&self) -> Self {
    CreateTask { scheduler: self.scheduler.clone(), f: self.f.clone(), _marker: PhantomData }
  }
}

/// Emitter handed to a scheduled producer. The observer lives in a shared
/// slot so the subscription can detach it from another thread.
struct TaskEmitter<O>(SharedObserver<O>);

impl<O, Item, Err> Emitter<Item, Err> for TaskEmitter<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { Observer::<Item, Err>::next(&mut self.0, value) }

  #[inline]
  fn error(&mut self, err: Err) { Observer::<Item, Err>::error(self.0.clone(), err) }

  #[inline]
  fn complete(&mut self) { Observer::<Item, Err>::complete(self.0.clone()) }

  #[inline]
  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.0) }
}

impl<SD, F, Item, Err, O> Observable<Item, Err, O> for CreateTask<SD, F, Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  SD: Scheduler,
  F: FnOnce(&mut dyn Emitter<Item, Err>, CancellationToken) + Send + 'static,
  Item: 'static,
  Err: From<Fault> + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let token = CancellationToken::new();
    let slot = SharedObserver::new(observer);

    // Detach before cancelling: a producer that sees the cancellation must
    // find its observer gone.
    let subscription = MultiSubscription::default();
    let c_slot = slot.clone();
    subscription.add(ClosureSubscription(move || c_slot.detach()));
    subscription.add(token.clone());

    let f = self.f;
    let mut emitter = TaskEmitter(slot);
    self.scheduler.schedule(move || {
      match catch_unwind(AssertUnwindSafe(|| f(&mut emitter, token))) {
        Ok(()) => Emitter::<Item, Err>::complete(&mut emitter),
        Err(payload) => {
          let fault = Fault::from_panic(payload);
          tracing::debug!(%fault, "task producer panicked, delivering it as an error");
          Emitter::<Item, Err>::error(&mut emitter, Err::from(fault));
        }
      }
    });
    subscription
  }
}

impl<SD, F, Item, Err> ObservableExt<Item, Err> for CreateTask<SD, F, Item, Err> {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    scheduler::{ImmediateScheduler, ThreadScheduler},
    subscription::Subscription,
  };
  use std::{
    sync::mpsc::{channel, Receiver},
    time::Duration,
  };

  #[derive(Debug, PartialEq)]
  enum Note {
    Next(i32),
    Error(Fault),
    Complete,
  }

  fn recorder() -> (Receiver<Note>, impl Observer<i32, Fault> + Send + 'static) {
    let (tx, rx) = channel();
    let (tx_e, tx_c) = (tx.clone(), tx.clone());
    let observer = crate::observer::ObserverAll::new(
      move |v| {
        let _ = tx.send(Note::Next(v));
      },
      move |e| {
        let _ = tx_e.send(Note::Error(e));
      },
      move || {
        let _ = tx_c.send(Note::Complete);
      },
    );
    (rx, observer)
  }

  #[test]
  fn returning_completes() {
    let (rx, observer) = recorder();
    create_task(ImmediateScheduler, |emitter: &mut dyn Emitter<i32, Fault>, _| {
      emitter.next(1);
      emitter.next(2);
    })
    .actual_subscribe(observer);

    let notes: Vec<_> = rx.try_iter().collect();
    assert_eq!(notes, vec![Note::Next(1), Note::Next(2), Note::Complete]);
  }

  #[test]
  fn explicit_error_is_not_followed_by_completion() {
    let (rx, observer) = recorder();
    create_task(ImmediateScheduler, |emitter: &mut dyn Emitter<i32, Fault>, _| {
      emitter.error(Fault::raised("ONERROR"));
    })
    .actual_subscribe(observer);

    let notes: Vec<_> = rx.try_iter().collect();
    assert_eq!(notes, vec![Note::Error(Fault::raised("ONERROR"))]);
  }

  #[test]
  fn panic_becomes_error() {
    let (rx, observer) = recorder();
    create_task(ThreadScheduler::default(), |emitter: &mut dyn Emitter<i32, Fault>, _| {
      emitter.next(1);
      panic!("BANG");
    })
    .actual_subscribe(observer);

    assert_eq!(rx.recv().unwrap(), Note::Next(1));
    assert_eq!(rx.recv().unwrap(), Note::Error(Fault::Panicked("BANG".into())));
  }

  #[test]
  fn unsubscribe_cancels_and_detaches() {
    let (rx, observer) = recorder();
    let (started_tx, started_rx) = channel();
    let (done_tx, done_rx) = channel();
    let subscription = create_task(
      ThreadScheduler::default(),
      move |emitter: &mut dyn Emitter<i32, Fault>, token: CancellationToken| {
        let _ = started_tx.send(());
        while !token.is_cancelled() {
          std::thread::sleep(Duration::from_millis(1));
        }
        emitter.next(99);
        let _ = done_tx.send(emitter.is_closed());
      },
    )
    .actual_subscribe(observer);

    started_rx.recv().unwrap();
    subscription.unsubscribe();

    // Detaching drops the observer and every sender it owns.
    assert!(rx.recv().is_err());
    assert_eq!(done_rx.recv(), Ok(true));
  }
}
