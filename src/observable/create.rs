use std::marker::PhantomData;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{Emitter, Observer, OptionEmitter},
  subscription::Subscription,
};

/// Creates an observable from a producer function.
///
/// `f` runs on the subscribing thread, inside `actual_subscribe`, and pushes
/// notifications through the emitter. Whatever `f` returns is the
/// subscription handed back to the caller, so a producer can return its own
/// teardown (`ClosureSubscription`) or nothing at all (`()`).
///
/// A panic raised by `f`, or by any downstream callback it drives, unwinds to
/// whoever called `subscribe`.
pub fn create<F, Item, Err, U>(f: F) -> Create<F, Item, Err>
where
  F: FnOnce(&mut dyn Emitter<Item, Err>) -> U,
{
  Create { f, _marker: PhantomData }
}

pub struct Create<F, Item, Err> {
  f: F,
  _marker: PhantomData<(Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { f: self.f.clone(), _marker: PhantomData } }
}

impl<F, Item, Err, O, U> Observable<Item, Err, O> for Create<F, Item, Err>
where
  O: Observer<Item, Err>,
  F: FnOnce(&mut dyn Emitter<Item, Err>) -> U,
  U: Subscription,
{
  type Unsub = U;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let mut emitter = OptionEmitter(Some(observer));
    (self.f)(&mut emitter)
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for Create<F, Item, Err> {}
