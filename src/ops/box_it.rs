//! Type erasure for observable pipelines.
//!
//! `box_it()` turns any `Send + 'static` observable into a
//! `BoxedObservable<Item, Err>`, so pipelines assembled at runtime share one
//! type.

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  subscription::BoxedSubscription,
};

/// Object-safe mirror of `Observable` for a boxed observer.
trait DynObservable<Item, Err> {
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<'static, Item, Err>)
    -> BoxedSubscription;
}

impl<T, Item, Err> DynObservable<Item, Err> for T
where
  T: Observable<Item, Err, BoxedObserver<'static, Item, Err>>,
  T::Unsub: Send + 'static,
{
  fn box_subscribe(
    self: Box<Self>, observer: BoxedObserver<'static, Item, Err>,
  ) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

pub struct BoxedObservable<Item, Err>(Box<dyn DynObservable<Item, Err> + Send>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item, Err, BoxedObserver<'static, Item, Err>> + Send + 'static,
    S::Unsub: Send + 'static,
  {
    BoxedObservable(Box::new(source))
  }
}

impl<Item, Err, O> Observable<Item, Err, O> for BoxedObservable<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.box_subscribe(Box::new(observer)) }
}

impl<Item, Err> ObservableExt<Item, Err> for BoxedObservable<Item, Err> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn box_it_observable_method() {
    let result = MutArc::own(Vec::new());
    let result_clone = result.clone();

    observable::from_iter(vec![42]).box_it().subscribe(move |v| {
      result_clone.rc_deref_mut().push(v);
    });

    assert_eq!(*result.rc_deref(), vec![42]);
  }

  #[test]
  fn heterogeneous_pipelines() {
    let result = MutArc::own(Vec::new());
    let take_two = observable::create(|emitter: &mut dyn Emitter<i32, Fault>| {
      emitter.next(1);
      emitter.next(2);
      emitter.next(3);
      emitter.complete();
    })
    .take(2)
    .box_it();
    let failing = observable::create(|emitter: &mut dyn Emitter<i32, Fault>| {
      emitter.error(Fault::raised("nope"));
    })
    .box_it();

    for source in [take_two, failing] {
      let (n, e) = (result.clone(), result.clone());
      source.subscribe_all(
        move |v| n.rc_deref_mut().push(v.to_string()),
        move |err| e.rc_deref_mut().push(err.to_string()),
        || {},
      );
    }

    assert_eq!(*result.rc_deref(), vec!["1", "2", "nope"]);
  }

  #[test]
  fn boxed_subscription_unsubscribes_inner() {
    let subject = Subject::<i32, Fault>::default();
    let subscription = subject.clone().box_it().subscribe_all(|_| {}, |_| {}, || {});
    assert_eq!(subject.subscriber_count(), 1);
    subscription.unsubscribe();
    assert_eq!(subject.subscriber_count(), 0);
  }
}
