use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{MultiSubscription, Subscription},
};

/// Emits only the first `count` values emitted by the source Observable.
///
/// If the source emits fewer than `count` values then all of its values are
/// emitted. After that it completes, regardless if the source completes,
/// and unsubscribes from the source. It also reports itself closed, so a
/// source that polls `is_closed` stops before the unsubscription lands.
///
/// ```
/// use rx_finally::prelude::*;
///
/// observable::from_iter(0..10).take(5).subscribe(|v| println!("{v}"));
///
/// // print logs:
/// // 0
/// // 1
/// // 2
/// // 3
/// // 4
/// ```
#[derive(Clone)]
pub struct TakeOp<S> {
  source: S,
  count: usize,
}

impl<S> TakeOp<S> {
  #[inline]
  pub fn new(source: S, count: usize) -> Self { TakeOp { source, count } }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for TakeOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeObserver<O>>,
  S::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = MultiSubscription::default();
    let observer = if self.count == 0 {
      observer.complete();
      upstream.clone().unsubscribe();
      None
    } else {
      Some(observer)
    };
    let take_observer =
      TakeObserver { observer, remaining: self.count, upstream: upstream.clone() };
    // A source that already hit the limit closed `upstream`, so this
    // unsubscribes right away.
    upstream.add(self.source.actual_subscribe(take_observer));
    upstream
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for TakeOp<S> where S: ObservableExt<Item, Err> {}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: MultiSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
      self.remaining -= 1;
    }
    if self.remaining == 0 {
      if let Some(observer) = self.observer.take() {
        observer.complete();
        self.upstream.clone().unsubscribe();
      }
    }
  }

  #[inline]
  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  #[inline]
  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.as_ref().map_or(true, |o| o.is_closed()) }
}
