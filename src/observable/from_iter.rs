use std::convert::Infallible;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error.
/// Stops pulling from the iterator once the observer is closed.
///
/// ```
/// use rx_finally::prelude::*;
///
/// observable::from_iter(0..10).subscribe(|v| println!("{v},"));
/// ```
pub fn from_iter<Iter>(iter: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  ObservableIter(iter)
}

#[derive(Clone)]
pub struct ObservableIter<Iter>(Iter);

impl<O, Iter> Observable<Iter::Item, Infallible, O> for ObservableIter<Iter>
where
  Iter: IntoIterator,
  O: Observer<Iter::Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let mut iter = self.0.into_iter();
    while !observer.is_closed() {
      match iter.next() {
        Some(v) => observer.next(v),
        None => return observer.complete(),
      }
    }
  }
}

impl<Iter> ObservableExt<Iter::Item, Infallible> for ObservableIter<Iter> where Iter: IntoIterator {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn from_range() {
    let mut hit_count = 0;
    let mut completed = false;
    observable::from_iter(0..100).subscribe_all(
      |_| hit_count += 1,
      |_: std::convert::Infallible| {},
      || completed = true,
    );

    assert_eq!(hit_count, 100);
    assert!(completed);
  }

  #[test]
  fn stops_pulling_when_closed() {
    let pulled = MutArc::own(0);
    let c_pulled = pulled.clone();
    let iter = (0..).inspect(move |_| *c_pulled.rc_deref_mut() += 1);
    let mut seen = vec![];
    observable::from_iter(iter).take(3).subscribe(|v| seen.push(v));

    assert_eq!(seen, vec![0, 1, 2]);
    assert_eq!(*pulled.rc_deref(), 3);
  }
}
