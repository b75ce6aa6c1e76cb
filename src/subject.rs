//! Thread-safe multicast channel.

use smallvec::SmallVec;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer, SharedObserver},
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::Subscription,
};

type Slot<Item, Err> = SharedObserver<BoxedObserver<'static, Item, Err>>;
type Observers<Item, Err> = SmallVec<[Slot<Item, Err>; 2]>;

enum Terminal<Err> {
  Completed,
  Errored(Err),
}

struct SubjectState<Item, Err> {
  observers: Observers<Item, Err>,
  terminal: Option<Terminal<Err>>,
}

/// Accepts pushed values and rebroadcasts them to every subscribed observer.
///
/// Values go to observers in subscription order. `error` and `complete` are
/// latched: later subscribers receive the terminal notification right away,
/// and further `next` calls are ignored.
///
/// The observer list is locked only to read or update it. Notifications are
/// delivered after the lock is released, each observer behind its own slot,
/// so an observer may subscribe or unsubscribe from inside a notification.
pub struct Subject<Item, Err> {
  state: MutArc<SubjectState<Item, Err>>,
}

impl<Item, Err> Subject<Item, Err> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Number of observers still attached.
  pub fn subscriber_count(&self) -> usize {
    let observers = self.state.rc_deref().observers.clone();
    observers.iter().filter(|slot| !slot.is_detached()).count()
  }

  /// Returns true once `error` or `complete` has been received.
  #[inline]
  pub fn is_terminated(&self) -> bool { self.state.rc_deref().terminal.is_some() }

  fn terminate(&self, terminal: Terminal<Err>) -> Observers<Item, Err> {
    let mut state = self.state.rc_deref_mut();
    if state.terminal.is_some() {
      return SmallVec::new();
    }
    state.terminal = Some(terminal);
    std::mem::take(&mut state.observers)
  }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject { state: MutArc::own(SubjectState { observers: SmallVec::new(), terminal: None }) }
  }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subject { state: self.state.clone() } }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let mut observers = {
      let state = self.state.rc_deref();
      if state.terminal.is_some() {
        return;
      }
      state.observers.clone()
    };

    for slot in observers.iter_mut() {
      Observer::<Item, Err>::next(slot, value.clone());
    }

    // Slot locks are never taken while the list lock is held.
    observers.retain(|slot| Observer::<Item, Err>::is_closed(slot));
    if !observers.is_empty() {
      self
        .state
        .rc_deref_mut()
        .observers
        .retain(|slot| !observers.iter().any(|closed| closed.ptr_eq(slot)));
    }
  }

  fn error(self, err: Err) {
    let observers = self.terminate(Terminal::Errored(err.clone()));
    for slot in observers {
      Observer::<Item, Err>::error(slot, err.clone());
    }
  }

  fn complete(self) {
    let observers = self.terminate(Terminal::Completed);
    for slot in observers {
      Observer::<Item, Err>::complete(slot);
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.is_terminated() }
}

impl<Item, Err, O> Observable<Item, Err, O> for Subject<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  Err: Clone,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let boxed: BoxedObserver<'static, Item, Err> = Box::new(observer);
    let slot = SharedObserver::new(boxed);
    let terminal = {
      let mut state = self.state.rc_deref_mut();
      match &state.terminal {
        None => {
          state.observers.push(slot.clone());
          None
        }
        Some(Terminal::Completed) => Some(Terminal::Completed),
        Some(Terminal::Errored(err)) => Some(Terminal::Errored(err.clone())),
      }
    };

    match terminal {
      None => {}
      Some(Terminal::Completed) => Observer::<Item, Err>::complete(slot.clone()),
      Some(Terminal::Errored(err)) => Observer::<Item, Err>::error(slot.clone(), err),
    }
    SubjectSubscription { slot }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for Subject<Item, Err> {}

/// Detaches one observer from a `Subject`.
pub struct SubjectSubscription<Item, Err> {
  slot: Slot<Item, Err>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  #[inline]
  fn unsubscribe(self) { self.slot.detach() }

  #[inline]
  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.slot) }
}
