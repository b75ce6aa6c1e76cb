//! A connectable that can be connected again after a disconnect.
//!
//! `ConnectableObservable` pushes every run of its source into one subject.
//! Once that subject has completed, reconnecting is useless: the subject
//! ignores everything. `ReconnectableObservable` instead caches the subject
//! only for the lifetime of one connection. Disconnecting forgets it, and the
//! next `connect()` or subscribe asks the factory for a fresh one.

use std::sync::Arc;

use crate::{
  observable::{Connectable, Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  subscription::{BoxedSubscription, Subscription},
};

/// The cached channel.
///
/// `connections` counts the live disposers handed out for the channel. While
/// it is non-zero the source is running, or being started, into `subject`;
/// `run` holds the source's subscription once the start has returned.
enum Channel<P> {
  Absent,
  Active { id: u64, subject: P, connections: usize, run: Option<BoxedSubscription> },
}

struct Gate<P> {
  channel: Channel<P>,
  issued: u64,
}

impl<P: Clone> Gate<P> {
  /// Returns the active channel, creating it with `factory` if there is none.
  fn ensure(&mut self, factory: impl FnOnce() -> P) -> (u64, P) {
    if let Channel::Active { id, subject, .. } = &self.channel {
      return (*id, subject.clone());
    }
    self.issued += 1;
    let subject = factory();
    self.channel = Channel::Active {
      id: self.issued,
      subject: subject.clone(),
      connections: 0,
      run: None,
    };
    (self.issued, subject)
  }
}

impl<P> Gate<P> {
  /// Counts one more connection on the active channel. Returns true when it
  /// is the first one, meaning the caller has to start the source.
  fn acquire(&mut self) -> bool {
    match &mut self.channel {
      Channel::Active { connections, .. } => {
        *connections += 1;
        *connections == 1
      }
      Channel::Absent => false,
    }
  }

  /// Stores the subscription of a source started for channel `id`. Hands it
  /// back if that channel was disconnected while the source was starting.
  fn attach_run(&mut self, id: u64, started: BoxedSubscription) -> Option<BoxedSubscription> {
    match &mut self.channel {
      Channel::Active { id: active, connections, run, .. } if *active == id && *connections > 0 => {
        *run = Some(started);
        None
      }
      _ => Some(started),
    }
  }

  /// Drops one connection of channel `id`. The last one forgets the channel
  /// and returns the run to tear down.
  fn release(&mut self, id: u64) -> Release {
    match &mut self.channel {
      Channel::Active { id: active, connections, run, .. } if *active == id => {
        *connections = connections.saturating_sub(1);
        if *connections > 0 {
          return Release::Shared;
        }
        let run = run.take();
        self.channel = Channel::Absent;
        Release::Last(run)
      }
      _ => Release::Stale,
    }
  }
}

enum Release {
  /// Other connections keep the channel running.
  Shared,
  /// The channel was cleared; the run, if it had started, must be stopped.
  Last(Option<BoxedSubscription>),
  /// The channel is already gone or was replaced.
  Stale,
}

/// Shares a cold source across repeated connect/disconnect cycles.
///
/// - `connect()` creates the channel if needed. The first connection of a
///   channel subscribes it to the source; later ones share that run. The
///   returned [`ReconnectableConnection`]s are counted, and disposing the
///   last one stops the run and clears the channel.
/// - Subscribing attaches to the current channel, creating it if needed, and
///   never starts the source.
///
/// Channel creation and teardown are serialized by one lock. The lock is held
/// only to read or swap the cached channel; the source runs, and is torn down,
/// after it is released.
///
/// Observers that are still attached when a channel is cleared stay on the
/// old, now idle channel. Later connections do not reach them.
pub struct ReconnectableObservable<S, F, P> {
  source: Arc<S>,
  factory: Arc<F>,
  gate: MutArc<Gate<P>>,
}

impl<S, F, P> ReconnectableObservable<S, F, P>
where
  F: Fn() -> P,
{
  pub fn new(source: S, factory: F) -> Self {
    ReconnectableObservable {
      source: Arc::new(source),
      factory: Arc::new(factory),
      gate: MutArc::own(Gate { channel: Channel::Absent, issued: 0 }),
    }
  }
}

impl<S, F, P> ReconnectableObservable<S, F, P> {
  /// Returns true while a channel is cached.
  pub fn is_active(&self) -> bool {
    matches!(self.gate.rc_deref_mut().channel, Channel::Active { .. })
  }

  /// Returns true while at least one connection is live.
  pub fn is_connected(&self) -> bool {
    matches!(self.gate.rc_deref_mut().channel, Channel::Active { connections, .. } if connections > 0)
  }
}

impl<S, F, P> Clone for ReconnectableObservable<S, F, P> {
  fn clone(&self) -> Self {
    ReconnectableObservable {
      source: self.source.clone(),
      factory: self.factory.clone(),
      gate: self.gate.clone(),
    }
  }
}

impl<Item, Err, S, F, P> Connectable<Item, Err> for ReconnectableObservable<S, F, P>
where
  S: Observable<Item, Err, P> + Clone,
  S::Unsub: Send + 'static,
  F: Fn() -> P,
  P: Observer<Item, Err> + Clone,
{
  type Connection = ReconnectableConnection<P>;

  fn connect(&self) -> Self::Connection {
    let (id, subject, first) = {
      let mut gate = self.gate.rc_deref_mut();
      let (id, subject) = gate.ensure(|| (self.factory)());
      let first = gate.acquire();
      (id, subject, first)
    };

    if first {
      tracing::debug!(channel = id, "connecting reconnectable source");
      let started = BoxedSubscription::new((*self.source).clone().actual_subscribe(subject));
      let orphan = self.gate.rc_deref_mut().attach_run(id, started);
      if orphan.is_some() {
        tracing::debug!(channel = id, "channel disconnected while starting, stopping the run");
      }
      orphan.unsubscribe();
    } else {
      tracing::debug!(channel = id, "joining the live connection");
    }
    ReconnectableConnection { id, gate: self.gate.clone() }
  }
}

impl<Item, Err, O, S, F, P> Observable<Item, Err, O> for ReconnectableObservable<S, F, P>
where
  O: Observer<Item, Err>,
  F: Fn() -> P,
  P: Observable<Item, Err, O> + Clone,
{
  type Unsub = P::Unsub;

  /// Attaches `observer` to the current channel.
  ///
  /// The gate lock covers only resolving the channel. The observer is
  /// attached after the lock is released, because a terminated subject
  /// notifies a late observer right away.
  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let (_, subject) = self.gate.rc_deref_mut().ensure(|| (self.factory)());
    subject.actual_subscribe(observer)
  }
}

impl<Item, Err, S, F, P> ObservableExt<Item, Err> for ReconnectableObservable<S, F, P> where
  S: ObservableExt<Item, Err>
{
}

/// Disposer returned by [`ReconnectableObservable::connect`].
///
/// Connections of one channel are counted. Unsubscribing the last one clears
/// the channel, unless it has already been replaced, then stops the source.
pub struct ReconnectableConnection<P> {
  id: u64,
  gate: MutArc<Gate<P>>,
}

impl<P> Subscription for ReconnectableConnection<P> {
  fn unsubscribe(self) {
    let released = self.gate.rc_deref_mut().release(self.id);
    match released {
      Release::Shared => {
        tracing::debug!(channel = self.id, "connection released, channel still shared")
      }
      Release::Stale => tracing::debug!(channel = self.id, "stale connection released"),
      Release::Last(run) => {
        tracing::debug!(channel = self.id, "disconnecting reconnectable source");
        run.unsubscribe();
      }
    }
  }

  fn is_closed(&self) -> bool {
    !matches!(
      self.gate.rc_deref_mut().channel,
      Channel::Active { id, connections, .. } if id == self.id && connections > 0
    )
  }
}
