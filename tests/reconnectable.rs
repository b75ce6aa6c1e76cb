//! Behaviour of the reconnectable multicast across connect/disconnect cycles.

use std::{
  convert::Infallible,
  sync::{mpsc::channel, Arc, Barrier},
  thread,
  time::Duration,
};

use rx_finally::prelude::*;

type Log = MutArc<Vec<String>>;

fn recorder(log: &Log, name: &'static str) -> impl Observer<i32, Infallible> + Send + 'static {
  let (n, c) = (log.clone(), log.clone());
  ObserverAll::new(
    move |v: i32| n.rc_deref_mut().push(format!("{name}:{v}")),
    |_: Infallible| {},
    move || c.rc_deref_mut().push(format!("{name}:complete")),
  )
}

/// Emits 1, 2, 3 and completes, counting how many times it ran.
fn counted_source(
  runs: &MutArc<usize>,
) -> impl ObservableExt<i32, Infallible>
       + Observable<i32, Infallible, Subject<i32, Infallible>, Unsub = ()>
       + Clone
       + Send
       + Sync
       + 'static {
  let runs = runs.clone();
  observable::create(move |emitter: &mut dyn Emitter<i32, Infallible>| {
    *runs.rc_deref_mut() += 1;
    for v in 1..=3 {
      emitter.next(v);
    }
    emitter.complete();
  })
}

#[test]
fn no_side_effects_before_connect() {
  let runs = MutArc::own(0);
  let log = Log::default();
  let shared = counted_source(&runs).publish_reconnectable();
  shared.clone().actual_subscribe(recorder(&log, "a"));
  shared.clone().actual_subscribe(recorder(&log, "b"));

  assert_eq!(*runs.rc_deref(), 0);
  assert!(log.rc_deref().is_empty());

  shared.connect();
  assert_eq!(*runs.rc_deref(), 1);
}

#[test]
fn two_observers_see_one_ordered_run() {
  let runs = MutArc::own(0);
  let log = Log::default();
  let shared = counted_source(&runs).publish_reconnectable();
  shared.clone().actual_subscribe(recorder(&log, "a"));
  shared.clone().actual_subscribe(recorder(&log, "b"));
  shared.connect();

  assert_eq!(
    *log.rc_deref(),
    vec!["a:1", "b:1", "a:2", "b:2", "a:3", "b:3", "a:complete", "b:complete"]
  );
  assert_eq!(*runs.rc_deref(), 1);
}

#[test]
fn connect_dispose_connect_runs_the_source_twice() {
  let runs = MutArc::own(0);
  let log = Log::default();
  let shared = counted_source(&runs).publish_reconnectable();

  shared.clone().actual_subscribe(recorder(&log, "first"));
  shared.connect().unsubscribe();
  assert!(!shared.is_active());

  shared.clone().actual_subscribe(recorder(&log, "second"));
  shared.connect();

  assert_eq!(*runs.rc_deref(), 2);
  assert_eq!(
    *log.rc_deref(),
    vec![
      "first:1",
      "first:2",
      "first:3",
      "first:complete",
      "second:1",
      "second:2",
      "second:3",
      "second:complete",
    ]
  );
}

#[test]
fn connections_share_one_run_until_the_last_is_disposed() {
  let runs = MutArc::own(0);
  let log = Log::default();
  let shared = counted_source(&runs).publish_reconnectable();
  shared.clone().actual_subscribe(recorder(&log, "a"));

  let first = shared.connect();
  let second = shared.connect();
  assert_eq!(*runs.rc_deref(), 1);
  assert_eq!(*log.rc_deref(), vec!["a:1", "a:2", "a:3", "a:complete"]);

  first.unsubscribe();
  assert!(shared.is_connected());
  second.unsubscribe();
  assert!(!shared.is_active());

  shared.connect().unsubscribe();
  assert_eq!(*runs.rc_deref(), 2);
}

#[test]
fn ref_count_reconnects_after_the_last_unsubscribe() {
  let runs = MutArc::own(0);
  let log = Log::default();
  let shared = counted_source(&runs).publish_reconnectable().ref_count();

  shared.clone().actual_subscribe(recorder(&log, "a")).unsubscribe();
  assert_eq!(shared.subscriber_count(), 0);
  shared.clone().actual_subscribe(recorder(&log, "b")).unsubscribe();

  assert_eq!(*runs.rc_deref(), 2);
  assert_eq!(
    *log.rc_deref(),
    vec!["a:1", "a:2", "a:3", "a:complete", "b:1", "b:2", "b:3", "b:complete"]
  );
}

#[test]
fn threaded_source_reaches_every_observer() {
  let shared = observable::create_task(
    ThreadScheduler::default(),
    |emitter: &mut dyn Emitter<i32, Fault>, _: CancellationToken| {
      for v in 1..=3 {
        emitter.next(v);
      }
    },
  )
  .publish_reconnectable();

  let (tx, rx) = channel();
  for name in ["a", "b"] {
    let (tx_next, tx_complete) = (tx.clone(), tx.clone());
    shared.clone().actual_subscribe(ObserverAll::new(
      move |v: i32| {
        let _ = tx_next.send(format!("{name}:{v}"));
      },
      |_: Fault| {},
      move || {
        let _ = tx_complete.send(format!("{name}:complete"));
      },
    ));
  }
  drop(tx);

  let connection = shared.connect();
  let notes: Vec<_> = (0..8)
    .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("notification"))
    .collect();
  assert_eq!(
    notes,
    vec!["a:1", "b:1", "a:2", "b:2", "a:3", "b:3", "a:complete", "b:complete"]
  );
  connection.unsubscribe();
  assert!(!shared.is_active());
}

#[test]
fn racing_threads_see_one_channel_per_cycle() {
  const CYCLES: usize = 20;
  const THREADS: usize = 4;

  let runs = MutArc::own(0);
  let created = MutArc::own(0);
  let c_runs = runs.clone();
  let c_created = created.clone();
  let shared = observable::create(move |emitter: &mut dyn Emitter<i32, Infallible>| {
    let cycle = {
      let mut runs = c_runs.rc_deref_mut();
      *runs += 1;
      *runs as i32
    };
    for step in 1..=3 {
      emitter.next(cycle * 10 + step);
      thread::yield_now();
    }
    emitter.complete();
  })
  .multicast_reconnectable(move || {
    *c_created.rc_deref_mut() += 1;
    Subject::<i32, Infallible>::default()
  });

  for cycle in 1..=CYCLES as i32 {
    let logs: Vec<Log> = (0..THREADS).map(|_| Log::default()).collect();

    let barrier = Arc::new(Barrier::new(THREADS));
    let subscribers: Vec<_> = logs
      .iter()
      .map(|log| {
        let (shared, log, barrier) = (shared.clone(), log.clone(), barrier.clone());
        thread::spawn(move || {
          barrier.wait();
          shared.actual_subscribe(recorder(&log, "o"));
        })
      })
      .collect();
    subscribers.into_iter().for_each(|handle| handle.join().unwrap());

    let barrier = Arc::new(Barrier::new(THREADS));
    let connectors: Vec<_> = (0..THREADS)
      .map(|_| {
        let (shared, barrier) = (shared.clone(), barrier.clone());
        thread::spawn(move || {
          barrier.wait();
          shared.connect()
        })
      })
      .collect();
    let connections: Vec<_> =
      connectors.into_iter().map(|handle| handle.join().unwrap()).collect();

    let barrier = Arc::new(Barrier::new(THREADS));
    let disposers: Vec<_> = connections
      .into_iter()
      .map(|connection| {
        let barrier = barrier.clone();
        thread::spawn(move || {
          barrier.wait();
          connection.unsubscribe();
        })
      })
      .collect();
    disposers.into_iter().for_each(|handle| handle.join().unwrap());

    assert!(!shared.is_active());
    assert_eq!(*created.rc_deref(), cycle as usize);
    assert_eq!(*runs.rc_deref(), cycle as usize);
    let expected: Vec<String> = (1..=3)
      .map(|step| format!("o:{}", cycle * 10 + step))
      .chain(std::iter::once("o:complete".to_owned()))
      .collect();
    for log in &logs {
      assert_eq!(*log.rc_deref(), expected);
    }
  }
}
