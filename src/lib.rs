//! # rx-finally
//!
//! A small, thread-safe core of [Reactive Extensions](http://reactivex.io/)
//! built to answer one question: when the `finalize` callback at the end of
//! a pipeline panics, where does that panic go?
//!
//! ```rust
//! use rx_finally::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .take(3)
//!   .finalize(|| println!("done"))
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Anything that can be subscribed to |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`ReconnectableObservable`] | Multicast that can be connected again after a disconnect |
//!
//! The [`probe`] module drives the finally-panic scenarios; the `rx-finally`
//! binary exposes it on the command line.
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): [`PoolScheduler`] on a `futures`
//!   thread pool.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`ReconnectableObservable`]: observable::ReconnectableObservable
//! [`PoolScheduler`]: scheduler::PoolScheduler

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod probe;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use prelude::*;
