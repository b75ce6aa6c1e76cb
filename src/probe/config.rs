use std::time::Duration;

use clap::{Parser, ValueEnum};

/// How the source sequence ends once it has emitted its values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Termination {
  /// Signal completion.
  #[default]
  Complete,
  /// Signal an error.
  Error,
  /// Panic inside the producer.
  Panic,
  /// Return without any terminal signal.
  Silent,
}

/// Where the source's producer runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
  /// Inline, on the subscribing thread.
  Sync,
  /// On a dedicated worker thread, with a cancellation token.
  #[default]
  Async,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
  #[error("an infinite sequence needs a take limit or cancellation to end")]
  Unbounded,
  #[error("cancellation needs the async strategy, a sync source has ended before subscribe returns")]
  CancelRequiresAsync,
  #[error("an infinite sync source behind a shared subject never sees the take limit")]
  SharedInfiniteSync,
}

/// One probe scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
  pub termination: Termination,
  pub strategy: Strategy,
  /// Forward only the first `n` values.
  pub take: Option<usize>,
  /// Emit 0, 1, 2, ... until cancelled or closed instead of 1, 2, 3.
  pub infinite: bool,
  /// Unsubscribe once `settle` has passed.
  pub cancel: bool,
  /// Pause between values of an infinite sequence.
  pub interval: Duration,
  /// How long the caller waits after subscribing to an async source.
  pub settle: Duration,
  /// How long the caller waits after cancelling.
  pub cancel_grace: Duration,
  /// Share the source through `publish_reconnectable().ref_count()`.
  pub reconnectable: bool,
  /// Whether the finally callback panics.
  pub finally_panics: bool,
}

impl Default for ProbeConfig {
  fn default() -> Self {
    ProbeConfig {
      termination: Termination::default(),
      strategy: Strategy::default(),
      take: None,
      infinite: false,
      cancel: false,
      interval: Duration::from_millis(10),
      settle: Duration::from_millis(1000),
      cancel_grace: Duration::from_millis(500),
      reconnectable: false,
      finally_panics: true,
    }
  }
}

impl ProbeConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.cancel && self.strategy == Strategy::Sync {
      return Err(ConfigError::CancelRequiresAsync);
    }
    if self.infinite && self.take.is_none() && !self.cancel {
      return Err(ConfigError::Unbounded);
    }
    if self.infinite && self.strategy == Strategy::Sync && self.reconnectable {
      return Err(ConfigError::SharedInfiniteSync);
    }
    Ok(())
  }
}

/// Command line of the probe.
#[derive(Parser, Debug, Clone)]
#[command(name = "rx-finally", version, about = "Reports where a panic raised in a finally callback ends up")]
pub struct ProbeArgs {
  /// Where the source runs
  #[arg(long, value_enum, default_value_t = Strategy::Async)]
  pub strategy: Strategy,

  /// How the source ends
  #[arg(long, value_enum, default_value_t = Termination::Complete)]
  pub termination: Termination,

  /// Forward only the first N values
  #[arg(long)]
  pub take: Option<usize>,

  /// Emit values until cancelled or the take limit is reached
  #[arg(long, default_value_t = false)]
  pub infinite: bool,

  /// Unsubscribe after the settle time
  #[arg(long, default_value_t = false)]
  pub cancel: bool,

  /// Pause between values of an infinite sequence, in milliseconds
  #[arg(long, default_value_t = 10)]
  pub interval_ms: u64,

  /// Wait after subscribing to an async source, in milliseconds
  #[arg(long, default_value_t = 1000)]
  pub settle_ms: u64,

  /// Wait after cancelling, in milliseconds
  #[arg(long, default_value_t = 500)]
  pub cancel_grace_ms: u64,

  /// Share the source through a reconnectable, ref-counted subject
  #[arg(long, default_value_t = false)]
  pub reconnectable: bool,

  /// Let the finally callback return normally
  #[arg(long, default_value_t = false)]
  pub no_finally_panic: bool,

  /// Exit successfully even when the finally panic reached the caller
  #[arg(long, default_value_t = false)]
  pub contain: bool,
}

impl From<&ProbeArgs> for ProbeConfig {
  fn from(args: &ProbeArgs) -> Self {
    ProbeConfig {
      termination: args.termination,
      strategy: args.strategy,
      take: args.take,
      infinite: args.infinite,
      cancel: args.cancel,
      interval: Duration::from_millis(args.interval_ms),
      settle: Duration::from_millis(args.settle_ms),
      cancel_grace: Duration::from_millis(args.cancel_grace_ms),
      reconnectable: args.reconnectable,
      finally_panics: !args.no_finally_panic,
    }
  }
}
