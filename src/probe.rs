//! Scenario driver for the finally-panic question.
//!
//! A probe builds a source that emits a few values and then ends in one of
//! the configured ways, puts a `finalize` callback that panics at the end of
//! the pipeline, subscribes, and reports where that panic surfaced.

mod config;
mod journal;
mod run;
mod source;

pub use config::{ConfigError, ProbeArgs, ProbeConfig, Strategy, Termination};
pub use journal::{Event, Journal};
pub use run::{run, FinallyOutcome, ProbeReport, FINALLY_MESSAGE};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
  #[error("invalid scenario: {0}")]
  Config(#[from] ConfigError),
}
