use std::process::ExitCode;

use clap::Parser;
use rx_finally::probe::{self, ProbeArgs, ProbeConfig};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = ProbeArgs::parse();
  let config = ProbeConfig::from(&args);
  tracing::info!(version = env!("CARGO_PKG_VERSION"), "Hello from rx-finally");

  let report = match probe::run(&config) {
    Ok(report) => report,
    Err(err) => {
      tracing::error!(%err, "probe aborted");
      return ExitCode::from(2);
    }
  };
  println!("{report}");

  if report.finally_reached_caller() && !args.contain {
    tracing::error!("the finally panic unwound into the caller");
    return ExitCode::from(101);
  }
  println!("Goodbye! ({})", report.outcome);
  ExitCode::SUCCESS
}
