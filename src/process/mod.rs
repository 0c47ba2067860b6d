//! External process invocation.
//!
//! Every stage talks to the outside world through a `ProcessRunner`, so the
//! same orchestration code drives real runs, dry runs and tests.

mod command;
pub mod recording;
mod runner;

pub use command::CommandSpec;
pub use recording::RecordingRunner;
pub use runner::{DryRunRunner, ExitOutcome, ProcessRunner, SystemRunner, run_checked};
