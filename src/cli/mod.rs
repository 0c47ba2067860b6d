//! CLI module for fsod-runner - command-line interface and subcommands.

pub mod commands;

pub use commands::{Cli, Commands};
