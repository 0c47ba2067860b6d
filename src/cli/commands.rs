//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - train: base training, surgery and fine-tuning for one experiment/split
//! - sample: generate and archive few-shot splits
//! - config: print the resolved configuration

use clap::{Parser, Subcommand};
use fsod_runner::domain::Dataset;
use std::path::PathBuf;

/// fsod-runner - few-shot object detection experiment orchestrator
#[derive(Parser, Debug)]
#[command(name = "fsod-runner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print commands instead of running them; leave the filesystem untouched
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run base training, model surgery and the enabled fine-tuning variants
    Train {
        /// Experiment name, used in output paths
        experiment: String,

        /// Class split id
        split: String,

        /// Dataset (defaults to the configured one)
        #[arg(short, long, value_enum)]
        dataset: Option<Dataset>,
    },

    /// Sample few-shot splits over ten seeds and zip the results
    Sample {
        /// Experiment name, used in the archive name
        experiment: String,

        /// Class split id
        split: String,

        /// Candidate pool size per class
        #[arg(short = 'p', long)]
        pool_size: u32,

        /// Output sizes (shots), space or comma separated
        #[arg(short = 'o', long)]
        output_sizes: String,

        /// Sampler class name
        #[arg(short = 's', long)]
        sampler: String,

        /// Dataset (defaults to the configured one)
        #[arg(short, long, value_enum)]
        dataset: Option<Dataset>,
    },

    /// Print the resolved configuration (file plus environment overrides)
    Config,
}
