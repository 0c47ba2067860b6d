//! Few-shot split sampler.
//!
//! Invokes the external sampler once per source seed, each run writing a new
//! split directory `seed<offset + i>`. The first failing run stops the loop;
//! otherwise the generated directories are zipped into one archive.

mod archive;
mod options;

use std::path::PathBuf;

use colored::*;
use log::{error, info};

pub use archive::{archive_name, zip_dirs};
pub use options::SamplerOptions;

use crate::error::{Result, RunnerError};
use crate::pipeline::Experiment;
use crate::process::{CommandSpec, ProcessRunner};

pub const STAGE: &str = "sampling";

/// Outcome of a completed sampling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    /// New seed ids written, in order
    pub seeds: Vec<u32>,
    /// Archive path; `None` in dry-run mode
    pub archive: Option<PathBuf>,
}

pub struct SplitSampler<R: ProcessRunner> {
    runner: R,
    dry_run: bool,
}

impl<R: ProcessRunner> SplitSampler<R> {
    pub fn new(runner: R) -> Self {
        Self { runner, dry_run: false }
    }

    /// Skip archiving; commands go to the runner as usual
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Command for one sampler iteration.
    pub fn command(exp: &Experiment, options: &SamplerOptions, prev_seed: u32, new_seed: u32) -> Result<CommandSpec> {
        let config = exp.config();
        Ok(CommandSpec::new(&config.programs.interpreter)
            .arg(&config.programs.sampler)
            .arg("--num-gpus")
            .arg(config.num_gpus.to_string())
            .arg("--config-file")
            .path_arg(exp.base_config()?)
            .args(["--experiment", exp.name()])
            .arg("--pool-size")
            .arg(options.pool_size.to_string())
            .arg("--shots")
            .args(options.output_sizes.iter().map(|s| s.to_string()))
            .args(["--sampler", options.sampler.as_str()])
            .arg("--prev-seed")
            .arg(prev_seed.to_string())
            .arg("--new-seed")
            .arg(new_seed.to_string()))
    }

    pub async fn run(&self, exp: &Experiment, options: &SamplerOptions) -> Result<SampleReport> {
        let sampler_config = &exp.config().sampler;
        let split_dir = exp.split_dir()?;
        let mut seeds = Vec::new();

        for prev_seed in 0..sampler_config.seed_count {
            let new_seed = sampler_config.seed_offset.checked_add(prev_seed).ok_or_else(|| {
                RunnerError::Config(format!(
                    "sampler.seed_offset {} overflows at seed {}",
                    sampler_config.seed_offset, prev_seed
                ))
            })?;
            let cmd = Self::command(exp, options, prev_seed, new_seed)?;
            info!("[{}] {}", STAGE, cmd);

            let outcome = self.runner.run(&cmd).await?;
            if !outcome.is_success() {
                error!(
                    "Sampler exited with {:?} on seed {}, skipping remaining seeds",
                    outcome.code, prev_seed
                );
                eprintln!(
                    "{} sampler failed on seed {} (exit code {:?}), aborting",
                    "Error:".red(),
                    prev_seed,
                    outcome.code
                );
                return Err(RunnerError::SamplerFailed {
                    seed: prev_seed,
                    code: outcome.code,
                });
            }
            seeds.push(new_seed);
        }

        let dest = sampler_config
            .archive_dir
            .join(archive_name(exp.split(), exp.name(), options.pool_size, &options.sampler));

        if self.dry_run {
            println!("[dry-run] zip {} seed dirs from {} into {}", seeds.len(), split_dir.display(), dest.display());
            return Ok(SampleReport { seeds, archive: None });
        }

        let dirs: Vec<PathBuf> = seeds.iter().map(|s| split_dir.join(format!("seed{}", s))).collect();
        zip_dirs(&split_dir, &dirs, &dest)?;
        println!("{} {}", "Archive:".green(), dest.display());

        Ok(SampleReport {
            seeds,
            archive: Some(dest),
        })
    }
}
