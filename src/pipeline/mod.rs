//! Training pipeline: base training, surgery, fine-tuning variants, results.

mod base;
mod commands;
mod experiment;
mod finetune;
mod fsops;
mod report;
mod surgery;

use colored::*;
use log::info;

pub use experiment::{Experiment, FINAL_CHECKPOINT, RunPaths};
pub use fsops::FsOps;
pub use report::{BaseOutcome, RunReport};

use crate::error::{Result, RunnerError};
use crate::process::ProcessRunner;

/// Runs every stage of an experiment in order through one `ProcessRunner`.
///
/// Stages run sequentially; the first failing invocation aborts the run.
pub struct TrainingPipeline<R: ProcessRunner> {
    runner: R,
    fs: FsOps,
}

impl<R: ProcessRunner> TrainingPipeline<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            fs: FsOps::default(),
        }
    }

    /// Skip filesystem changes (directories, copies, cleanup)
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.fs = FsOps::new(dry_run);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn run(&self, exp: &Experiment) -> Result<RunReport> {
        let mut report = RunReport::default();
        let variants = exp.config().enabled_variants();
        info!(
            "Running experiment {} on {} split {} (variants: {:?})",
            exp.name(),
            exp.dataset(),
            exp.split(),
            variants
        );

        println!("{} {}", "Stage:".cyan(), base::STAGE);
        let base_checkpoint = base::run(exp, &self.runner, &self.fs, &mut report).await?;

        if variants.is_empty() {
            info!("No fine-tuning variants enabled, stopping after base training");
            return Ok(report);
        }

        println!("{} {}", "Stage:".cyan(), surgery::STAGE);
        let weights = surgery::run(exp, &self.runner, &self.fs, &base_checkpoint, &mut report).await?;

        for variant in variants {
            let method = exp.config().variants.get(variant).surgery;
            let weight = weights.get(&method).ok_or_else(|| {
                RunnerError::Config(format!("no {} surgery checkpoint for {}", method, variant))
            })?;

            println!("{} {} {}", "Stage:".cyan(), finetune::TRAIN_STAGE, variant.to_string().bold());
            finetune::run(exp, &self.runner, &self.fs, variant, weight, &mut report).await?;
            finetune::extract_results(exp, &self.runner, variant, &mut report).await?;
        }

        info!("Experiment {} finished: {:?}", exp.name(), report);
        Ok(report)
    }
}
