//! Base training: train on base classes, or restore a cached checkpoint.

use std::path::PathBuf;

use log::info;

use super::commands;
use super::fsops::FsOps;
use super::report::{BaseOutcome, RunReport};
use crate::error::Result;
use crate::pipeline::Experiment;
use crate::process::{ProcessRunner, run_checked};

pub const STAGE: &str = "base training";

/// Produce the base checkpoint and return its path.
///
/// With `skip_base_training` set the trainer is not invoked; the cached
/// checkpoint is copied to where training would have written it.
pub async fn run<R>(exp: &Experiment, runner: &R, fs: &FsOps, report: &mut RunReport) -> Result<PathBuf>
where
    R: ProcessRunner + ?Sized,
{
    let config = exp.config();
    let output_dir = exp.base_output_dir()?;
    let checkpoint = exp.base_checkpoint()?;
    fs.create_dir_all(&output_dir)?;

    if config.stages.skip_base_training {
        let cached = exp.cached_base_checkpoint()?;
        info!("Skipping base training, restoring {}", cached.display());
        fs.copy_checkpoint(&cached, &checkpoint)?;
        report.base = Some(BaseOutcome::Restored);
        return Ok(checkpoint);
    }

    let cmd = commands::train(
        &config.programs,
        config.num_gpus,
        &exp.base_config()?,
        &[
            ("MODEL.WEIGHTS", exp.imagenet_pretrain()?.display().to_string()),
            ("OUTPUT_DIR", output_dir.display().to_string()),
        ],
    );
    run_checked(runner, STAGE, &cmd).await?;
    report.base = Some(BaseOutcome::Trained);
    Ok(checkpoint)
}
