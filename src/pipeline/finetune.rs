//! Fine-tuning loops and result extraction.
//!
//! Each enabled variant loops over every (shot, seed) pair: generate the run's
//! config, train from the surgery checkpoint, then delete the generated config
//! and final checkpoint unless outputs are kept. After the loop the results
//! tool summarizes the variant's output directory.

use std::path::Path;

use log::info;

use super::commands::{self, ConfigRequest};
use super::fsops::FsOps;
use super::report::RunReport;
use crate::domain::Variant;
use crate::error::Result;
use crate::pipeline::Experiment;
use crate::process::{ProcessRunner, run_checked};

pub const CONFIG_STAGE: &str = "config generation";
pub const TRAIN_STAGE: &str = "fine-tuning";
pub const RESULTS_STAGE: &str = "result extraction";

pub async fn run<R>(
    exp: &Experiment,
    runner: &R,
    fs: &FsOps,
    variant: Variant,
    weights: &Path,
    report: &mut RunReport,
) -> Result<()>
where
    R: ProcessRunner + ?Sized,
{
    let config = exp.config();
    let settings = config.variants.get(variant);
    let config_root = exp.config_root()?;
    let pcb_model = exp.imagenet_pretrain_torch()?;

    info!(
        "Fine-tuning {} ({} shots x {} seeds) from {}",
        variant,
        config.shots.len(),
        config.seeds.len(),
        weights.display()
    );

    for &shot in &config.shots {
        for &seed in &config.seeds {
            let paths = exp.run_paths(variant, shot, seed)?;

            let generate = commands::create_config(
                &config.programs,
                &ConfigRequest {
                    dataset: exp.dataset(),
                    config_root: &config_root,
                    shot,
                    seed,
                    setting: &settings.setting,
                    split: exp.split(),
                },
            );
            run_checked(runner, CONFIG_STAGE, &generate).await?;

            fs.create_dir_all(&paths.output_dir)?;
            let mut opts = vec![
                ("MODEL.WEIGHTS", weights.display().to_string()),
                ("OUTPUT_DIR", paths.output_dir.display().to_string()),
                ("TEST.PCB_MODELPATH", pcb_model.display().to_string()),
            ];
            if let Some(trainer) = &config.trainer {
                opts.push(("TRAINER", trainer.clone()));
            }
            let train = commands::train(&config.programs, config.num_gpus, &paths.config, &opts);
            run_checked(runner, TRAIN_STAGE, &train).await?;
            report.record_finetune(variant);

            if !config.stages.keep_outputs {
                for file in [paths.config.clone(), paths.final_checkpoint()] {
                    if fs.remove_file(&file)? {
                        report.files_removed += 1;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Summarize every run of a variant.
pub async fn extract_results<R>(exp: &Experiment, runner: &R, variant: Variant, report: &mut RunReport) -> Result<()>
where
    R: ProcessRunner + ?Sized,
{
    let config = exp.config();
    let cmd = commands::extract_results(&config.programs, &exp.variant_dir(variant)?, &config.shots);
    run_checked(runner, RESULTS_STAGE, &cmd).await?;
    report.results_extracted.push(variant);
    Ok(())
}
