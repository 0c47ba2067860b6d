//! Model surgery between base training and fine-tuning.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::info;

use super::commands;
use super::fsops::FsOps;
use super::report::RunReport;
use crate::domain::SurgeryMethod;
use crate::error::Result;
use crate::pipeline::Experiment;
use crate::process::{ProcessRunner, run_checked};

pub const STAGE: &str = "model surgery";

/// Surgery methods needed by the enabled variants, each once.
pub fn required_methods(exp: &Experiment) -> BTreeSet<SurgeryMethod> {
    let config = exp.config();
    config
        .enabled_variants()
        .into_iter()
        .map(|v| config.variants.get(v).surgery)
        .collect()
}

/// Produce one surgery checkpoint per required method.
///
/// Returns the checkpoint each method's variants fine-tune from.
pub async fn run<R>(
    exp: &Experiment,
    runner: &R,
    fs: &FsOps,
    base_checkpoint: &Path,
    report: &mut RunReport,
) -> Result<BTreeMap<SurgeryMethod, PathBuf>>
where
    R: ProcessRunner + ?Sized,
{
    let config = exp.config();
    let save_dir = exp.base_output_dir()?;
    let mut weights = BTreeMap::new();

    for method in required_methods(exp) {
        let output = exp.surgery_checkpoint(method)?;

        if method == SurgeryMethod::Randinit && config.stages.use_provided_randinit {
            let provided = exp.provided_randinit()?;
            info!("Using provided random-init checkpoint {}", provided.display());
            fs.copy_checkpoint(&provided, &output)?;
            report.provided_randinit = true;
        } else {
            let cmd = commands::surgery(&config.programs, exp.dataset(), method, base_checkpoint, &save_dir);
            run_checked(runner, STAGE, &cmd).await?;
            report.surgery_runs.push(method);
        }

        weights.insert(method, output);
    }

    Ok(weights)
}
