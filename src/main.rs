use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{Cli, Commands};
use fsod_runner::config::{self, RunnerConfig};
use fsod_runner::domain::Dataset;
use fsod_runner::pipeline::{Experiment, TrainingPipeline};
use fsod_runner::process::{DryRunRunner, ProcessRunner, SystemRunner};
use fsod_runner::sampler::{SamplerOptions, SplitSampler};

/// `<data_local_dir>/fsod-runner/logs/fsod-runner.log`, or under `.` when the
/// platform has no data dir.
fn log_file_path() -> PathBuf {
    let name = env!("CARGO_PKG_NAME");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
        .join("logs")
        .join(format!("{}.log", name))
}

/// Route `log` output to the log file. `RUST_LOG` wins over the `--verbose` default.
fn setup_logging(verbose: bool) -> Result<PathBuf> {
    let log_file = log_file_path();
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .context(format!("Failed to open {}", log_file.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(log_file)
}

async fn run_application(cli: &Cli, config: RunnerConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Train {
            experiment,
            split,
            dataset,
        } => {
            let dataset = dataset.unwrap_or(config.dataset);
            let exp = Experiment::new(experiment, split, dataset, config)?;
            if cli.dry_run {
                handle_train_command(&exp, DryRunRunner, true).await
            } else {
                let runner = SystemRunner::new().with_timeout_ms(exp.config().programs.timeout_ms);
                handle_train_command(&exp, runner, false).await
            }
        }
        Commands::Sample {
            experiment,
            split,
            pool_size,
            output_sizes,
            sampler,
            dataset,
        } => {
            let options = SamplerOptions::parse(*pool_size, output_sizes, sampler)?;
            let dataset: Dataset = dataset.unwrap_or(config.dataset);
            let exp = Experiment::new(experiment, split, dataset, config)?;
            if cli.dry_run {
                handle_sample_command(&exp, &options, DryRunRunner, true).await
            } else {
                let runner = SystemRunner::new().with_timeout_ms(exp.config().programs.timeout_ms);
                handle_sample_command(&exp, &options, runner, false).await
            }
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config).context("Failed to serialize config")?);
            Ok(())
        }
    }
}

async fn handle_train_command<R: ProcessRunner>(exp: &Experiment, runner: R, dry_run: bool) -> Result<()> {
    info!("Training experiment {} split {}", exp.name(), exp.split());
    println!(
        "{} {} ({} split {})",
        "Training:".green(),
        exp.name(),
        exp.dataset(),
        exp.split()
    );

    let report = TrainingPipeline::new(runner)
        .dry_run(dry_run)
        .run(exp)
        .await
        .context(format!("Experiment {} failed", exp.name()))?;

    println!("{}\n{}", "Done.".green(), report);
    Ok(())
}

async fn handle_sample_command<R: ProcessRunner>(
    exp: &Experiment,
    options: &SamplerOptions,
    runner: R,
    dry_run: bool,
) -> Result<()> {
    info!(
        "Sampling splits for {} split {} with {} (pool {})",
        exp.name(),
        exp.split(),
        options.sampler,
        options.pool_size
    );
    println!("{} {} with {}", "Sampling:".green(), exp.name(), options.sampler);

    let report = SplitSampler::new(runner)
        .dry_run(dry_run)
        .run(exp, options)
        .await
        .context("Sampling failed")?;

    println!("{} generated seeds {:?}", "Done.".green(), report.seeds);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = setup_logging(cli.is_verbose()).context("Failed to setup logging")?;
    info!("Logging to {}", log_file.display());

    // Load configuration
    let config = config::load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_layout() {
        let path = log_file_path();
        assert!(path.ends_with("fsod-runner/logs/fsod-runner.log"));
    }
}
