//! Configuration system for fsod-runner.
//!
//! Two layers:
//! 1. Config file (explicit path, ./.fsod-runner.yml, or ~/.config/fsod-runner/fsod-runner.yml)
//! 2. Environment variable overrides (NUM_GPUS, SHOTS, SEEDS, RUN_FSOD, ...)

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use self::env::{parse_bool, parse_list};
pub use self::settings::{
    LayoutConfig, ProgramsConfig, RunnerConfig, SamplerConfig, StagesConfig, VariantConfig, VariantsConfig,
    WeightsConfig,
};

pub mod env;
mod settings;

/// Project config file name looked up in the working directory.
pub const PROJECT_CONFIG: &str = ".fsod-runner.yml";

/// Load configuration from the standard search paths, then apply environment overrides.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .fsod-runner.yml in current directory (project config)
/// 3. ~/.config/fsod-runner/fsod-runner.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<RunnerConfig> {
    resolve_config(explicit_path, &search_paths(), |key| std::env::var(key).ok())
}

/// Fallback locations, most specific first.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(PROJECT_CONFIG)];
    if let Some(config_dir) = dirs::config_dir() {
        let project_name = env!("CARGO_PKG_NAME");
        paths.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
    }
    paths
}

fn resolve_config<F>(explicit_path: Option<&PathBuf>, fallbacks: &[PathBuf], lookup: F) -> Result<RunnerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = load_file_config(explicit_path, fallbacks)?;
    config.apply_overrides(lookup).context("Invalid environment override")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_file_config(explicit_path: Option<&PathBuf>, fallbacks: &[PathBuf]) -> Result<RunnerConfig> {
    // Explicit path takes precedence and must load
    if let Some(path) = explicit_path {
        return load_from_file(path).context(format!("Failed to load config from {}", path.display()));
    }

    for path in fallbacks.iter().filter(|p| p.exists()) {
        match load_from_file(path) {
            Ok(config) => return Ok(config),
            Err(e) => log::warn!("Failed to load {}: {:#}", path.display(), e),
        }
    }

    log::info!("No config file found, using defaults");
    Ok(RunnerConfig::default())
}

/// Load a config file without environment overrides.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RunnerConfig> {
    let content = fs::read_to_string(&path).context("Failed to read config file")?;
    let config: RunnerConfig = serde_yaml::from_str(&content).context("Failed to parse config file")?;
    log::info!("Loaded config from: {}", path.as_ref().display());
    Ok(config)
}
