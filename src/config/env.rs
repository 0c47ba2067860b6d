//! Environment-variable overrides.
//!
//! Applied on top of the file config; a set variable always wins.

use std::path::PathBuf;

use crate::config::RunnerConfig;
use crate::domain::Variant;
use crate::error::{Result, RunnerError};

pub const NUM_GPUS: &str = "NUM_GPUS";
pub const SKIP_BASE_TRAINING: &str = "SKIP_BASE_TRAINING";
pub const RUN_FSOD: &str = "RUN_FSOD";
pub const RUN_GFSOD: &str = "RUN_GFSOD";
pub const RUN_COMPLETE: &str = "RUN_COMPLETE";
pub const KEEP_OUTPUTS: &str = "KEEP_OUTPUTS";
pub const USE_PROVIDED_RANDINIT: &str = "USE_PROVIDED_RANDINIT";
pub const IMAGENET_PRETRAIN: &str = "IMAGENET_PRETRAIN";
pub const IMAGENET_PRETRAIN_TORCH: &str = "IMAGENET_PRETRAIN_TORCH";
pub const RANDINIT_WEIGHTS: &str = "RANDINIT_WEIGHTS";
pub const BASE_CHECKPOINT_CACHE: &str = "BASE_CHECKPOINT_CACHE";
pub const SAVE_DIR: &str = "SAVE_DIR";
pub const SEEDS: &str = "SEEDS";
pub const SHOTS: &str = "SHOTS";
pub const TRAINER: &str = "TRAINER";

impl RunnerConfig {
    /// Overlay values from `lookup`. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(NUM_GPUS) {
            self.num_gpus = v
                .trim()
                .parse()
                .map_err(|_| RunnerError::Config(format!("{} must be an integer, got '{}'", NUM_GPUS, v)))?;
        }
        if let Some(v) = get(SKIP_BASE_TRAINING) {
            self.stages.skip_base_training = parse_bool(SKIP_BASE_TRAINING, &v)?;
        }
        if let Some(v) = get(KEEP_OUTPUTS) {
            self.stages.keep_outputs = parse_bool(KEEP_OUTPUTS, &v)?;
        }
        if let Some(v) = get(USE_PROVIDED_RANDINIT) {
            self.stages.use_provided_randinit = parse_bool(USE_PROVIDED_RANDINIT, &v)?;
        }
        for (key, variant) in [
            (RUN_FSOD, Variant::Fsod),
            (RUN_GFSOD, Variant::Gfsod),
            (RUN_COMPLETE, Variant::Complete),
        ] {
            if let Some(v) = get(key) {
                self.variants.get_mut(variant).enabled = parse_bool(key, &v)?;
            }
        }
        if let Some(v) = get(IMAGENET_PRETRAIN) {
            self.weights.imagenet_pretrain = v;
        }
        if let Some(v) = get(IMAGENET_PRETRAIN_TORCH) {
            self.weights.imagenet_pretrain_torch = v;
        }
        if let Some(v) = get(RANDINIT_WEIGHTS) {
            self.weights.randinit = v;
        }
        if let Some(v) = get(BASE_CHECKPOINT_CACHE) {
            self.weights.base_cache = v;
        }
        if let Some(v) = get(SAVE_DIR) {
            self.save_dir = PathBuf::from(v);
        }
        if let Some(v) = get(SEEDS) {
            self.seeds = parse_list(SEEDS, &v)?;
        }
        if let Some(v) = get(SHOTS) {
            self.shots = parse_list(SHOTS, &v)?;
        }
        if let Some(v) = get(TRAINER) {
            self.trainer = Some(v.trim().to_string());
        }

        Ok(())
    }
}

/// Parse a shell-style boolean flag.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RunnerError::Config(format!(
            "{} must be a boolean (1/0, true/false, yes/no, on/off), got '{}'",
            name, other
        ))),
    }
}

/// Parse a whitespace- or comma-separated list of integers.
pub fn parse_list(name: &str, value: &str) -> Result<Vec<u32>> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| RunnerError::Config(format!("{} contains a non-integer entry '{}'", name, s)))
        })
        .collect()
}
