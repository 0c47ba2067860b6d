//! Runner configuration.
//!
//! Loaded from ./.fsod-runner.yml or ~/.config/fsod-runner/fsod-runner.yml,
//! then overlaid with environment variables (see `env`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, SurgeryMethod, Variant};
use crate::error::{Result, RunnerError};

/// Top-level configuration for a training or sampling run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Dataset used when the CLI does not name one.
    pub dataset: Dataset,

    /// GPU count forwarded to the training entry point.
    pub num_gpus: u32,

    /// Root directory for every experiment's outputs.
    pub save_dir: PathBuf,

    /// Shot counts fine-tuned per variant.
    pub shots: Vec<u32>,

    /// Seeds fine-tuned per shot.
    pub seeds: Vec<u32>,

    /// Trainer class forwarded to the training entry point, if any.
    pub trainer: Option<String>,

    /// Stage toggles.
    pub stages: StagesConfig,

    /// Fine-tuning variants.
    pub variants: VariantsConfig,

    /// Pretrained and cached checkpoint locations.
    pub weights: WeightsConfig,

    /// External programs.
    pub programs: ProgramsConfig,

    /// Path templates for generated configs and output dirs.
    pub layout: LayoutConfig,

    /// Split sampler settings.
    pub sampler: SamplerConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            dataset: Dataset::Voc,
            num_gpus: 1,
            save_dir: PathBuf::from("checkpoints"),
            shots: vec![1, 2, 3, 5, 10],
            seeds: (0..10).collect(),
            trainer: None,
            stages: StagesConfig::default(),
            variants: VariantsConfig::default(),
            weights: WeightsConfig::default(),
            programs: ProgramsConfig::default(),
            layout: LayoutConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.num_gpus == 0 {
            return Err(RunnerError::Config("num_gpus must be at least 1".to_string()));
        }
        if self.shots.is_empty() {
            return Err(RunnerError::Config("shot list is empty".to_string()));
        }
        if self.seeds.is_empty() {
            return Err(RunnerError::Config("seed list is empty".to_string()));
        }
        if self.sampler.seed_count == 0 {
            return Err(RunnerError::Config("sampler.seed_count must be at least 1".to_string()));
        }
        if self.sampler.seed_offset.checked_add(self.sampler.seed_count).is_none() {
            return Err(RunnerError::Config(format!(
                "sampler.seed_offset {} plus seed_count {} overflows",
                self.sampler.seed_offset, self.sampler.seed_count
            )));
        }
        if self.programs.interpreter.trim().is_empty() {
            return Err(RunnerError::Config("programs.interpreter is empty".to_string()));
        }
        Ok(())
    }

    /// Variants that will run, in execution order.
    pub fn enabled_variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.variants.get(*v).enabled)
            .collect()
    }
}

/// Which stages run and what they leave behind.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StagesConfig {
    /// Copy the cached base checkpoint instead of training.
    pub skip_base_training: bool,

    /// Keep generated fine-tuning configs and final checkpoints.
    pub keep_outputs: bool,

    /// Use the provided random-init checkpoint instead of running randinit surgery.
    pub use_provided_randinit: bool,
}

/// Fine-tuning variants. Each entry may be partial; missing keys keep the
/// variant's own defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "PartialVariants")]
pub struct VariantsConfig {
    pub fsod: VariantConfig,
    pub gfsod: VariantConfig,
    pub complete: VariantConfig,
}

impl VariantsConfig {
    pub fn get(&self, variant: Variant) -> &VariantConfig {
        match variant {
            Variant::Fsod => &self.fsod,
            Variant::Gfsod => &self.gfsod,
            Variant::Complete => &self.complete,
        }
    }

    pub fn get_mut(&mut self, variant: Variant) -> &mut VariantConfig {
        match variant {
            Variant::Fsod => &mut self.fsod,
            Variant::Gfsod => &mut self.gfsod,
            Variant::Complete => &mut self.complete,
        }
    }
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            fsod: VariantConfig::new(true, "fsod"),
            gfsod: VariantConfig::new(true, "gfsod"),
            complete: VariantConfig::new(false, "complete"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialVariants {
    fsod: PartialVariant,
    gfsod: PartialVariant,
    complete: PartialVariant,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialVariant {
    enabled: Option<bool>,
    setting: Option<String>,
    surgery: Option<SurgeryMethod>,
}

impl PartialVariant {
    fn merge_into(self, target: &mut VariantConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(setting) = self.setting {
            target.setting = setting;
        }
        if let Some(surgery) = self.surgery {
            target.surgery = surgery;
        }
    }
}

impl From<PartialVariants> for VariantsConfig {
    fn from(partial: PartialVariants) -> Self {
        let mut config = Self::default();
        partial.fsod.merge_into(&mut config.fsod);
        partial.gfsod.merge_into(&mut config.gfsod);
        partial.complete.merge_into(&mut config.complete);
        config
    }
}

/// Settings for one fine-tuning loop.
#[derive(Debug, Clone, Serialize)]
pub struct VariantConfig {
    pub enabled: bool,

    /// Setting name passed to the config generator.
    pub setting: String,

    /// Surgery output this variant fine-tunes from.
    pub surgery: SurgeryMethod,
}

impl VariantConfig {
    pub fn new(enabled: bool, setting: impl Into<String>) -> Self {
        Self {
            enabled,
            setting: setting.into(),
            surgery: SurgeryMethod::Randinit,
        }
    }
}

/// Checkpoint locations. Values are templates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightsConfig {
    /// Detectron-format ImageNet backbone used for base training.
    pub imagenet_pretrain: String,

    /// Torchvision ImageNet backbone used by the calibration module at test time.
    pub imagenet_pretrain_torch: String,

    /// Provided random-init surgery checkpoint.
    pub randinit: String,

    /// Cached base checkpoint restored when base training is skipped.
    pub base_cache: String,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            imagenet_pretrain: "ImageNetPretrained/MSRA/R-101.pkl".to_string(),
            imagenet_pretrain_torch: "ImageNetPretrained/torchvision/resnet101-5d3b4d8f.pth".to_string(),
            randinit: "{{save_dir}}/provided/{{dataset}}_split{{split}}_model_reset_surgery.pth".to_string(),
            base_cache: "{{save_dir}}/cache/{{dataset}}_split{{split}}_model_final.pth".to_string(),
        }
    }
}

/// External programs, resolved relative to the working directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgramsConfig {
    /// Interpreter every script is launched with.
    pub interpreter: String,
    pub train: String,
    pub surgery: String,
    pub create_config: String,
    pub extract_results: String,
    pub sampler: String,

    /// Per-invocation time limit; unset means wait forever.
    pub timeout_ms: Option<u64>,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            train: "main.py".to_string(),
            surgery: "tools/model_surgery.py".to_string(),
            create_config: "tools/create_config.py".to_string(),
            extract_results: "tools/extract_results.py".to_string(),
            sampler: "tools/sample_splits.py".to_string(),
            timeout_ms: None,
        }
    }
}

/// Path templates. `variant_dir` is rendered before `run_dir`, so `run_dir`
/// may reference `{{variant_dir}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub config_root: String,
    pub base_config: String,
    pub base_output_dir: String,
    pub finetune_config: String,
    pub variant_dir: String,
    pub run_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            config_root: "configs/{{dataset}}".to_string(),
            base_config: "{{config_root}}/defrcn_det_r101_base{{split}}.yaml".to_string(),
            base_output_dir: "{{save_dir}}/{{dataset}}/{{experiment}}/defrcn_det_r101_base{{split}}".to_string(),
            finetune_config: "{{config_root}}/defrcn_{{setting}}_r101_novel{{split}}_{{shot}}shot_seed{{seed}}.yaml"
                .to_string(),
            variant_dir: "{{save_dir}}/{{dataset}}/{{experiment}}/defrcn_{{setting}}_r101_novel{{split}}/tfa-like"
                .to_string(),
            run_dir: "{{variant_dir}}/{{shot}}shot_seed{{seed}}".to_string(),
        }
    }
}

/// Split sampler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of source seeds sampled from.
    pub seed_count: u32,

    /// Generated split `i` is written as seed `seed_offset + i`.
    pub seed_offset: u32,

    /// Directory holding `seed<N>` split dirs.
    pub split_dir: String,

    /// Directory the zip archive is written into.
    pub archive_dir: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed_count: 10,
            seed_offset: 10,
            split_dir: "datasets/{{dataset}}split".to_string(),
            archive_dir: PathBuf::from("datasets/generated_splits"),
        }
    }
}
