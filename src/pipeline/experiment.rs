//! Experiment context: names, split, dataset, and every path derived from them.

use std::path::PathBuf;

use crate::config::RunnerConfig;
use crate::domain::{Dataset, SurgeryMethod, Variant};
use crate::error::{Result, RunnerError};
use crate::template::{TemplateRenderer, TemplateVars};

/// Checkpoint the trainer writes at the end of every run.
pub const FINAL_CHECKPOINT: &str = "model_final.pth";

/// Paths for a single (variant, shot, seed) fine-tuning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Config file the generator writes for this run
    pub config: PathBuf,
    /// Trainer output directory
    pub output_dir: PathBuf,
}

impl RunPaths {
    pub fn final_checkpoint(&self) -> PathBuf {
        self.output_dir.join(FINAL_CHECKPOINT)
    }
}

/// One experiment on one class split.
pub struct Experiment {
    name: String,
    split: String,
    dataset: Dataset,
    config: RunnerConfig,
    renderer: TemplateRenderer,
}

impl Experiment {
    /// Create an experiment context.
    ///
    /// The name and split become path segments, so they must be non-empty and
    /// free of path separators.
    pub fn new(
        name: impl Into<String>,
        split: impl Into<String>,
        dataset: Dataset,
        config: RunnerConfig,
    ) -> Result<Self> {
        let name = name.into();
        let split = split.into();
        validate_segment("experiment name", &name)?;
        validate_segment("split", &split)?;
        Ok(Self {
            name,
            split,
            dataset,
            config,
            renderer: TemplateRenderer::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn split(&self) -> &str {
        &self.split
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Variables shared by every template of this experiment.
    pub fn vars(&self) -> Result<TemplateVars> {
        let mut vars = TemplateVars::new()
            .with("experiment", &self.name)
            .with("split", &self.split)
            .with("dataset", self.dataset)
            .with("save_dir", self.config.save_dir.display());
        let config_root = self.renderer.render(&self.config.layout.config_root, &vars)?;
        vars.set("config_root", config_root);
        Ok(vars)
    }

    fn render_path(&self, template: &str, vars: &TemplateVars) -> Result<PathBuf> {
        self.renderer.render_path(template, vars)
    }

    pub fn config_root(&self) -> Result<PathBuf> {
        let vars = self.vars()?;
        Ok(PathBuf::from(vars.get("config_root").unwrap_or_default()))
    }

    /// Config file used for base training and sampling.
    pub fn base_config(&self) -> Result<PathBuf> {
        self.render_path(&self.config.layout.base_config, &self.vars()?)
    }

    pub fn base_output_dir(&self) -> Result<PathBuf> {
        self.render_path(&self.config.layout.base_output_dir, &self.vars()?)
    }

    pub fn base_checkpoint(&self) -> Result<PathBuf> {
        Ok(self.base_output_dir()?.join(FINAL_CHECKPOINT))
    }

    /// Where the fine-tuning variants read surgery output from.
    pub fn surgery_checkpoint(&self, method: SurgeryMethod) -> Result<PathBuf> {
        Ok(self.base_output_dir()?.join(method.output_file()))
    }

    pub fn imagenet_pretrain(&self) -> Result<PathBuf> {
        self.render_path(&self.config.weights.imagenet_pretrain, &self.vars()?)
    }

    pub fn imagenet_pretrain_torch(&self) -> Result<PathBuf> {
        self.render_path(&self.config.weights.imagenet_pretrain_torch, &self.vars()?)
    }

    pub fn provided_randinit(&self) -> Result<PathBuf> {
        self.render_path(&self.config.weights.randinit, &self.vars()?)
    }

    pub fn cached_base_checkpoint(&self) -> Result<PathBuf> {
        self.render_path(&self.config.weights.base_cache, &self.vars()?)
    }

    fn variant_vars(&self, variant: Variant) -> Result<TemplateVars> {
        let settings = self.config.variants.get(variant);
        Ok(self
            .vars()?
            .with("variant", variant)
            .with("setting", &settings.setting)
            .with("method", settings.surgery))
    }

    /// Directory holding every run of a variant; results are extracted from here.
    pub fn variant_dir(&self, variant: Variant) -> Result<PathBuf> {
        self.render_path(&self.config.layout.variant_dir, &self.variant_vars(variant)?)
    }

    pub fn run_paths(&self, variant: Variant, shot: u32, seed: u32) -> Result<RunPaths> {
        let variant_dir = self.variant_dir(variant)?;
        let vars = self
            .variant_vars(variant)?
            .with("variant_dir", variant_dir.display())
            .with("shot", shot)
            .with("seed", seed);
        Ok(RunPaths {
            config: self.render_path(&self.config.layout.finetune_config, &vars)?,
            output_dir: self.render_path(&self.config.layout.run_dir, &vars)?,
        })
    }

    /// Directory holding the `seed<N>` split dirs the sampler writes.
    pub fn split_dir(&self) -> Result<PathBuf> {
        self.render_path(&self.config.sampler.split_dir, &self.vars()?)
    }
}

fn validate_segment(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RunnerError::Config(format!("{} must not be empty", what)));
    }
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(RunnerError::Config(format!(
            "{} '{}' must not contain path separators",
            what, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment() -> Experiment {
        let config = RunnerConfig {
            save_dir: PathBuf::from("/ckpt"),
            ..Default::default()
        };
        Experiment::new("baseline", "1", Dataset::Voc, config).unwrap()
    }

    #[test]
    fn test_base_paths() {
        let exp = experiment();
        assert_eq!(
            exp.base_config().unwrap(),
            PathBuf::from("configs/voc/defrcn_det_r101_base1.yaml")
        );
        assert_eq!(
            exp.base_output_dir().unwrap(),
            PathBuf::from("/ckpt/voc/baseline/defrcn_det_r101_base1")
        );
        assert_eq!(
            exp.base_checkpoint().unwrap(),
            PathBuf::from("/ckpt/voc/baseline/defrcn_det_r101_base1/model_final.pth")
        );
    }

    #[test]
    fn test_surgery_checkpoint() {
        let exp = experiment();
        assert_eq!(
            exp.surgery_checkpoint(SurgeryMethod::Remove).unwrap(),
            PathBuf::from("/ckpt/voc/baseline/defrcn_det_r101_base1/model_reset_remove.pth")
        );
    }

    #[test]
    fn test_run_paths() {
        let exp = experiment();
        let paths = exp.run_paths(Variant::Gfsod, 5, 3).unwrap();
        assert_eq!(
            paths.config,
            PathBuf::from("configs/voc/defrcn_gfsod_r101_novel1_5shot_seed3.yaml")
        );
        assert_eq!(
            paths.output_dir,
            PathBuf::from("/ckpt/voc/baseline/defrcn_gfsod_r101_novel1/tfa-like/5shot_seed3")
        );
        assert_eq!(paths.final_checkpoint(), paths.output_dir.join("model_final.pth"));
    }

    #[test]
    fn test_weight_templates() {
        let exp = experiment();
        assert_eq!(
            exp.cached_base_checkpoint().unwrap(),
            PathBuf::from("/ckpt/cache/voc_split1_model_final.pth")
        );
        assert_eq!(
            exp.provided_randinit().unwrap(),
            PathBuf::from("/ckpt/provided/voc_split1_model_reset_surgery.pth")
        );
    }

    #[test]
    fn test_split_dir_per_dataset() {
        let exp = Experiment::new("e", "2", Dataset::Coco, RunnerConfig::default()).unwrap();
        assert_eq!(exp.split_dir().unwrap(), PathBuf::from("datasets/cocosplit"));
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(Experiment::new("", "1", Dataset::Voc, RunnerConfig::default()).is_err());
        assert!(Experiment::new("a/b", "1", Dataset::Voc, RunnerConfig::default()).is_err());
        assert!(Experiment::new("a", "..", Dataset::Voc, RunnerConfig::default()).is_err());
    }

    #[test]
    fn test_custom_layout_unknown_variable() {
        let mut config = RunnerConfig::default();
        config.layout.run_dir = "{{variant_dir}}/{{repeat}}".to_string();
        let exp = Experiment::new("e", "1", Dataset::Voc, config).unwrap();
        assert!(matches!(
            exp.run_paths(Variant::Fsod, 1, 0),
            Err(RunnerError::Template(_))
        ));
    }
}
