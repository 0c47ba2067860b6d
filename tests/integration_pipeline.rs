//! Training pipeline integration tests
//!
//! Drives the full pipeline through a recording runner whose hook writes the
//! files the real framework would produce.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use fsod_runner::config::RunnerConfig;
use fsod_runner::domain::{Dataset, Variant};
use fsod_runner::error::{Result, RunnerError};
use fsod_runner::pipeline::{BaseOutcome, Experiment, TrainingPipeline};
use fsod_runner::process::{CommandSpec, RecordingRunner};
use tempfile::TempDir;

fn test_config(root: &Path) -> RunnerConfig {
    let mut config = RunnerConfig {
        save_dir: root.join("ckpt"),
        shots: vec![1, 2, 3],
        seeds: vec![0, 1],
        ..Default::default()
    };
    config.layout.config_root = root.join("configs").display().to_string();
    config
}

/// Simulates the framework: the generator writes a config, the trainer writes
/// its final checkpoint and a metrics file.
fn framework_hook(config_root: PathBuf) -> impl Fn(&CommandSpec) + Send + Sync + 'static {
    move |cmd: &CommandSpec| match cmd.args[0].as_str() {
        "tools/create_config.py" => {
            let name = format!(
                "defrcn_{}_r101_novel{}_{}shot_seed{}.yaml",
                cmd.arg_after("--setting").unwrap(),
                cmd.arg_after("--split").unwrap(),
                cmd.arg_after("--shot").unwrap(),
                cmd.arg_after("--seed").unwrap(),
            );
            fs::create_dir_all(&config_root).unwrap();
            fs::write(config_root.join(name), "generated").unwrap();
        }
        "main.py" => {
            let out = PathBuf::from(cmd.arg_after("OUTPUT_DIR").unwrap());
            fs::create_dir_all(&out).unwrap();
            fs::write(out.join("model_final.pth"), "weights").unwrap();
            fs::write(out.join("metrics.json"), "{}").unwrap();
        }
        _ => {}
    }
}

fn finetune_calls(runner: &RecordingRunner) -> Vec<CommandSpec> {
    runner
        .calls()
        .into_iter()
        .filter(|c| c.args[0] == "main.py" && c.has_arg("TEST.PCB_MODELPATH"))
        .collect()
}

#[tokio::test]
async fn test_one_training_run_per_shot_and_seed() -> Result<()> {
    let dir = TempDir::new()?;
    let exp = Experiment::new("exp", "1", Dataset::Voc, test_config(dir.path()))?;
    let pipeline = TrainingPipeline::new(RecordingRunner::new());

    let report = pipeline.run(&exp).await?;

    let calls = finetune_calls(pipeline.runner());
    assert_eq!(calls.len(), 2 * 3 * 2);

    let output_dirs: HashSet<String> = calls
        .iter()
        .map(|c| c.arg_after("OUTPUT_DIR").unwrap().to_string())
        .collect();
    assert_eq!(output_dirs.len(), calls.len());

    for variant in [Variant::Fsod, Variant::Gfsod] {
        assert_eq!(report.finetune_count(variant), 6);
        for shot in [1, 2, 3] {
            for seed in [0, 1] {
                let expected = exp.run_paths(variant, shot, seed)?.output_dir.display().to_string();
                assert!(output_dirs.contains(&expected), "missing run {}", expected);
            }
        }
    }
    assert_eq!(report.finetune_count(Variant::Complete), 0);
    Ok(())
}

#[tokio::test]
async fn test_cleanup_removes_config_and_final_checkpoint() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(dir.path());
    let config_root = dir.path().join("configs");
    let exp = Experiment::new("exp", "1", Dataset::Voc, config)?;
    let pipeline = TrainingPipeline::new(RecordingRunner::new().with_hook(framework_hook(config_root.clone())));

    let report = pipeline.run(&exp).await?;

    assert_eq!(report.files_removed, 2 * 12);
    for variant in [Variant::Fsod, Variant::Gfsod] {
        let paths = exp.run_paths(variant, 2, 1)?;
        assert!(!paths.config.exists());
        assert!(!paths.final_checkpoint().exists());
        assert!(paths.output_dir.join("metrics.json").exists());
    }
    Ok(())
}

#[tokio::test]
async fn test_keep_outputs_leaves_files() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(dir.path());
    config.stages.keep_outputs = true;
    let exp = Experiment::new("exp", "1", Dataset::Voc, config)?;
    let pipeline =
        TrainingPipeline::new(RecordingRunner::new().with_hook(framework_hook(dir.path().join("configs"))));

    let report = pipeline.run(&exp).await?;

    assert_eq!(report.files_removed, 0);
    let paths = exp.run_paths(Variant::Gfsod, 3, 0)?;
    assert!(paths.config.exists());
    assert!(paths.final_checkpoint().exists());
    Ok(())
}

#[tokio::test]
async fn test_skip_base_training_copies_cached_checkpoint() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(dir.path());
    config.stages.skip_base_training = true;
    let exp = Experiment::new("exp", "1", Dataset::Voc, config)?;

    let cached = exp.cached_base_checkpoint()?;
    fs::create_dir_all(cached.parent().unwrap())?;
    fs::write(&cached, "cached base weights")?;

    let pipeline = TrainingPipeline::new(RecordingRunner::new());
    let report = pipeline.run(&exp).await?;

    assert_eq!(report.base, Some(BaseOutcome::Restored));
    let base_config = exp.base_config()?.display().to_string();
    assert!(pipeline.runner().calls_matching(&base_config).is_empty());
    assert_eq!(fs::read_to_string(exp.base_checkpoint()?)?, "cached base weights");

    // Surgery still reads from where training would have written
    let surgery = pipeline.runner().calls_matching("model_surgery");
    assert_eq!(surgery.len(), 1);
    assert_eq!(
        surgery[0].arg_after("--src-path"),
        Some(exp.base_checkpoint()?.display().to_string().as_str())
    );
    Ok(())
}

#[tokio::test]
async fn test_skip_base_training_without_cache_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(dir.path());
    config.stages.skip_base_training = true;
    let exp = Experiment::new("exp", "1", Dataset::Voc, config)?;
    let pipeline = TrainingPipeline::new(RecordingRunner::new());

    let err = pipeline.run(&exp).await.unwrap_err();
    assert!(matches!(err, RunnerError::MissingCheckpoint(_)));
    assert_eq!(pipeline.runner().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_provided_randinit_replaces_surgery() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(dir.path());
    config.stages.use_provided_randinit = true;
    let exp = Experiment::new("exp", "1", Dataset::Voc, config)?;

    let provided = exp.provided_randinit()?;
    fs::create_dir_all(provided.parent().unwrap())?;
    fs::write(&provided, "randinit")?;

    let pipeline = TrainingPipeline::new(RecordingRunner::new());
    let report = pipeline.run(&exp).await?;

    assert!(report.provided_randinit);
    assert!(report.surgery_runs.is_empty());
    assert!(pipeline.runner().calls_matching("model_surgery").is_empty());

    let target = exp.surgery_checkpoint(fsod_runner::domain::SurgeryMethod::Randinit)?;
    assert_eq!(fs::read_to_string(&target)?, "randinit");
    let first = &finetune_calls(pipeline.runner())[0];
    assert_eq!(first.arg_after("MODEL.WEIGHTS"), Some(target.display().to_string().as_str()));
    Ok(())
}

#[tokio::test]
async fn test_failing_finetune_run_stops_pipeline() -> Result<()> {
    let dir = TempDir::new()?;
    let exp = Experiment::new("exp", "1", Dataset::Voc, test_config(dir.path()))?;
    let failing = exp.run_paths(Variant::Fsod, 2, 0)?.output_dir.display().to_string();
    let pipeline = TrainingPipeline::new(RecordingRunner::new().fail_when_contains(failing, 1));

    let err = pipeline.run(&exp).await.unwrap_err();
    assert!(matches!(err, RunnerError::CommandFailed { ref stage, .. } if stage == "fine-tuning"));
    assert!(pipeline.runner().calls_matching("extract_results").is_empty());
    assert!(pipeline.runner().calls_matching("gfsod").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_completeness_variant_only() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = test_config(dir.path());
    config.variants.fsod.enabled = false;
    config.variants.gfsod.enabled = false;
    config.variants.complete.enabled = true;
    config.trainer = Some("MEGA2Trainer".to_string());
    let exp = Experiment::new("exp", "1", Dataset::Voc, config)?;
    let pipeline = TrainingPipeline::new(RecordingRunner::new());

    let report = pipeline.run(&exp).await?;

    assert_eq!(report.finetune_count(Variant::Complete), 6);
    assert_eq!(report.results_extracted, vec![Variant::Complete]);
    let extract = pipeline.runner().calls_matching("extract_results");
    assert_eq!(
        extract[0].arg_after("--res-dir"),
        Some(exp.variant_dir(Variant::Complete)?.display().to_string().as_str())
    );
    Ok(())
}
