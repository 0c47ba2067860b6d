//! Command lines for the external framework's entry points.

use std::path::Path;

use crate::config::ProgramsConfig;
use crate::domain::{Dataset, SurgeryMethod};
use crate::process::CommandSpec;

fn script(programs: &ProgramsConfig, script: &str) -> CommandSpec {
    CommandSpec::new(&programs.interpreter).arg(script)
}

/// Training entry point. `opts` are appended after `--opts` as key/value pairs.
pub fn train(programs: &ProgramsConfig, num_gpus: u32, config_file: &Path, opts: &[(&str, String)]) -> CommandSpec {
    let mut cmd = script(programs, &programs.train)
        .arg("--num-gpus")
        .arg(num_gpus.to_string())
        .arg("--config-file")
        .path_arg(config_file);
    if !opts.is_empty() {
        cmd = cmd.arg("--opts");
        for (key, value) in opts {
            cmd = cmd.arg(*key).arg(value.clone());
        }
    }
    cmd
}

pub fn surgery(
    programs: &ProgramsConfig,
    dataset: Dataset,
    method: SurgeryMethod,
    src: &Path,
    save_dir: &Path,
) -> CommandSpec {
    script(programs, &programs.surgery)
        .args(["--dataset", dataset.as_str(), "--method", method.as_str()])
        .arg("--src-path")
        .path_arg(src)
        .arg("--save-dir")
        .path_arg(save_dir)
}

/// Arguments identifying one generated fine-tuning config.
pub struct ConfigRequest<'a> {
    pub dataset: Dataset,
    pub config_root: &'a Path,
    pub shot: u32,
    pub seed: u32,
    pub setting: &'a str,
    pub split: &'a str,
}

pub fn create_config(programs: &ProgramsConfig, req: &ConfigRequest<'_>) -> CommandSpec {
    script(programs, &programs.create_config)
        .args(["--dataset", req.dataset.as_str()])
        .arg("--config_root")
        .path_arg(req.config_root)
        .args(["--shot".to_string(), req.shot.to_string()])
        .args(["--seed".to_string(), req.seed.to_string()])
        .args(["--setting", req.setting])
        .args(["--split", req.split])
}

pub fn extract_results(programs: &ProgramsConfig, res_dir: &Path, shots: &[u32]) -> CommandSpec {
    script(programs, &programs.extract_results)
        .arg("--res-dir")
        .path_arg(res_dir)
        .arg("--shot-list")
        .args(shots.iter().map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_train_with_opts() {
        let programs = ProgramsConfig::default();
        let cmd = train(
            &programs,
            8,
            &PathBuf::from("configs/voc/base1.yaml"),
            &[("MODEL.WEIGHTS", "R-101.pkl".to_string()), ("OUTPUT_DIR", "out".to_string())],
        );
        assert_eq!(cmd.program, "python3");
        assert_eq!(
            cmd.args,
            vec![
                "main.py",
                "--num-gpus",
                "8",
                "--config-file",
                "configs/voc/base1.yaml",
                "--opts",
                "MODEL.WEIGHTS",
                "R-101.pkl",
                "OUTPUT_DIR",
                "out"
            ]
        );
    }

    #[test]
    fn test_train_without_opts() {
        let cmd = train(&ProgramsConfig::default(), 1, &PathBuf::from("c.yaml"), &[]);
        assert!(!cmd.has_arg("--opts"));
    }

    #[test]
    fn test_surgery() {
        let cmd = surgery(
            &ProgramsConfig::default(),
            Dataset::Coco,
            SurgeryMethod::Remove,
            &PathBuf::from("base/model_final.pth"),
            &PathBuf::from("base"),
        );
        assert_eq!(cmd.args[0], "tools/model_surgery.py");
        assert_eq!(cmd.arg_after("--dataset"), Some("coco"));
        assert_eq!(cmd.arg_after("--method"), Some("remove"));
        assert_eq!(cmd.arg_after("--src-path"), Some("base/model_final.pth"));
        assert_eq!(cmd.arg_after("--save-dir"), Some("base"));
    }

    #[test]
    fn test_create_config() {
        let root = PathBuf::from("configs/voc");
        let cmd = create_config(
            &ProgramsConfig::default(),
            &ConfigRequest {
                dataset: Dataset::Voc,
                config_root: &root,
                shot: 10,
                seed: 4,
                setting: "gfsod",
                split: "3",
            },
        );
        assert_eq!(cmd.arg_after("--config_root"), Some("configs/voc"));
        assert_eq!(cmd.arg_after("--shot"), Some("10"));
        assert_eq!(cmd.arg_after("--seed"), Some("4"));
        assert_eq!(cmd.arg_after("--setting"), Some("gfsod"));
        assert_eq!(cmd.arg_after("--split"), Some("3"));
    }

    #[test]
    fn test_extract_results_shot_list() {
        let cmd = extract_results(&ProgramsConfig::default(), &PathBuf::from("res"), &[1, 2, 3]);
        let tail: Vec<&str> = cmd.args.iter().rev().take(3).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["1", "2", "3"]);
    }
}
