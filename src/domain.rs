//! Core domain types shared by the pipeline, sampler and configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Benchmark dataset family the external framework is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    #[default]
    Voc,
    Coco,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Voc => "voc",
            Dataset::Coco => "coco",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the surgery tool transforms the base checkpoint before fine-tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurgeryMethod {
    /// Re-initialize the novel-class predictor weights randomly
    #[default]
    Randinit,
    /// Drop the classifier layers entirely
    Remove,
}

impl SurgeryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurgeryMethod::Randinit => "randinit",
            SurgeryMethod::Remove => "remove",
        }
    }

    /// Checkpoint file name the surgery tool writes into its save dir.
    pub fn output_file(&self) -> &'static str {
        match self {
            SurgeryMethod::Randinit => "model_reset_surgery.pth",
            SurgeryMethod::Remove => "model_reset_remove.pth",
        }
    }
}

impl fmt::Display for SurgeryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the fine-tuning loops run after surgery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Few-shot detection, evaluated on novel classes only
    Fsod,
    /// Generalized few-shot detection, evaluated on base and novel classes
    Gfsod,
    /// All-class fine-tuning with base-memory replay
    Complete,
}

impl Variant {
    /// Execution order of the fine-tuning loops.
    pub const ALL: [Variant; 3] = [Variant::Fsod, Variant::Gfsod, Variant::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Fsod => "fsod",
            Variant::Gfsod => "gfsod",
            Variant::Complete => "complete",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
