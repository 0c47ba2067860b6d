//! Summary of what a training run did.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{SurgeryMethod, Variant};

/// How the base checkpoint came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseOutcome {
    /// The trainer ran on the base classes
    Trained,
    /// A cached checkpoint was copied into place
    Restored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub base: Option<BaseOutcome>,
    /// Surgery methods the surgery tool was invoked for
    pub surgery_runs: Vec<SurgeryMethod>,
    /// Whether the provided random-init checkpoint replaced randinit surgery
    pub provided_randinit: bool,
    /// Trainer invocations per fine-tuning variant
    pub finetune_runs: HashMap<Variant, usize>,
    /// Generated configs and final checkpoints deleted after their run
    pub files_removed: usize,
    /// Variants whose results were extracted
    pub results_extracted: Vec<Variant>,
}

impl RunReport {
    pub fn record_finetune(&mut self, variant: Variant) {
        *self.finetune_runs.entry(variant).or_insert(0) += 1;
    }

    pub fn finetune_count(&self, variant: Variant) -> usize {
        self.finetune_runs.get(&variant).copied().unwrap_or(0)
    }

    pub fn total_finetune_runs(&self) -> usize {
        self.finetune_runs.values().sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            Some(BaseOutcome::Trained) => "trained",
            Some(BaseOutcome::Restored) => "restored from cache",
            None => "not run",
        };
        writeln!(f, "base: {}", base)?;
        let surgery: Vec<&str> = self.surgery_runs.iter().map(|m| m.as_str()).collect();
        write!(f, "surgery: [{}]", surgery.join(", "))?;
        if self.provided_randinit {
            write!(f, " (provided randinit)")?;
        }
        writeln!(f)?;
        for variant in Variant::ALL {
            if let Some(n) = self.finetune_runs.get(&variant) {
                writeln!(f, "{}: {} runs", variant, n)?;
            }
        }
        write!(
            f,
            "cleaned {} files, extracted results for {} variants",
            self.files_removed,
            self.results_extracted.len()
        )
    }
}
