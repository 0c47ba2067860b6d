//! Sampler options from the command line.

use crate::config::parse_list;
use crate::error::{Result, RunnerError};

/// What to sample and with which strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerOptions {
    /// Candidate images gathered per class before ranking (`-p`)
    pub pool_size: u32,
    /// Shot counts to write splits for (`-o`)
    pub output_sizes: Vec<u32>,
    /// Sampler class the external program instantiates (`-s`)
    pub sampler: String,
}

impl SamplerOptions {
    pub fn new(pool_size: u32, output_sizes: Vec<u32>, sampler: impl Into<String>) -> Result<Self> {
        let sampler = sampler.into().trim().to_string();
        if pool_size == 0 {
            return Err(RunnerError::Config("pool size (-p) must be at least 1".to_string()));
        }
        if output_sizes.is_empty() {
            return Err(RunnerError::Config("output sizes (-o) must not be empty".to_string()));
        }
        if let Some(bad) = output_sizes.iter().find(|&&s| s > pool_size) {
            return Err(RunnerError::Config(format!(
                "output size {} exceeds pool size {}",
                bad, pool_size
            )));
        }
        if sampler.is_empty() {
            return Err(RunnerError::Config("sampler class (-s) must not be empty".to_string()));
        }
        if sampler.contains(|c: char| c == '/' || c == '\\' || c.is_whitespace()) {
            return Err(RunnerError::Config(format!("invalid sampler class name '{}'", sampler)));
        }
        Ok(Self {
            pool_size,
            output_sizes,
            sampler,
        })
    }

    /// Parse `-o` given as a space or comma separated list.
    pub fn parse(pool_size: u32, output_sizes: &str, sampler: &str) -> Result<Self> {
        Self::new(pool_size, parse_list("-o", output_sizes)?, sampler)
    }
}
