//! In-memory runner that records invocations instead of spawning them.
//!
//! Used by tests to check which programs a pipeline would run, in what order,
//! and how it reacts to failures.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CommandSpec, ExitOutcome, ProcessRunner};
use crate::error::Result;

type Hook = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

/// Rule that makes matching invocations exit with a code.
#[derive(Debug, Clone)]
enum FailRule {
    /// Fail the n-th invocation (0-based)
    Call { index: usize, code: i32 },
    /// Fail every invocation with an argument containing the needle
    Contains { needle: String, code: i32 },
}

/// Records every command and returns scripted outcomes.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    rules: Vec<FailRule>,
    hook: Option<Hook>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th invocation (0-based) exit with `code`
    pub fn fail_on_call(mut self, index: usize, code: i32) -> Self {
        self.rules.push(FailRule::Call { index, code });
        self
    }

    /// Make every invocation whose program or args contain `needle` exit with `code`
    pub fn fail_when_contains(mut self, needle: impl Into<String>, code: i32) -> Self {
        self.rules.push(FailRule::Contains {
            needle: needle.into(),
            code,
        });
        self
    }

    /// Run `hook` on every invocation, e.g. to create the files a real program would write
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CommandSpec) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// All recorded invocations in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded invocations whose program or args contain `needle`
    pub fn calls_matching(&self, needle: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| matches(c, needle))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn outcome_for(&self, index: usize, command: &CommandSpec) -> ExitOutcome {
        for rule in &self.rules {
            match rule {
                FailRule::Call { index: i, code } if *i == index => return ExitOutcome::failure(*code),
                FailRule::Contains { needle, code } if matches(command, needle) => {
                    return ExitOutcome::failure(*code);
                }
                _ => {}
            }
        }
        ExitOutcome::success()
    }
}

fn matches(command: &CommandSpec, needle: &str) -> bool {
    command.program.contains(needle) || command.args.iter().any(|a| a.contains(needle))
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            calls.push(command.clone());
            calls.len() - 1
        };
        let outcome = self.outcome_for(index, command);
        if outcome.is_success()
            && let Some(hook) = &self.hook
        {
            hook(command);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_records_in_order() {
        let runner = RecordingRunner::new();
        runner.run(&CommandSpec::new("a")).await.unwrap();
        runner.run(&CommandSpec::new("b").arg("x")).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "a");
        assert_eq!(calls[1].args, vec!["x"]);
    }

    #[tokio::test]
    async fn test_fail_on_call() {
        let runner = RecordingRunner::new().fail_on_call(1, 7);
        assert!(runner.run(&CommandSpec::new("a")).await.unwrap().is_success());
        assert_eq!(runner.run(&CommandSpec::new("a")).await.unwrap().code, Some(7));
        assert!(runner.run(&CommandSpec::new("a")).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_fail_when_contains() {
        let runner = RecordingRunner::new().fail_when_contains("model_surgery", 2);
        let ok = runner.run(&CommandSpec::new("python3").arg("main.py")).await.unwrap();
        let bad = runner
            .run(&CommandSpec::new("python3").arg("tools/model_surgery.py"))
            .await
            .unwrap();
        assert!(ok.is_success());
        assert_eq!(bad.code, Some(2));
        assert_eq!(runner.calls_matching("surgery").len(), 1);
    }

    #[tokio::test]
    async fn test_hook_runs_only_on_success() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let runner = RecordingRunner::new()
            .fail_on_call(0, 1)
            .with_hook(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        runner.run(&CommandSpec::new("a")).await.unwrap();
        runner.run(&CommandSpec::new("a")).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(runner.call_count(), 2);
    }
}
