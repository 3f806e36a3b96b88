//! Test-only command runner that replays scripted results.

use crate::error::{Error, Result};
use crate::exec::{check_exit, CommandResult, CommandRunner, CommandSpec, ExitCheck};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Scripted {
    Finished(CommandResult),
    SpawnFailure(String),
}

/// A [`CommandRunner`] that records every invocation and answers from a queue.
///
/// Streaming calls feed the scripted stderr (then stdout) to the line callback,
/// split the same way the real runner splits them. An exhausted queue is a spawn failure.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next command
    pub fn push(&self, result: CommandResult) -> &Self {
        self.lock_responses().push_back(Scripted::Finished(result));
        self
    }

    /// Queue a spawn failure (program missing, permission denied...)
    pub fn push_spawn_failure(&self, message: impl Into<String>) -> &Self {
        self.lock_responses()
            .push_back(Scripted::SpawnFailure(message.into()));
        self
    }

    /// Every command issued so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next(&self, spec: &CommandSpec) -> Result<CommandResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        match self.lock_responses().pop_front() {
            Some(Scripted::Finished(result)) => Ok(result),
            Some(Scripted::SpawnFailure(message)) => {
                Err(Error::command(spec.to_string(), None, message))
            }
            None => Err(Error::command(
                spec.to_string(),
                None,
                "no scripted response left",
            )),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec, check: ExitCheck) -> Result<CommandResult> {
        let result = self.next(spec)?;
        check_exit(spec, result, check)
    }

    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CommandResult> {
        let result = self.next(spec)?;
        for line in result
            .stderr
            .split(['\n', '\r'])
            .chain(result.stdout.split(['\n', '\r']))
            .filter(|line| !line.is_empty())
        {
            on_line(line);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_replays_in_order() {
        let runner = ScriptedRunner::new();
        runner
            .push(CommandResult::ok("first"))
            .push(CommandResult::failed("second", 1));

        let a = runner
            .run(&CommandSpec::new("a"), ExitCheck::Tolerant)
            .await
            .unwrap();
        let b = runner
            .run(&CommandSpec::new("b"), ExitCheck::Strict)
            .await;

        assert_eq!(a.stdout, "first");
        assert!(b.is_err());
        assert_eq!(runner.call_count(), 2);
        assert_eq!(runner.calls()[1].program, "b");
    }

    #[tokio::test]
    async fn test_scripted_runner_streams_lines() {
        let runner = ScriptedRunner::new();
        runner.push(CommandResult::new("", "one\rtwo\nthree\n", 0));

        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());
        runner
            .run_streaming(&CommandSpec::new("git"), &mut sink)
            .await
            .unwrap();

        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_streaming_through_trait_object() {
        let runner = ScriptedRunner::new();
        runner.push(CommandResult::new("done\n", "Receiving objects:  10%\r", 0));
        let runner: &dyn CommandRunner = &runner;

        let mut longest = 0;
        let mut lines = Vec::new();
        let mut sink = |line: &str| {
            longest = longest.max(line.len());
            lines.push(line.to_owned());
        };
        let result = runner
            .run_streaming(&CommandSpec::new("git"), &mut sink)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(lines, vec!["Receiving objects:  10%", "done"]);
        assert_eq!(longest, "Receiving objects:  10%".len());
    }

    #[tokio::test]
    async fn test_scripted_runner_exhausted_queue_fails() {
        let runner = ScriptedRunner::new();
        let err = runner
            .run(&CommandSpec::new("kill"), ExitCheck::Tolerant)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command { exit_code: None, .. }));
    }
}
