//! Sequential, fail-fast termination of port owners

use crate::dialect::{dialect_for, PortDialect};
use crate::error::{Error, Result};
use crate::resolver::parse_port;
use std::sync::Arc;
use templet_core::{CommandRunner, ExitCheck, OsFamily, ProcessRecord};
use tracing::{info, warn};

/// Processes terminated by one batch, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationReport {
    pub terminated: Vec<ProcessRecord>,
}

impl TerminationReport {
    pub fn is_empty(&self) -> bool {
        self.terminated.is_empty()
    }
}

/// Terminates process records one at a time
///
/// The first failure aborts the batch; later records are never attempted.
pub struct ProcessTerminator {
    runner: Arc<dyn CommandRunner>,
    dialect: Arc<dyn PortDialect>,
}

impl ProcessTerminator {
    pub fn new(runner: Arc<dyn CommandRunner>, dialect: Arc<dyn PortDialect>) -> Self {
        Self { runner, dialect }
    }

    /// Terminator for the running OS; fails on an unsupported family
    pub fn for_current_os(runner: Arc<dyn CommandRunner>) -> Result<Self> {
        Ok(Self::new(runner, dialect_for(OsFamily::current()?)))
    }

    pub async fn terminate(&self, records: &[ProcessRecord], port: &str) -> Result<TerminationReport> {
        let port = parse_port(port)?.to_string();
        let mut report = TerminationReport::default();

        if records.is_empty() {
            info!("Nothing to terminate on port {}", port);
            return Ok(report);
        }

        for record in records {
            let spec = self.dialect.kill_command(&record.process_id);
            let result = self
                .runner
                .run(&spec, ExitCheck::Tolerant)
                .await
                .map_err(|e| Error::kill(&record.process_id, &port, e.to_string()))?;

            if !result.success() {
                let stderr = result.stderr.trim();
                let message = if stderr.is_empty() {
                    format!("`{}` exited with {:?}", spec, result.exit_code)
                } else {
                    stderr.to_string()
                };
                warn!(
                    "Stopping after failing to terminate {} ({} already terminated)",
                    record,
                    report.terminated.len()
                );
                return Err(Error::kill(&record.process_id, &port, message));
            }

            info!("Terminated {} on port {}", record, port);
            report.terminated.push(record.clone());
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PosixDialect, WindowsDialect};
    use templet_core::testing::ScriptedRunner;
    use templet_core::CommandResult;

    #[tokio::test]
    async fn test_windows_uses_forced_kill() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(CommandResult::ok("SUCCESS"));

        let report = ProcessTerminator::new(runner.clone(), Arc::new(WindowsDialect))
            .terminate(&[ProcessRecord::new("node.exe", "4242")], "8080")
            .await
            .unwrap();

        assert_eq!(report.terminated.len(), 1);
        assert_eq!(runner.calls()[0].to_string(), "taskkill /F /PID 4242");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_kill_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_spawn_failure("No such file or directory");

        let err = ProcessTerminator::new(runner.clone(), Arc::new(PosixDialect))
            .terminate(&[ProcessRecord::new("node", "7")], "3000")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Kill { ref pid, ref port, .. } if pid == "7" && port == "3000"));
    }

    #[tokio::test]
    async fn test_invalid_port_is_rejected() {
        let runner = Arc::new(ScriptedRunner::new());
        let err = ProcessTerminator::new(runner.clone(), Arc::new(PosixDialect))
            .terminate(&[ProcessRecord::new("node", "7")], "99999")
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(runner.call_count(), 0);
    }
}
