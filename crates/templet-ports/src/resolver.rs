//! Discovery of the processes bound to a port

use crate::dialect::{dialect_for, PortDialect};
use crate::error::{Error, Result};
use std::sync::Arc;
use templet_core::{CommandRunner, ExitCheck, OsFamily, ProcessRecord};
use tracing::{debug, info};

/// Parse a port given as text; must be an integer in `1..=65535`
pub fn parse_port(port: &str) -> Result<u16> {
    let trimmed = port.trim();
    match trimmed.parse::<u16>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(Error::validation(format!(
            "Invalid port '{}': expected a number between 1 and 65535",
            trimmed
        ))),
    }
}

/// Resolves a port to the processes bound to it
pub struct PortProcessResolver {
    runner: Arc<dyn CommandRunner>,
    dialect: Arc<dyn PortDialect>,
}

impl PortProcessResolver {
    pub fn new(runner: Arc<dyn CommandRunner>, dialect: Arc<dyn PortDialect>) -> Self {
        Self { runner, dialect }
    }

    /// Resolver for the running OS; fails on an unsupported family
    pub fn for_current_os(runner: Arc<dyn CommandRunner>) -> Result<Self> {
        Ok(Self::new(runner, dialect_for(OsFamily::current()?)))
    }

    /// Processes bound to `port`, one record per process id
    ///
    /// Finding nothing is an empty list, not an error.
    pub async fn resolve_by_port(&self, port: &str) -> Result<Vec<ProcessRecord>> {
        let port = parse_port(port)?;
        let spec = self.dialect.discovery_command(port);
        debug!("Discovering processes on port {} ({})", port, self.dialect.name());

        let result = self.runner.run(&spec, ExitCheck::Tolerant).await?;
        if self.dialect.discovery_failed(&result) {
            return Err(templet_core::Error::command(
                spec.to_string(),
                result.exit_code,
                result.stderr.trim(),
            )
            .into());
        }

        let mut records = self.dialect.parse_discovery(&result.stdout, port);
        self.enrich_names(&mut records).await;

        info!("Found {} process(es) on port {}", records.len(), port);
        Ok(records)
    }

    /// Replace placeholder names where the dialect can look them up; failures keep the placeholder
    async fn enrich_names(&self, records: &mut [ProcessRecord]) {
        for record in records.iter_mut() {
            let Some(spec) = self.dialect.name_lookup_command(&record.process_id) else {
                continue;
            };

            match self.runner.run(&spec, ExitCheck::Tolerant).await {
                Ok(result) if result.success() => {
                    if let Some(name) = self.dialect.parse_name_lookup(&result.stdout) {
                        record.process_name = name;
                    }
                }
                Ok(result) => debug!(
                    "Name lookup for {} exited with {:?}",
                    record.process_id, result.exit_code
                ),
                Err(e) => debug!("Name lookup for {} failed: {}", record.process_id, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PosixDialect, WindowsDialect};
    use templet_core::testing::ScriptedRunner;
    use templet_core::CommandResult;

    fn resolver(runner: &Arc<ScriptedRunner>, dialect: Arc<dyn PortDialect>) -> PortProcessResolver {
        PortProcessResolver::new(runner.clone(), dialect)
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8080").unwrap(), 8080);
        assert_eq!(parse_port(" 1 ").unwrap(), 1);
        assert_eq!(parse_port("65535").unwrap(), 65535);
        assert!(parse_port("0").unwrap_err().is_validation());
        assert!(parse_port("65536").unwrap_err().is_validation());
        assert!(parse_port("http").unwrap_err().is_validation());
        assert!(parse_port("").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_invalid_port_runs_nothing() {
        let runner = Arc::new(ScriptedRunner::new());
        let err = resolver(&runner, Arc::new(PosixDialect))
            .resolve_by_port("abc")
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_nothing_listening_is_empty() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(CommandResult::failed("", 1));

        let records = resolver(&runner, Arc::new(PosixDialect))
            .resolve_by_port("8080")
            .await
            .unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_broken_discovery_is_command_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(CommandResult::failed("lsof: permission denied", 1));

        let err = resolver(&runner, Arc::new(PosixDialect))
            .resolve_by_port("8080")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Core(templet_core::Error::Command { exit_code: Some(1), .. })
        ));
    }

    #[tokio::test]
    async fn test_windows_names_are_enriched() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .push(CommandResult::ok(
                "  TCP    0.0.0.0:8080     0.0.0.0:0     LISTENING     4242\n\
                 \x20 TCP    0.0.0.0:8080     0.0.0.0:0     LISTENING     5353\n",
            ))
            .push(CommandResult::ok("\"node.exe\",\"4242\",\"Console\",\"1\",\"45,000 K\"\r\n"))
            .push(CommandResult::failed("ERROR: access denied", 1));

        let records = resolver(&runner, Arc::new(WindowsDialect))
            .resolve_by_port("8080")
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].process_name, "node.exe");
        assert_eq!(records[1].process_name, "PID-5353");
        assert_eq!(runner.call_count(), 3);
        assert_eq!(runner.calls()[1].program, "tasklist");
    }
}
