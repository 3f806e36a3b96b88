//! OS command dialects for port discovery and process termination
//!
//! One implementation per OS family, selected once with [`dialect_for`].

use std::collections::HashSet;
use std::sync::Arc;
use templet_core::{CommandResult, CommandSpec, OsFamily, ProcessRecord};

/// Stderr fragments meaning "nothing found" rather than a broken command
const ABSENCE_MARKERS: &[&str] = &["no such file", "not found", "warning"];

/// Commands and output parsing for one OS family
pub trait PortDialect: Send + Sync {
    /// Dialect name for logs
    fn name(&self) -> &'static str;

    /// Command listing the sockets bound to `port`
    fn discovery_command(&self, port: u16) -> CommandSpec;

    /// Parse discovery output into records deduplicated by process id
    fn parse_discovery(&self, output: &str, port: u16) -> Vec<ProcessRecord>;

    /// Command terminating one process
    fn kill_command(&self, pid: &str) -> CommandSpec;

    /// Command looking up a process name, when discovery does not report one
    fn name_lookup_command(&self, _pid: &str) -> Option<CommandSpec> {
        None
    }

    /// Parse the output of [`PortDialect::name_lookup_command`]
    fn parse_name_lookup(&self, _output: &str) -> Option<String> {
        None
    }

    /// Whether a finished discovery command actually failed
    ///
    /// A non-zero exit alone is not a failure: `lsof` exits 1 when nothing listens.
    fn discovery_failed(&self, result: &CommandResult) -> bool {
        if result.success() {
            return false;
        }
        let stderr = result.stderr.trim().to_lowercase();
        !stderr.is_empty() && !ABSENCE_MARKERS.iter().any(|m| stderr.contains(m))
    }
}

/// Select the dialect for an OS family
pub fn dialect_for(family: OsFamily) -> Arc<dyn PortDialect> {
    match family {
        OsFamily::MacOS | OsFamily::Linux => Arc::new(PosixDialect),
        OsFamily::Windows => Arc::new(WindowsDialect),
    }
}

/// `lsof` / `kill`
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixDialect;

impl PortDialect for PosixDialect {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn discovery_command(&self, port: u16) -> CommandSpec {
        CommandSpec::new("lsof")
            .arg("-i")
            .arg(format!(":{}", port))
            .args(["-P", "-n"])
    }

    fn parse_discovery(&self, output: &str, _port: u16) -> Vec<ProcessRecord> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        // COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME
        for line in output.lines().skip(1) {
            let mut fields = line.split_whitespace();
            let (Some(name), Some(pid)) = (fields.next(), fields.next()) else {
                continue;
            };
            if !is_pid(pid) || !seen.insert(pid.to_string()) {
                continue;
            }

            let mut record = ProcessRecord::new(name, pid).with_command(name);
            if let Some(user) = fields.next() {
                record = record.with_user(user);
            }
            records.push(record);
        }

        records
    }

    fn kill_command(&self, pid: &str) -> CommandSpec {
        CommandSpec::new("kill").arg(pid)
    }
}

/// `netstat` / `tasklist` / `taskkill`
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsDialect;

impl WindowsDialect {
    /// Name used until `tasklist` reports the real one
    pub fn placeholder_name(pid: &str) -> String {
        format!("PID-{}", pid)
    }
}

impl PortDialect for WindowsDialect {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn discovery_command(&self, _port: u16) -> CommandSpec {
        CommandSpec::new("netstat").args(["-ano", "-p", "TCP"])
    }

    /// netstat reports neither the image name nor the command line, so records carry the
    /// `PID-<pid>` placeholder name and `command: None`
    fn parse_discovery(&self, output: &str, port: u16) -> Vec<ProcessRecord> {
        let wanted = port.to_string();
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        //   Proto  Local Address          Foreign Address        State           PID
        //   TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       4242
        for line in output.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 || !fields[0].eq_ignore_ascii_case("TCP") {
                continue;
            }

            let local_port = fields[1].rsplit(':').next().unwrap_or_default();
            let pid = fields[fields.len() - 1];
            if local_port != wanted || !is_pid(pid) || !seen.insert(pid.to_string()) {
                continue;
            }

            records.push(ProcessRecord::new(Self::placeholder_name(pid), pid));
        }

        records
    }

    fn kill_command(&self, pid: &str) -> CommandSpec {
        CommandSpec::new("taskkill").args(["/F", "/PID", pid])
    }

    fn name_lookup_command(&self, pid: &str) -> Option<CommandSpec> {
        Some(CommandSpec::new("tasklist").args([
            "/FI".to_string(),
            format!("PID eq {}", pid),
            "/FO".into(),
            "CSV".into(),
            "/NH".into(),
        ]))
    }

    fn parse_name_lookup(&self, output: &str) -> Option<String> {
        // "node.exe","4242","Console","1","45,000 K"
        let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
        if line.starts_with("INFO:") {
            return None;
        }
        let name = line.split(',').next()?.trim().trim_matches('"').trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

fn is_pid(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSOF_OUTPUT: &str = "\
COMMAND   PID  USER   FD   TYPE DEVICE SIZE/OFF NODE NAME
node    12345 alice   23u  IPv4 0x1234      0t0  TCP *:8080 (LISTEN)
node    12345 alice   24u  IPv6 0x5678      0t0  TCP *:8080 (LISTEN)
python   6789   bob    3u  IPv4 0x9abc      0t0  TCP 127.0.0.1:8080->127.0.0.1:51234 (ESTABLISHED)
";

    const NETSTAT_OUTPUT: &str = "
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:3000           0.0.0.0:0              LISTENING       1111
  TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       4242
  TCP    [::]:8080              [::]:0                 LISTENING       4242
  TCP    127.0.0.1:8080         127.0.0.1:50000        ESTABLISHED     5353
  TCP    127.0.0.1:18080        0.0.0.0:0              LISTENING       9999
";

    #[test]
    fn test_posix_commands() {
        assert_eq!(
            PosixDialect.discovery_command(8080).to_string(),
            "lsof -i :8080 -P -n"
        );
        assert_eq!(PosixDialect.kill_command("42").to_string(), "kill 42");
        assert!(PosixDialect.name_lookup_command("42").is_none());
    }

    #[test]
    fn test_posix_parse_dedupes_by_pid() {
        let records = PosixDialect.parse_discovery(LSOF_OUTPUT, 8080);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].process_name, "node");
        assert_eq!(records[0].process_id, "12345");
        assert_eq!(records[0].user.as_deref(), Some("alice"));
        assert_eq!(records[1].process_id, "6789");
    }

    #[test]
    fn test_posix_parse_empty_output() {
        assert!(PosixDialect.parse_discovery("", 8080).is_empty());
        assert!(PosixDialect
            .parse_discovery("COMMAND PID USER\n", 8080)
            .is_empty());
    }

    #[test]
    fn test_windows_commands() {
        assert_eq!(
            WindowsDialect.discovery_command(8080).to_string(),
            "netstat -ano -p TCP"
        );
        assert_eq!(
            WindowsDialect.kill_command("4242").to_string(),
            "taskkill /F /PID 4242"
        );
        let lookup = WindowsDialect.name_lookup_command("4242").unwrap();
        assert_eq!(lookup.args, vec!["/FI", "PID eq 4242", "/FO", "CSV", "/NH"]);
    }

    #[test]
    fn test_windows_parse_filters_by_exact_port() {
        let mut records = WindowsDialect.parse_discovery(NETSTAT_OUTPUT, 8080);
        records.sort_by(|a, b| a.process_id.cmp(&b.process_id));

        let pids: Vec<&str> = records.iter().map(|r| r.process_id.as_str()).collect();
        assert_eq!(pids, vec!["4242", "5353"]);
        assert_eq!(records[0].process_name, "PID-4242");
        assert!(records.iter().all(|r| r.command.is_none() && r.user.is_none()));
    }

    #[test]
    fn test_windows_parse_other_port() {
        let records = WindowsDialect.parse_discovery(NETSTAT_OUTPUT, 3000);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].process_id, "1111");
    }

    #[test]
    fn test_windows_name_lookup_parsing() {
        assert_eq!(
            WindowsDialect
                .parse_name_lookup("\"node.exe\",\"4242\",\"Console\",\"1\",\"45,000 K\"\r\n"),
            Some("node.exe".to_string())
        );
        assert_eq!(
            WindowsDialect.parse_name_lookup(
                "INFO: No tasks are running which match the specified criteria.\r\n"
            ),
            None
        );
        assert_eq!(WindowsDialect.parse_name_lookup(""), None);
    }

    #[test]
    fn test_discovery_failure_classification() {
        let dialect = PosixDialect;

        assert!(!dialect.discovery_failed(&CommandResult::ok("")));
        assert!(!dialect.discovery_failed(&CommandResult::failed("", 1)));
        assert!(!dialect.discovery_failed(&CommandResult::failed(
            "lsof: WARNING: can't stat() fuse file system",
            1
        )));
        assert!(!dialect.discovery_failed(&CommandResult::failed("sh: lsof: not found", 127)));
        assert!(dialect.discovery_failed(&CommandResult::failed(
            "lsof: unacceptable port specification",
            1
        )));
    }

    #[test]
    fn test_dialect_for() {
        assert_eq!(dialect_for(OsFamily::Linux).name(), "posix");
        assert_eq!(dialect_for(OsFamily::MacOS).name(), "posix");
        assert_eq!(dialect_for(OsFamily::Windows).name(), "windows");
    }
}
