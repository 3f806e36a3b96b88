//! External command execution
//!
//! Every OS tool the CLI drives (git, lsof, netstat, tasklist, kill, taskkill) goes through
//! [`CommandRunner`], which returns the same [`CommandResult`] shape regardless of the tool.

use crate::error::{Error, Result};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::fmt;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<Utf8PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of one finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    /// A zero-exit result with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", 0)
    }

    /// A non-zero result with the given stderr
    pub fn failed(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self::new("", stderr, exit_code)
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// What to do with a non-zero exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCheck {
    /// Non-zero exit becomes [`Error::Command`]
    Strict,
    /// Non-zero exit is returned as a plain result
    Tolerant,
}

/// Runs external programs
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture stdout/stderr
    async fn run(&self, spec: &CommandSpec, check: ExitCheck) -> Result<CommandResult>;

    /// Run to completion, handing every output line to `on_line` as it arrives
    ///
    /// Lines are split on `\n` and `\r`. The returned result still carries the full output.
    /// A non-zero exit is never an error here; callers inspect [`CommandResult::success`].
    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CommandResult>;
}

/// Apply an [`ExitCheck`] to a finished command
pub fn check_exit(
    spec: &CommandSpec,
    result: CommandResult,
    check: ExitCheck,
) -> Result<CommandResult> {
    if check == ExitCheck::Strict && !result.success() {
        return Err(Error::command(
            spec.to_string(),
            result.exit_code,
            result.stderr.trim(),
        ));
    }
    Ok(result)
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn spawn_error(spec: &CommandSpec, err: std::io::Error) -> Error {
        Error::command(spec.to_string(), None, err.to_string())
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, check: ExitCheck) -> Result<CommandResult> {
        debug!("Running: {}", spec);

        let output = Self::command(spec)
            .output()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        let result = CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!("`{}` exited with {:?}", spec.program, result.exit_code);

        check_exit(spec, result, check)
    }

    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CommandResult> {
        debug!("Running (streaming): {}", spec);

        let mut child = Self::command(spec)
            .spawn()
            .map_err(|e| Self::spawn_error(spec, e))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::command(spec.to_string(), None, "stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::command(spec.to_string(), None, "stderr was not captured"))?;

        let mut out_lines = LineSplitter::default();
        let mut err_lines = LineSplitter::default();
        let mut out_buf = [0u8; 4096];
        let mut err_buf = [0u8; 4096];
        let mut out_open = true;
        let mut err_open = true;

        while out_open || err_open {
            tokio::select! {
                read = stdout.read(&mut out_buf), if out_open => {
                    let n = read?;
                    if n == 0 {
                        out_open = false;
                        out_lines.finish(&mut *on_line);
                    } else {
                        out_lines.push(&out_buf[..n], &mut *on_line);
                    }
                }
                read = stderr.read(&mut err_buf), if err_open => {
                    let n = read?;
                    if n == 0 {
                        err_open = false;
                        err_lines.finish(&mut *on_line);
                    } else {
                        err_lines.push(&err_buf[..n], &mut *on_line);
                    }
                }
            }
        }

        // Both pipes hit EOF; release the handles before reaping the child.
        drop(stdout);
        drop(stderr);
        let status = child.wait().await?;
        debug!("`{}` exited with {:?}", spec.program, status.code());

        Ok(CommandResult {
            stdout: out_lines.into_text(),
            stderr: err_lines.into_text(),
            exit_code: status.code(),
        })
    }
}

/// Splits a byte stream into lines on `\n` and `\r`, keeping the full text
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
    text: Vec<u8>,
}

impl LineSplitter {
    pub fn push<F>(&mut self, bytes: &[u8], on_line: &mut F)
    where
        F: FnMut(&str) + ?Sized,
    {
        self.text.extend_from_slice(bytes);
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                self.flush(on_line);
            } else {
                self.pending.push(byte);
            }
        }
    }

    /// Emit whatever is left after the stream closed
    pub fn finish<F>(&mut self, on_line: &mut F)
    where
        F: FnMut(&str) + ?Sized,
    {
        self.flush(on_line);
    }

    pub fn into_text(self) -> String {
        String::from_utf8_lossy(&self.text).into_owned()
    }

    fn flush<F>(&mut self, on_line: &mut F)
    where
        F: FnMut(&str) + ?Sized,
    {
        if self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        on_line(&line);
    }
}
