//! Dependency install for freshly created projects
//!
//! Package managers print nothing parseable as progress, so the line only ever shows the
//! simulated estimate until the command exits.

use crate::error::{Error, Result};
use crate::progress::ProgressTracker;
use camino::Utf8Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use templet_core::config::InstallConfig;
use templet_core::{CommandRunner, CommandSpec, ExitCheck};
use tracing::{debug, info};

/// Install tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    pub package_manager: String,
    /// `--registry` value; `None` keeps the package manager's own
    pub registry: Option<String>,
    pub tick_interval: Duration,
    pub show_progress: bool,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            package_manager: "npm".to_string(),
            registry: None,
            tick_interval: Duration::from_millis(300),
            show_progress: true,
        }
    }
}

impl InstallSettings {
    pub fn from_config(config: &InstallConfig, show_progress: bool) -> Self {
        let registry = config.registry.trim();
        Self {
            package_manager: config.package_manager.trim().to_string(),
            registry: (!registry.is_empty()).then(|| registry.to_string()),
            tick_interval: config.tick_interval(),
            show_progress,
        }
    }
}

/// Runs `<package manager> install` inside a project
pub struct DependencyInstaller {
    runner: Arc<dyn CommandRunner>,
    settings: InstallSettings,
}

impl DependencyInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: InstallSettings) -> Self {
        Self { runner, settings }
    }

    /// Whether `project_dir` has a manifest to install from
    pub fn has_manifest(project_dir: &Utf8Path) -> bool {
        project_dir.join("package.json").is_file()
    }

    pub fn install_command(&self, project_dir: &Utf8Path) -> CommandSpec {
        let mut spec = CommandSpec::new(program_name(&self.settings.package_manager))
            .arg("install")
            .current_dir(project_dir);
        if let Some(registry) = &self.settings.registry {
            spec = spec.args(["--registry", registry.as_str()]);
        }
        spec
    }

    /// Install dependencies; returns how long it took
    pub async fn install(&self, project_dir: &Utf8Path) -> Result<Duration> {
        if self.settings.package_manager.is_empty() {
            return Err(Error::validation("Package manager must not be empty"));
        }

        let spec = self.install_command(project_dir);
        info!("Installing dependencies in {}: {}", project_dir, spec);
        let started = Instant::now();

        let mut tracker = if self.settings.show_progress {
            ProgressTracker::new("Installing dependencies")
        } else {
            ProgressTracker::hidden()
        };
        tracker.start_ticker(self.settings.tick_interval);

        let result = self
            .runner
            .run(&spec, ExitCheck::Tolerant)
            .await
            .map_err(|e| Error::install(&self.settings.package_manager, e.to_string()))?;

        if !result.success() {
            drop(tracker);
            let stderr = result.stderr.trim();
            let message = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("`{}` exited with {:?}", spec, result.exit_code));
            return Err(Error::install(&self.settings.package_manager, message));
        }

        tracker.finish();
        let elapsed = started.elapsed();
        debug!("Dependencies installed in {:.2}s", elapsed.as_secs_f64());
        Ok(elapsed)
    }
}

/// Windows ships package managers as `.cmd` shims that process spawning does not resolve
fn program_name(package_manager: &str) -> String {
    if cfg!(windows) && !package_manager.contains('.') {
        format!("{}.cmd", package_manager)
    } else {
        package_manager.to_string()
    }
}
