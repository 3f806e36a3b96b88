//! Reinstall templet through cargo

use crate::error::Result;
use semver::Version;
use std::sync::Arc;
use templet_core::{CommandRunner, CommandSpec, ExitCheck};
use tracing::info;

/// Package name on crates.io
const PACKAGE: &str = "templet";

/// Installs a released version with `cargo install`
pub struct SelfInstaller {
    runner: Arc<dyn CommandRunner>,
}

impl SelfInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub fn install_command(&self, version: &Version) -> CommandSpec {
        let version = version.to_string();
        CommandSpec::new("cargo").args([
            "install",
            PACKAGE,
            "--version",
            version.as_str(),
            "--locked",
        ])
    }

    /// Install `version`, replacing the running binary on disk
    pub async fn install(&self, version: &Version) -> Result<()> {
        let spec = self.install_command(version);
        info!("Installing templet {}: {}", version, spec);
        self.runner.run(&spec, ExitCheck::Strict).await?;
        info!("Installed templet {}", version);
        Ok(())
    }
}
