//! Per-invocation state shared by the command handlers

use crate::output;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use templet_core::{CommandRunner, ConfigLoader, SystemRunner, TempletConfig};
use templet_projects::git::{FetchSettings, GitFetchEngine, RemoteManager};
use templet_projects::{DependencyInstaller, InstallSettings, ProxyPolicy, RegistryLoader};
use templet_update::{ReleaseChecker, SelfInstaller};
use tracing::debug;

/// Resolved configuration plus the command runner
pub struct AppContext {
    pub config: TempletConfig,
    pub cache_dir: Utf8PathBuf,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppContext {
    /// Load configuration and apply the global CLI flags on top
    pub fn load(config_file: Option<&Utf8Path>, no_proxy: bool, quiet: bool) -> Result<Self> {
        let mut loader = ConfigLoader::new().context("Could not locate the templet config directory")?;
        if let Some(file) = config_file {
            loader = loader.with_file(file);
        }

        let config = loader.load().context("Failed to load configuration")?;
        debug!(
            "Loaded configuration from {} (proxy {})",
            loader.config_dir(),
            if config.proxy.enabled { "enabled" } else { "disabled" }
        );
        Ok(Self::with_config(
            apply_flags(config, no_proxy, quiet),
            loader.cache_dir(),
            Arc::new(SystemRunner::new()),
        ))
    }

    pub fn with_config(
        config: TempletConfig,
        cache_dir: Utf8PathBuf,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            cache_dir,
            runner,
        }
    }

    /// Fetch engine that prints the proxy fallback as a warning line
    pub fn fetch_engine(&self) -> GitFetchEngine {
        GitFetchEngine::new(
            Arc::clone(&self.runner),
            ProxyPolicy::from_config(&self.config.proxy),
            FetchSettings::from_config(&self.config.fetch),
        )
        .with_fallback_notice(Arc::new(|msg: &str| output::warning(msg)))
    }

    pub fn registry_loader(&self, offline: bool) -> RegistryLoader {
        RegistryLoader::new(self.config.registry.clone(), &self.cache_dir).offline(offline)
    }

    pub fn remotes(&self) -> RemoteManager {
        RemoteManager::new(Arc::clone(&self.runner))
    }

    /// Dependency installer sharing the fetch progress switch
    pub fn installer(&self) -> DependencyInstaller {
        DependencyInstaller::new(
            Arc::clone(&self.runner),
            InstallSettings::from_config(&self.config.install, self.config.fetch.progress),
        )
    }

    pub fn release_checker(&self) -> Result<ReleaseChecker> {
        ReleaseChecker::new(self.config.update.clone())
            .context("Failed to set up the release check")
    }

    pub fn self_installer(&self) -> SelfInstaller {
        SelfInstaller::new(Arc::clone(&self.runner))
    }
}

/// CLI flags override every other configuration layer
fn apply_flags(mut config: TempletConfig, no_proxy: bool, quiet: bool) -> TempletConfig {
    if no_proxy {
        config.proxy.enabled = false;
    }
    if quiet {
        config.fetch.progress = false;
    }
    config
}
