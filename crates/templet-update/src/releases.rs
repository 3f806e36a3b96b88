//! GitHub release lookup

use crate::error::{Error, Result};
use reqwest::header::ACCEPT;
use semver::Version;
use serde::Deserialize;
use std::time::Duration;
use templet_core::config::UpdateConfig;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("templet/", env!("CARGO_PKG_VERSION"));

/// Release information
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Release tag (e.g., "v0.5.0")
    pub tag_name: String,

    /// Release body (changelog)
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,
}

impl Release {
    /// Tag as a semantic version, leading `v` removed
    pub fn version(&self) -> Result<Version> {
        parse_version(&self.tag_name)
    }

    /// First lines of the changelog
    pub fn changelog_preview(&self, lines: usize) -> Option<String> {
        let body = self.body.as_deref()?.trim();
        if body.is_empty() {
            return None;
        }
        Some(body.lines().take(lines).collect::<Vec<_>>().join("\n"))
    }
}

/// Outcome of comparing the running version with the latest release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub current: Version,
    pub latest: Version,
    pub release: Release,
}

impl UpdateCheck {
    pub fn is_update_available(&self) -> bool {
        self.latest > self.current
    }
}

/// Parse a version or tag such as `v1.2.3`
pub fn parse_version(text: &str) -> Result<Version> {
    let trimmed = text.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|e| Error::invalid_version(trimmed, e))
}

/// The version of `tag` when it is strictly newer than `current`
pub fn newer_version(current: &str, tag: &str) -> Result<Option<Version>> {
    let current = parse_version(current)?;
    let latest = parse_version(tag)?;
    Ok((latest > current).then_some(latest))
}

/// Queries the latest published release
pub struct ReleaseChecker {
    client: reqwest::Client,
    config: UpdateConfig,
}

impl ReleaseChecker {
    pub fn new(config: UpdateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    fn latest_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.config.api_url.trim_end_matches('/'),
            self.config.repository.trim_matches('/')
        )
    }

    /// Get the latest release
    pub async fn latest(&self) -> Result<Release> {
        let url = self.latest_url();
        debug!("Fetching latest release from: {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::release(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response.json().await?)
    }

    /// Compare `current_version` with the latest release
    pub async fn check(&self, current_version: &str) -> Result<UpdateCheck> {
        let current = parse_version(current_version)?;
        let release = self.latest().await?;
        let latest = release.version()?;

        if latest > current {
            info!("Update available: {} -> {}", current, latest);
        } else {
            debug!("Already on latest version: {}", current);
        }
        Ok(UpdateCheck {
            current,
            latest,
            release,
        })
    }
}
