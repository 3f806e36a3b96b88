//! Git remote management operations
//!
//! Used by `templet replace <prefix>` to point the `origin` remote of every repository in a
//! directory at a new host.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::RegexBuilder;
use std::sync::{Arc, LazyLock};
use templet_core::{CommandRunner, CommandSpec, ExitCheck};
use tracing::{debug, info, warn};

static PREFIX_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^(https?://)?[\da-z.-]+\.[a-z.]{2,6}([/\w .-]*)*/?$")
        .case_insensitive(true)
        .build()
        .expect("remote prefix regex is valid")
});

/// Validate a remote prefix and normalize it to end with `/`
pub fn normalize_remote_prefix(prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(Error::validation("Remote prefix must not be empty"));
    }
    if !PREFIX_RE.is_match(prefix) {
        return Err(Error::validation(format!(
            "Invalid remote prefix: {}",
            prefix
        )));
    }

    if prefix.ends_with('/') {
        Ok(prefix.to_string())
    } else {
        Ok(format!("{}/", prefix))
    }
}

/// Non-hidden child directories of `dir` that contain a `.git` directory, sorted by name
pub fn find_git_repositories(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut repos = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let name = entry.file_name();
        if name.starts_with('.') || !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.path().join(".git").is_dir() {
            repos.push(entry.path().to_path_buf());
        }
    }
    repos.sort();
    Ok(repos)
}

/// Outcome of replacing the `origin` of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReplacement {
    pub name: String,
    pub new_url: String,
    /// Why the repository was not updated; `None` on success
    pub error: Option<String>,
}

impl RepoReplacement {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals of a bulk `origin` replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub repositories: Vec<RepoReplacement>,
}

impl ReplaceSummary {
    pub fn total(&self) -> usize {
        self.repositories.len()
    }

    pub fn succeeded(&self) -> usize {
        self.repositories.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

/// Runs git remote commands through a [`CommandRunner`]
pub struct RemoteManager {
    runner: Arc<dyn CommandRunner>,
}

impl RemoteManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// List all remotes in a repository as (name, fetch url)
    pub async fn list_remotes(&self, path: &Utf8Path) -> Result<Vec<(String, String)>> {
        debug!("Listing remotes in {}", path);

        let spec = git(path).args(["remote", "-v"]);
        let output = self.runner.run(&spec, ExitCheck::Tolerant).await?;
        if !output.success() {
            return Err(Error::git_operation(format!(
                "Failed to list remotes: {}",
                output.stderr.trim()
            )));
        }

        let mut remotes = Vec::new();
        for line in output.stdout.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                // Only keep fetch URLs (avoid duplicates)
                if parts.len() < 3 || parts[2] == "(fetch)" {
                    remotes.push((parts[0].to_string(), parts[1].to_string()));
                }
            }
        }

        Ok(remotes)
    }

    /// Get the URL of a remote; `None` when it does not exist
    pub async fn get_remote_url(&self, path: &Utf8Path, name: &str) -> Result<Option<String>> {
        let spec = git(path).args(["remote", "get-url", name]);
        let output = self.runner.run(&spec, ExitCheck::Tolerant).await?;
        if !output.success() {
            return Ok(None);
        }
        Ok(Some(output.stdout.trim().to_string()))
    }

    /// Remove a remote; a missing remote is not an error
    pub async fn remove_remote(&self, path: &Utf8Path, name: &str) -> Result<()> {
        let spec = git(path).args(["remote", "remove", name]);
        let output = self.runner.run(&spec, ExitCheck::Tolerant).await?;
        if !output.success() && !output.stderr.to_lowercase().contains("no such remote") {
            return Err(Error::git_operation(format!(
                "Failed to remove remote '{}': {}",
                name,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    pub async fn add_remote(&self, path: &Utf8Path, name: &str, url: &str) -> Result<()> {
        let spec = git(path).args(["remote", "add", name, url]);
        let output = self.runner.run(&spec, ExitCheck::Tolerant).await?;
        if !output.success() {
            return Err(Error::git_operation(format!(
                "Failed to add remote '{}': {}",
                name,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Point `origin` of one repository at `url` and verify the change
    pub async fn replace_origin(&self, path: &Utf8Path, url: &str) -> Result<()> {
        if self.list_remotes(path).await?.is_empty() {
            return Err(Error::git_operation("Repository has no remote"));
        }

        self.remove_remote(path, "origin").await?;
        self.add_remote(path, "origin", url).await?;

        match self.get_remote_url(path, "origin").await? {
            Some(actual) if actual == url => Ok(()),
            Some(actual) => Err(Error::git_operation(format!(
                "origin points at {} instead of {}",
                actual, url
            ))),
            None => Err(Error::git_operation("origin is missing after update")),
        }
    }

    /// Replace `origin` in every repository under `dir` with `<prefix><folder name>`
    ///
    /// Per-repository failures are recorded in the summary, not returned.
    pub async fn replace_origins(&self, dir: &Utf8Path, prefix: &str) -> Result<ReplaceSummary> {
        let prefix = normalize_remote_prefix(prefix)?;
        let repos = find_git_repositories(dir)?;
        if repos.is_empty() {
            return Err(Error::validation(format!(
                "No git repositories found in {}",
                dir
            )));
        }

        let mut summary = ReplaceSummary::default();
        for repo in repos {
            let name = repo.file_name().unwrap_or(repo.as_str()).to_string();
            let new_url = format!("{}{}", prefix, name);

            let error = match self.replace_origin(&repo, &new_url).await {
                Ok(()) => {
                    info!("Updated origin of {} to {}", name, new_url);
                    None
                }
                Err(err) => {
                    warn!("Could not update origin of {}: {}", name, err);
                    Some(err.to_string())
                }
            };
            summary.repositories.push(RepoReplacement {
                name,
                new_url,
                error,
            });
        }

        Ok(summary)
    }
}

fn git(path: &Utf8Path) -> CommandSpec {
    CommandSpec::new("git").current_dir(path)
}
