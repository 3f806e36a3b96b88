//! Git operations module
//!
//! - Resilient cloning through the accelerating proxy ([`GitFetchEngine`])
//! - Clone progress parsing
//! - Remote management for bulk `origin` replacement
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use camino::Utf8Path;
//! use templet_core::SystemRunner;
//! use templet_projects::git::RemoteManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remotes = RemoteManager::new(Arc::new(SystemRunner::new()));
//! let summary = remotes
//!     .replace_origins(Utf8Path::new("."), "https://git.example.com/team/")
//!     .await?;
//! println!("{} of {} updated", summary.succeeded(), summary.total());
//! # Ok(())
//! # }
//! ```

pub mod fetch;
pub mod remote;
pub mod stages;

pub use fetch::{FallbackNotice, FetchReport, FetchSettings, GitFetchEngine};
pub use remote::{
    find_git_repositories, normalize_remote_prefix, RemoteManager, RepoReplacement,
    ReplaceSummary,
};
pub use stages::{parse_progress_line, CloneStage};

use crate::error::{Error, Result};

/// Check if a URL looks like a git repository URL
pub fn is_valid_repo_url(url: &str) -> bool {
    url.starts_with("https://")
        || url.starts_with("http://")
        || url.starts_with("git@")
        || url.starts_with("ssh://")
}

/// Extract repository name from URL
///
/// # Examples
/// - https://github.com/user/repo.git -> repo
/// - git@github.com:user/repo.git -> repo
pub fn extract_repo_name(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    let name = url
        .rsplit(['/', ':'])
        .next()
        .ok_or_else(|| Error::invalid_repo_url(url))?
        .trim_end_matches(".git");

    if name.is_empty() {
        return Err(Error::invalid_repo_url(url));
    }

    Ok(name.to_string())
}
