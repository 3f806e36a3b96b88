//! Command handlers

pub mod clone;
pub mod create;
pub mod kill;
pub mod list;
pub mod replace;
pub mod update;

use anyhow::Result;

/// Fail early with a clear message when git is not installed
pub(crate) fn ensure_git() -> Result<()> {
    which::which("git").map_err(|_| templet_projects::Error::GitNotFound)?;
    Ok(())
}
