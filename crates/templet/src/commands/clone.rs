//! Clone command - fetch a repository through the proxy policy

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use templet_projects::git::{extract_repo_name, is_valid_repo_url};
use templet_projects::Error;

use crate::cli::CloneArgs;
use crate::commands::ensure_git;
use crate::context::AppContext;
use crate::output;

pub async fn run(args: CloneArgs, ctx: &AppContext) -> Result<()> {
    let url = args.url.trim();
    if url.is_empty() {
        return Err(Error::validation("Repository URL must not be empty").into());
    }
    if !is_valid_repo_url(url) {
        return Err(Error::invalid_repo_url(url).into());
    }

    let dest = match args.dest {
        Some(dest) => dest,
        None => Utf8PathBuf::from(extract_repo_name(url)?),
    };
    if dest.exists() {
        return Err(Error::repo_exists(dest.as_str()).into());
    }

    ensure_git()?;
    output::info(&format!("Cloning {} into {}", url, dest));

    let report = ctx
        .fetch_engine()
        .fetch(url, &dest)
        .await
        .with_context(|| format!("Failed to clone {}", url))?;

    output::done_in("Downloaded", report.elapsed);
    Ok(())
}
