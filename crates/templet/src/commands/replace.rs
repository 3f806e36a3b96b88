//! Replace command - repoint `origin` of every repository in the working directory

use anyhow::{Context, Result};
use camino::Utf8PathBuf;

use crate::cli::ReplaceArgs;
use crate::commands::ensure_git;
use crate::context::AppContext;
use crate::output;

pub async fn run(args: ReplaceArgs, ctx: &AppContext) -> Result<()> {
    ensure_git()?;

    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| anyhow::anyhow!("Working directory is not UTF-8: {:?}", p))?;

    let summary = ctx.remotes().replace_origins(&cwd, &args.prefix).await?;

    for repo in &summary.repositories {
        match &repo.error {
            None => output::success(&format!("{} -> {}", repo.name, repo.new_url)),
            Some(error) => output::error(&format!("{}: {}", repo.name, error)),
        }
    }

    output::header("Summary");
    output::kv("Total", &summary.total().to_string());
    output::kv("Succeeded", &summary.succeeded().to_string());
    output::kv("Failed", &summary.failed().to_string());
    Ok(())
}
