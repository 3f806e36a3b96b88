//! Update command - check for and install a newer templet release

use anyhow::{Context, Result};
use dialoguer::Confirm;
use templet_update::{UpdateCheck, VERSION};

use crate::cli::UpdateArgs;
use crate::context::AppContext;
use crate::output;

/// Changelog lines shown before installing
const CHANGELOG_PREVIEW_LINES: usize = 10;

pub async fn run(args: UpdateArgs, ctx: &AppContext) -> Result<()> {
    output::info(&format!("Current version: {}", VERSION));

    let spinner = output::spinner("Checking for updates...");
    let check = ctx.release_checker()?.check(VERSION).await;
    spinner.finish_and_clear();
    let check = match check {
        Ok(check) => check,
        Err(templet_update::Error::Release { message }) => {
            output::warning(&format!("{}, skipping the version check", message));
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to check for updates"),
    };

    if !check.is_update_available() {
        output::success("Already on the latest version");
        return Ok(());
    }

    output::success(&format!("Update available: {}", describe(&check)));
    if let Some(preview) = check.release.changelog_preview(CHANGELOG_PREVIEW_LINES) {
        output::changelog(&preview);
    }

    if args.check {
        output::info("Run 'templet update' to install the update");
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Install templet {}?", check.latest))
            .default(false)
            .interact()?;
        if !confirmed {
            output::info("Update cancelled");
            return Ok(());
        }
    }

    which::which("cargo").context("cargo is required to install updates")?;

    let spinner = output::spinner(&format!("Installing templet {}...", check.latest));
    let installed = ctx.self_installer().install(&check.latest).await;
    spinner.finish_and_clear();
    installed.with_context(|| format!("Failed to install templet {}", check.latest))?;

    output::success(&format!("Updated templet {} -> {}", check.current, check.latest));
    Ok(())
}

fn describe(check: &UpdateCheck) -> String {
    match &check.release.html_url {
        Some(url) => format!("{} -> {} ({})", check.current, check.latest, url),
        None => format!("{} -> {}", check.current, check.latest),
    }
}
