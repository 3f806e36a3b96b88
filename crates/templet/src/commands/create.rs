//! Create command - scaffold a project from a template

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use templet_projects::templates::{rewrite_package_json, ManifestEdits};
use templet_projects::{DependencyInstaller, Error};

use crate::cli::CreateArgs;
use crate::commands::{ensure_git, list};
use crate::context::AppContext;
use crate::output;

pub async fn run(args: CreateArgs, ctx: &AppContext) -> Result<()> {
    let project = project_dir(&args.project)?;

    let spinner = output::spinner("Loading template list...");
    let registry = ctx
        .registry_loader(args.offline)
        .load()
        .await
        .context("Failed to load the template list")?;
    spinner.finish_and_clear();

    let Some(template) = registry.resolve(args.template.trim()) else {
        output::error(&format!(
            "Template '{}' does not exist, choose one of:",
            args.template
        ));
        list::print_table(&registry);
        return Err(Error::template_not_found(args.template.trim()).into());
    };

    if project.exists() {
        if !args.force {
            return Err(Error::repo_exists(project.as_str()).into());
        }
        output::warning(&format!("Removing existing {}", project));
        remove_path(&project).await?;
    }

    ensure_git()?;
    output::info(&format!(
        "Creating {} from template {}",
        project, template.name
    ));

    let report = ctx
        .fetch_engine()
        .fetch_ref(&template.source_url, &project, &template.checkout_ref)
        .await
        .with_context(|| format!("Failed to download template {}", template.name))?;

    if !args.keep_git {
        let git_dir = project.join(".git");
        if git_dir.is_dir() {
            tokio::fs::remove_dir_all(&git_dir)
                .await
                .with_context(|| format!("Failed to remove {}", git_dir))?;
        }
    }

    let package_name = project.file_name().unwrap_or(project.as_str());
    let edits = manifest_edits(&args, package_name, &template.name);
    if rewrite_package_json(&project, &edits)? {
        output::kv("package.json name", package_name);
    }

    output::done_in(&format!("Created {}", project), report.elapsed);
    output::kv("Template", &template.name);
    if !template.description.is_empty() {
        output::kv("Description", &template.description);
    }

    let installed = if should_install(&args, ctx, &project) {
        install_dependencies(ctx, &project).await
    } else {
        false
    };
    output::next_steps(&next_steps(
        &project,
        installed,
        &ctx.config.install.package_manager,
    ));
    Ok(())
}

fn manifest_edits(args: &CreateArgs, package_name: &str, template_name: &str) -> ManifestEdits {
    ManifestEdits::new(package_name)
        .renaming(template_name)
        .version(non_empty(&args.version))
        .description(non_empty(&args.description))
        .author(non_empty(&args.author))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn should_install(args: &CreateArgs, ctx: &AppContext, project: &Utf8Path) -> bool {
    !args.skip_install && ctx.config.install.enabled && DependencyInstaller::has_manifest(project)
}

/// A failed install leaves a usable project, so it only warns
async fn install_dependencies(ctx: &AppContext, project: &Utf8Path) -> bool {
    match ctx.installer().install(project).await {
        Ok(elapsed) => {
            output::done_in("Installed dependencies", elapsed);
            true
        }
        Err(e) => {
            output::warning(&e.to_string());
            output::warning("Install the dependencies manually");
            false
        }
    }
}

fn next_steps(project: &Utf8Path, installed: bool, package_manager: &str) -> Vec<String> {
    let mut steps = vec![format!("cd {}", project)];
    if !installed {
        steps.push(format!("{} install", package_manager));
    }
    steps.push(format!("{} run dev", package_manager));
    steps
}

/// Validate the project argument as a directory path
fn project_dir(project: &str) -> Result<Utf8PathBuf> {
    let project = project.trim();
    if project.is_empty() {
        return Err(Error::validation("Project name must not be empty").into());
    }
    let path = Utf8PathBuf::from(project);
    if path.file_name().is_none() {
        return Err(Error::validation(format!("Invalid project name: {}", project)).into());
    }
    Ok(path)
}

async fn remove_path(path: &Utf8Path) -> Result<()> {
    let result = if path.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.with_context(|| format!("Failed to remove {}", path))
}
