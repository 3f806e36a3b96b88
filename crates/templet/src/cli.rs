//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// templet - scaffold projects, clone repositories, free busy ports
#[derive(Parser, Debug)]
#[command(name = "templet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a config file (replaces ~/.templet/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Never route git through the accelerating proxy
    #[arg(long, global = true)]
    pub no_proxy: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone a repository through the proxy, falling back to a direct clone
    Clone(CloneArgs),

    /// Create a project from a template
    Create(CreateArgs),

    /// List available templates
    List(ListArgs),

    /// Terminate the processes listening on a port
    Kill(KillArgs),

    /// Point the origin remote of every repository in this directory at a new host
    Replace(ReplaceArgs),

    /// Check for a newer templet release and install it
    Update(UpdateArgs),
}

// Clone command
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Repository URL
    pub url: String,

    /// Destination directory (defaults to the repository name)
    pub dest: Option<Utf8PathBuf>,
}

// Create command
#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct CreateArgs {
    /// Template name (see `templet list`)
    pub template: String,

    /// Project directory to create
    pub project: String,

    /// Remove an existing project directory first
    #[arg(short, long)]
    pub force: bool,

    /// Keep the template's git history
    #[arg(long)]
    pub keep_git: bool,

    /// Use the cached or built-in template list only
    #[arg(long)]
    pub offline: bool,

    /// Version written to package.json
    #[arg(long)]
    pub version: Option<String>,

    /// Description written to package.json
    #[arg(long)]
    pub description: Option<String>,

    /// Author written to package.json
    #[arg(long)]
    pub author: Option<String>,

    /// Do not install dependencies after creating the project
    #[arg(long)]
    pub skip_install: bool,
}

// List command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Use the cached or built-in template list only
    #[arg(long)]
    pub offline: bool,
}

// Kill command
#[derive(Args, Debug)]
pub struct KillArgs {
    /// Port number
    pub port: String,

    /// Show the processes without terminating them
    #[arg(long)]
    pub dry_run: bool,
}

// Replace command
#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// New remote prefix, e.g. https://git.example.com/team/
    pub prefix: String,
}

// Update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Only check for a newer release
    #[arg(long)]
    pub check: bool,

    /// Install without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}
