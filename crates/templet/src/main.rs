//! templet CLI - project scaffolding, proxied cloning, and port cleanup
//!
//! This is the main entry point for the templet command-line interface.

mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use context::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    let ctx = AppContext::load(cli.config.as_deref(), cli.no_proxy, cli.quiet)?;

    // Run command
    match cli.command {
        Commands::Clone(args) => commands::clone::run(args, &ctx).await,
        Commands::Create(args) => commands::create::run(args, &ctx).await,
        Commands::List(args) => commands::list::run(args, &ctx).await,
        Commands::Kill(args) => commands::kill::run(args, &ctx).await,
        Commands::Replace(args) => commands::replace::run(args, &ctx).await,
        Commands::Update(args) => commands::update::run(args, &ctx).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Warnings only by default; the commands print their own progress
            // Use -v/-vv for more detail
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
