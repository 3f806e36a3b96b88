//! Kill command - terminate the processes listening on a port

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};
use templet_core::ProcessRecord;
use templet_ports::{PortProcessResolver, ProcessTerminator};

use crate::cli::KillArgs;
use crate::context::AppContext;
use crate::output;

#[derive(Tabled)]
struct ProcessRow {
    pid: String,
    name: String,
    user: String,
}

impl From<&ProcessRecord> for ProcessRow {
    fn from(record: &ProcessRecord) -> Self {
        Self {
            pid: record.process_id.clone(),
            name: record.process_name.clone(),
            user: record.user.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn run(args: KillArgs, ctx: &AppContext) -> Result<()> {
    let port = args.port.trim();
    let resolver = PortProcessResolver::for_current_os(ctx.runner.clone())?;

    let spinner = output::spinner(&format!("Looking for processes on port {}...", port));
    let records = resolver.resolve_by_port(port).await;
    spinner.finish_and_clear();
    let records = records?;

    if records.is_empty() {
        output::info(&format!("Nothing to terminate on port {}", port));
        return Ok(());
    }

    output::header(&format!("Processes on port {}", port));
    let rows: Vec<ProcessRow> = records.iter().map(ProcessRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    if args.dry_run {
        output::info("Dry run, nothing terminated");
        return Ok(());
    }

    let terminator = ProcessTerminator::for_current_os(ctx.runner.clone())?;
    let report = terminator.terminate(&records, port).await?;
    for record in &report.terminated {
        output::success(&format!("Terminated {}", record));
    }
    Ok(())
}
