//! List command - show the available templates

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use templet_projects::TemplateRegistry;

use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::output;

#[derive(Tabled, Serialize)]
struct TemplateRow {
    name: String,
    description: String,
    #[tabled(skip)]
    #[serde(rename = "downloadUrl")]
    download_url: String,
}

fn rows(registry: &TemplateRegistry) -> Vec<TemplateRow> {
    registry
        .entries()
        .map(|(name, entry)| TemplateRow {
            name: name.to_string(),
            description: entry.description.clone(),
            download_url: entry.download_url.clone(),
        })
        .collect()
}

/// Render the template table
pub(crate) fn print_table(registry: &TemplateRegistry) {
    let table = Table::new(rows(registry)).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub async fn run(args: ListArgs, ctx: &AppContext) -> Result<()> {
    let spinner = (!args.json).then(|| output::spinner("Loading template list..."));
    let registry = ctx
        .registry_loader(args.offline)
        .load()
        .await
        .context("Failed to load the template list")?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows(&registry))?);
        return Ok(());
    }

    if registry.is_empty() {
        output::warning("No templates available");
        return Ok(());
    }

    output::header(&format!(
        "Available templates ({}, from {})",
        registry.len(),
        registry.origin()
    ));
    print_table(&registry);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templet_projects::templates::RegistryOrigin;

    #[test]
    fn test_rows_are_sorted_and_serialized() {
        let registry = TemplateRegistry::from_json(
            r#"{"b": {"desc": "B", "downloadUrl": "https://x/b"}, "a": {"desc": "A", "downloadUrl": "https://x/a#main"}}"#,
            RegistryOrigin::Embedded,
        )
        .unwrap();

        let rows = rows(&registry);
        assert_eq!(rows[0].name, "a");

        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["downloadUrl"], "https://x/a#main");
        assert_eq!(json[1]["description"], "B");
    }
}
