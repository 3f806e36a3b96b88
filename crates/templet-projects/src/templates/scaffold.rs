//! Post-fetch adjustments of a freshly created project

use crate::error::{Error, Result};
use camino::Utf8Path;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use tracing::debug;

/// Keys pointing at the template's upstream, meaningless for the new project
const UPSTREAM_KEYS: &[&str] = &["homepage", "bugs"];

/// Changes applied to `package.json` of a new project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEdits {
    /// New package name
    pub name: String,
    /// Every occurrence of this text is renamed to `name` first (scripts, repository URLs...)
    pub template_name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

impl ManifestEdits {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn renaming(mut self, template_name: impl Into<String>) -> Self {
        self.template_name = Some(template_name.into());
        self
    }

    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Apply the edits to manifest text
    pub fn apply(&self, manifest: &str) -> Result<String> {
        let manifest = match self.template_name.as_deref() {
            Some(template) if !template.is_empty() && template != self.name => {
                manifest.replace(template, &self.name)
            }
            _ => manifest.to_string(),
        };

        let mut package: Value = serde_json::from_str(&manifest)?;
        let fields = package
            .as_object_mut()
            .ok_or_else(|| Error::validation("package.json is not a JSON object"))?;

        fields.retain(|key, _| !UPSTREAM_KEYS.contains(&key.as_str()));
        fields.insert("name".to_string(), Value::String(self.name.clone()));
        for (key, value) in [
            ("version", &self.version),
            ("description", &self.description),
            ("author", &self.author),
        ] {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        // npm's own layout: four-space indent, trailing newline
        let mut rendered = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut rendered, PrettyFormatter::with_indent(b"    "));
        package.serialize(&mut serializer)?;
        rendered.push(b'\n');
        String::from_utf8(rendered).map_err(|e| Error::validation(e.to_string()))
    }
}

/// Rewrite `<project_dir>/package.json` with `edits`
///
/// Returns `false` when the project has no `package.json`.
pub fn rewrite_package_json(project_dir: &Utf8Path, edits: &ManifestEdits) -> Result<bool> {
    let manifest = project_dir.join("package.json");
    if !manifest.is_file() {
        debug!("No package.json in {}", project_dir);
        return Ok(false);
    }

    let content = std::fs::read_to_string(&manifest)?;
    std::fs::write(&manifest, edits.apply(&content)?)?;
    debug!("Rewrote {} for package {}", manifest, edits.name);
    Ok(true)
}
