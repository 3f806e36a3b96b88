//! Template list loading and lookup

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use templet_core::config::{RegistryConfig, RegistrySource};
use tracing::{debug, info, warn};

/// Snapshot used when neither the network nor a cache is available
const EMBEDDED_TEMPLATE_LIST: &str = include_str!("../../templates/template-list.json");

/// Cache file name inside the cache directory
pub const CACHE_FILE_NAME: &str = "template-list.json";

const USER_AGENT: &str = concat!("templet/", env!("CARGO_PKG_VERSION"));

/// One entry of the upstream template list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// A template ready to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub name: String,
    pub source_url: String,
    /// Branch split off a trailing `#ref`; empty for the remote default
    pub checkout_ref: String,
    pub description: String,
}

/// Where the loaded list came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryOrigin {
    Cache,
    Remote(String),
    StaleCache,
    Embedded,
}

impl fmt::Display for RegistryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Remote(label) => write!(f, "{}", label),
            Self::StaleCache => write!(f, "expired cache"),
            Self::Embedded => write!(f, "built-in list"),
        }
    }
}

/// Loaded template list
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    entries: BTreeMap<String, TemplateEntry>,
    origin: RegistryOrigin,
}

impl TemplateRegistry {
    /// Parse the upstream JSON shape `{ "<name>": { "desc", "downloadUrl" } }`
    pub fn from_json(json: &str, origin: RegistryOrigin) -> Result<Self> {
        let entries: BTreeMap<String, TemplateEntry> = serde_json::from_str(json)?;
        Ok(Self { entries, origin })
    }

    /// The snapshot compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_TEMPLATE_LIST, RegistryOrigin::Embedded)
    }

    pub fn origin(&self) -> &RegistryOrigin {
        &self.origin
    }

    /// Look up a template by exact name
    pub fn resolve(&self, name: &str) -> Option<ResolvedTemplate> {
        let entry = self.entries.get(name)?;
        let (source_url, checkout_ref) = match entry.download_url.split_once('#') {
            Some((url, reference)) => (url, reference),
            None => (entry.download_url.as_str(), ""),
        };

        Some(ResolvedTemplate {
            name: name.to_string(),
            source_url: source_url.trim().to_string(),
            checkout_ref: checkout_ref.trim().to_string(),
            description: entry.description.clone(),
        })
    }

    /// Entries sorted by name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TemplateEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads the template list: fresh cache, mirrors, stale cache, embedded snapshot
#[derive(Debug, Clone)]
pub struct RegistryLoader {
    config: RegistryConfig,
    cache_file: Utf8PathBuf,
    offline: bool,
}

impl RegistryLoader {
    pub fn new(config: RegistryConfig, cache_dir: &Utf8Path) -> Self {
        Self {
            config,
            cache_file: cache_dir.join(CACHE_FILE_NAME),
            offline: false,
        }
    }

    /// Skip the mirrors
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn cache_file(&self) -> &Utf8Path {
        &self.cache_file
    }

    pub async fn load(&self) -> Result<TemplateRegistry> {
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        if let Some(registry) = self.read_cache(Some(ttl)).await {
            debug!("Using cached template list {}", self.cache_file);
            return Ok(registry);
        }

        if !self.offline {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(self.config.timeout_secs.max(1)))
                .user_agent(USER_AGENT)
                .build()?;

            for source in &self.config.sources {
                match Self::fetch_source(&client, source).await {
                    Ok((registry, body)) => {
                        info!(
                            "Loaded {} templates from {}",
                            registry.len(),
                            source.label
                        );
                        self.write_cache(&body).await;
                        return Ok(registry);
                    }
                    Err(e) => warn!(
                        "Template list from {} unavailable: {}. Trying next source...",
                        source.label, e
                    ),
                }
            }
        }

        if let Some(registry) = self.read_cache(None).await {
            warn!("Using expired template list cache as fallback");
            return Ok(registry);
        }

        debug!("Using built-in template list");
        TemplateRegistry::embedded()
    }

    async fn fetch_source(
        client: &reqwest::Client,
        source: &RegistrySource,
    ) -> Result<(TemplateRegistry, String)> {
        debug!("Fetching template list from: {}", source.url);

        let response = client
            .get(&source.url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::registry_unavailable(format!(
                "HTTP {} from {}",
                response.status(),
                source.url
            )));
        }

        let body = response.text().await?;
        let registry =
            TemplateRegistry::from_json(&body, RegistryOrigin::Remote(source.label.clone()))?;
        Ok((registry, body))
    }

    /// Read the cache; with `max_age`, only when it is younger than that
    async fn read_cache(&self, max_age: Option<Duration>) -> Option<TemplateRegistry> {
        let metadata = tokio::fs::metadata(&self.cache_file).await.ok()?;
        let origin = match max_age {
            Some(max_age) => {
                let age = metadata.modified().ok()?.elapsed().ok()?;
                if age >= max_age {
                    return None;
                }
                RegistryOrigin::Cache
            }
            None => RegistryOrigin::StaleCache,
        };

        let content = tokio::fs::read_to_string(&self.cache_file).await.ok()?;
        match TemplateRegistry::from_json(&content, origin) {
            Ok(registry) => Some(registry),
            Err(e) => {
                warn!("Ignoring unreadable template cache {}: {}", self.cache_file, e);
                None
            }
        }
    }

    async fn write_cache(&self, body: &str) {
        if let Some(parent) = self.cache_file.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("Could not create cache directory {}: {}", parent, e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.cache_file, body).await {
            warn!("Could not cache template list: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LIST: &str = r#"{
        "vue-admin": { "desc": "Admin panel", "downloadUrl": "https://github.com/acme/vue-admin.git#master" },
        "cli-kit": { "desc": "CLI starter", "downloadUrl": "https://gitee.com/acme/cli-kit.git" }
    }"#;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn config(sources: Vec<RegistrySource>, ttl: u64) -> RegistryConfig {
        RegistryConfig {
            sources,
            cache_ttl_secs: ttl,
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_resolve_splits_checkout_ref() {
        let registry = TemplateRegistry::from_json(LIST, RegistryOrigin::Embedded).unwrap();

        let resolved = registry.resolve("vue-admin").unwrap();
        assert_eq!(resolved.source_url, "https://github.com/acme/vue-admin.git");
        assert_eq!(resolved.checkout_ref, "master");
        assert_eq!(resolved.description, "Admin panel");

        let resolved = registry.resolve("cli-kit").unwrap();
        assert_eq!(resolved.checkout_ref, "");
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_entries_sorted_by_name() {
        let registry = TemplateRegistry::from_json(LIST, RegistryOrigin::Embedded).unwrap();
        let names: Vec<&str> = registry.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["cli-kit", "vue-admin"]);
    }

    #[test]
    fn test_embedded_snapshot_parses() {
        let registry = TemplateRegistry::embedded().unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry.origin(), &RegistryOrigin::Embedded);
    }

    #[tokio::test]
    async fn test_fresh_cache_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE_NAME), LIST).unwrap();

        let registry = RegistryLoader::new(config(Vec::new(), 3600), &utf8(&dir))
            .load()
            .await
            .unwrap();

        assert_eq!(registry.origin(), &RegistryOrigin::Cache);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_offline_uses_stale_cache() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE_NAME), LIST).unwrap();

        let registry = RegistryLoader::new(config(Vec::new(), 0), &utf8(&dir))
            .offline(true)
            .load()
            .await
            .unwrap();

        assert_eq!(registry.origin(), &RegistryOrigin::StaleCache);
    }

    #[tokio::test]
    async fn test_offline_without_cache_uses_embedded() {
        let dir = TempDir::new().unwrap();

        let registry = RegistryLoader::new(config(Vec::new(), 3600), &utf8(&dir))
            .offline(true)
            .load()
            .await
            .unwrap();

        assert_eq!(registry.origin(), &RegistryOrigin::Embedded);
    }

    #[tokio::test]
    async fn test_unreachable_mirror_falls_through() {
        let dir = TempDir::new().unwrap();
        let sources = vec![RegistrySource {
            label: "local".to_string(),
            url: "http://127.0.0.1:9/template-list.json".to_string(),
        }];

        let registry = RegistryLoader::new(config(sources, 3600), &utf8(&dir))
            .load()
            .await
            .unwrap();

        assert_eq!(registry.origin(), &RegistryOrigin::Embedded);
        assert!(!dir.path().join(CACHE_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE_NAME), "{ not json").unwrap();

        let registry = RegistryLoader::new(config(Vec::new(), 3600), &utf8(&dir))
            .offline(true)
            .load()
            .await
            .unwrap();

        assert_eq!(registry.origin(), &RegistryOrigin::Embedded);
    }
}
