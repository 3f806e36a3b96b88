//! # templet-projects
//!
//! Project library for the templet CLI providing:
//! - Resilient repository fetch through an optional accelerating proxy, with a
//!   single no-proxy fallback and a live progress line
//! - Git remote management (bulk `origin` replacement)
//! - Dependency install for new projects
//! - The template registry that maps template names to source URLs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use camino::Utf8Path;
//! use templet_core::SystemRunner;
//! use templet_projects::git::{FetchSettings, GitFetchEngine};
//! use templet_projects::ProxyPolicy;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GitFetchEngine::new(
//!     Arc::new(SystemRunner::new()),
//!     ProxyPolicy::default(),
//!     FetchSettings::default(),
//! );
//! let report = engine
//!     .fetch("https://github.com/user/repo.git", Utf8Path::new("repo"))
//!     .await?;
//! println!("done in {:.2}s", report.elapsed.as_secs_f64());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod git;
pub mod install;
pub mod progress;
pub mod proxy;
pub mod templates;

pub use error::{Error, Result};
pub use install::{DependencyInstaller, InstallSettings};
pub use progress::{ProgressState, ProgressTracker, SignalMode};
pub use proxy::{FailureClassifier, ProxyPolicy};
pub use templates::{RegistryLoader, ResolvedTemplate, TemplateRegistry};
