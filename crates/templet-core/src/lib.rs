//! # templet-core
//!
//! Core library for the templet CLI providing:
//! - Error types shared by every workspace crate
//! - Hierarchical configuration loading (embedded defaults, user file, environment)
//! - Operating system family detection
//! - External command execution with uniform results (`CommandRunner`)
//! - The data model passed between the fetch and port-cleanup layers

pub mod config;
pub mod error;
pub mod exec;
pub mod platform;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{ConfigLoader, TempletConfig};
pub use error::{Error, Result};
pub use exec::{CommandResult, CommandRunner, CommandSpec, ExitCheck, SystemRunner};
pub use platform::OsFamily;
pub use types::{FetchTarget, ProcessRecord, ProgressSample, RetryOutcome, Transport};
pub use utils::get_home_dir;
