//! # templet-update
//!
//! Checks GitHub releases for a newer templet and reinstalls it with cargo.

pub mod error;
pub mod installer;
pub mod releases;

pub use error::{Error, Result};
pub use installer::SelfInstaller;
pub use releases::{newer_version, parse_version, Release, ReleaseChecker, UpdateCheck};

/// Version of the running binary
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
