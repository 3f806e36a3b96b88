//! Operating system family detection
//!
//! The port-cleanup layer selects its command dialect from the family once at startup.

use crate::error::{Error, Result};
use std::fmt;

/// Supported operating system families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// macOS (Darwin)
    MacOS,
    /// Linux
    Linux,
    /// Windows
    Windows,
}

impl OsFamily {
    /// Detect the family of the running OS
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (`std::env::consts::OS` or a Node-style `platform()` name)
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "macos" | "darwin" => Ok(Self::MacOS),
            "linux" => Ok(Self::Linux),
            "windows" | "win32" => Ok(Self::Windows),
            other => Err(Error::platform_unsupported(other)),
        }
    }

    /// Whether the family speaks the POSIX command dialect (lsof / kill)
    pub fn is_posix(&self) -> bool {
        matches!(self, Self::MacOS | Self::Linux)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOS => write!(f, "macOS"),
            Self::Linux => write!(f, "Linux"),
            Self::Windows => write!(f, "Windows"),
        }
    }
}
