//! Error types for templet-ports

use thiserror::Error;

/// Result type alias using templet-ports's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Port cleanup error types
#[derive(Error, Debug)]
pub enum Error {
    /// A termination command failed; the rest of the batch was not attempted
    #[error("Failed to terminate process {pid} on port {port}: {message}")]
    Kill {
        pid: String,
        port: String,
        message: String,
    },

    /// Core library error (validation, command, platform)
    #[error(transparent)]
    Core(#[from] templet_core::Error),
}

impl Error {
    /// Create a kill error
    pub fn kill(
        pid: impl Into<String>,
        port: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Kill {
            pid: pid.into(),
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Core(templet_core::Error::validation(message))
    }

    /// Process id of a failed termination
    pub fn failed_pid(&self) -> Option<&str> {
        match self {
            Self::Kill { pid, .. } => Some(pid),
            Self::Core(_) => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(core) if core.is_validation())
    }
}
