//! Error types for templet-core

use thiserror::Error;

/// Result type alias using templet-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for templet
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or empty input, rejected before any external command runs
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// An external command failed for a reason other than "no results"
    #[error("Command `{command}` failed{}: {stderr}", exit_suffix(.exit_code))]
    Command {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The running OS is outside the supported families
    #[error("Unsupported operating system: {os}. Supported: macos, linux, windows")]
    PlatformUnsupported { os: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a command error
    pub fn command(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Command {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a platform unsupported error
    pub fn platform_unsupported(os: impl Into<String>) -> Self {
        Self::PlatformUnsupported { os: os.into() }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error was raised before any external command ran
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
