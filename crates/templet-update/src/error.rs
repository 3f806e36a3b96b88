//! Error types for templet-update

use thiserror::Error;

/// Result type alias using templet-update's Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Release lookup answered with something other than a release
    #[error("Release lookup failed: {message}")]
    Release { message: String },

    /// A release tag that is not a semantic version
    #[error("Invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    /// HTTP error while querying releases
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Core library error (command, validation)
    #[error(transparent)]
    Core(#[from] templet_core::Error),
}

impl Error {
    /// Create a release lookup error
    pub fn release(message: impl Into<String>) -> Self {
        Self::Release {
            message: message.into(),
        }
    }

    pub fn invalid_version(version: impl Into<String>, source: semver::Error) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            source,
        }
    }
}
