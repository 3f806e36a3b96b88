//! Error types for templet-projects

use thiserror::Error;

/// Result type alias using templet-projects's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Project error types
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal fetch failure (after the fallback, or not proxy related)
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// Fetch failure through the proxy that looks network related; recovered once locally
    #[error("Proxy connection failed: {message}")]
    Proxy { message: String },

    /// Git command not found
    #[error("Git command not found. Please ensure git is installed and in PATH")]
    GitNotFound,

    /// Destination already exists
    #[error("Repository already exists at: {path}")]
    RepoExists { path: String },

    /// Invalid repository URL
    #[error("Invalid repository URL: {url}")]
    InvalidRepoUrl { url: String },

    /// Git operation failed
    #[error("Git operation failed: {message}")]
    GitOperation { message: String },

    /// Template not found
    #[error("Template not found: {template}")]
    TemplateNotFound { template: String },

    /// Template list could not be loaded
    #[error("Template registry unavailable: {message}")]
    RegistryUnavailable { message: String },

    /// Dependency install failed
    #[error("Dependency install with {package_manager} failed: {message}")]
    Install {
        package_manager: String,
        message: String,
    },

    /// HTTP error while fetching the template list
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error (validation, command, platform)
    #[error(transparent)]
    Core(#[from] templet_core::Error),
}

impl Error {
    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a proxy error
    pub fn proxy(message: impl Into<String>) -> Self {
        Self::Proxy {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Core(templet_core::Error::validation(message))
    }

    /// Create a repo exists error
    pub fn repo_exists(path: impl Into<String>) -> Self {
        Self::RepoExists { path: path.into() }
    }

    /// Create an invalid repo URL error
    pub fn invalid_repo_url(url: impl Into<String>) -> Self {
        Self::InvalidRepoUrl { url: url.into() }
    }

    /// Create a git operation error
    pub fn git_operation(message: impl Into<String>) -> Self {
        Self::GitOperation {
            message: message.into(),
        }
    }

    /// Create a template not found error
    pub fn template_not_found(template: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            template: template.into(),
        }
    }

    /// Create a dependency install error
    pub fn install(package_manager: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Install {
            package_manager: package_manager.into(),
            message: message.into(),
        }
    }

    /// Create a registry unavailable error
    pub fn registry_unavailable(message: impl Into<String>) -> Self {
        Self::RegistryUnavailable {
            message: message.into(),
        }
    }

    /// Whether this is the locally recoverable proxy failure
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy { .. })
    }

    /// Whether this is a validation failure raised before any command ran
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(core) if core.is_validation())
    }
}
