//! Data model shared by the fetch and port-cleanup layers
//!
//! Every value here lives for a single fetch or a single resolve/terminate call.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OS process bound to a queried port
///
/// Identity is `process_id`; a resolution pass never yields two records with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub process_name: String,
    pub process_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// `None` where the discovery tool does not report it (Windows netstat)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl ProcessRecord {
    pub fn new(process_name: impl Into<String>, process_id: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            process_id: process_id.into(),
            user: None,
            command: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.process_name, self.process_id)
    }
}

/// How a fetch attempt reaches the origin host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Routed through the accelerating proxy origin
    Proxied,
    /// Straight to the origin host
    Direct,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proxied => write!(f, "proxied"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// One fetch attempt
///
/// Attempts are immutable: the no-proxy fallback builds a new target with [`FetchTarget::direct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub source_url: String,
    pub destination_path: Utf8PathBuf,
    pub use_proxy: bool,
    /// Branch or tag to check out; empty means the remote default
    pub checkout_ref: String,
}

impl FetchTarget {
    pub fn new(
        source_url: impl Into<String>,
        destination_path: &Utf8Path,
        use_proxy: bool,
        checkout_ref: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            destination_path: destination_path.to_path_buf(),
            use_proxy,
            checkout_ref: checkout_ref.into(),
        }
    }

    /// A fresh target for the same source with the proxy turned off
    pub fn direct(&self) -> Self {
        Self {
            use_proxy: false,
            ..self.clone()
        }
    }

    pub fn transport(&self) -> Transport {
        if self.use_proxy {
            Transport::Proxied
        } else {
            Transport::Direct
        }
    }
}

/// A discrete progress observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub completed: f64,
    pub total: f64,
}

impl ProgressSample {
    pub fn new(completed: f64, total: f64) -> Self {
        Self { completed, total }
    }

    /// A sample expressed as a percentage out of 100
    pub fn percent(percent: f64) -> Self {
        Self::new(percent, 100.0)
    }

    /// Normalized fraction in `[0, 1]`; a zero or invalid total yields 0
    pub fn fraction(&self) -> f64 {
        if self.total.is_nan() || self.total <= 0.0 || !self.completed.is_finite() {
            return 0.0;
        }
        (self.completed / self.total).clamp(0.0, 1.0)
    }
}

/// The outcome of one fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOutcome {
    pub transport: Transport,
    pub succeeded: bool,
}

impl RetryOutcome {
    pub fn succeeded(transport: Transport) -> Self {
        Self {
            transport,
            succeeded: true,
        }
    }

    pub fn failed(transport: Transport) -> Self {
        Self {
            transport,
            succeeded: false,
        }
    }
}
