//! Repository fetch with a single no-proxy fallback
//!
//! A fetch runs `git clone --progress` through the accelerating proxy when the [`ProxyPolicy`]
//! asks for it. If that attempt fails in a way that looks like a proxy or network problem, the
//! same clone is repeated exactly once without the proxy. Every other failure is fatal.

use crate::error::{Error, Result};
use crate::git::stages::parse_progress_line;
use crate::progress::{ProgressState, ProgressTracker};
use crate::proxy::{FailureClassifier, ProxyPolicy};
use camino::Utf8Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use templet_core::config::FetchConfig;
use templet_core::{CommandResult, CommandRunner, CommandSpec, FetchTarget, RetryOutcome, Transport};
use tracing::{debug, info, warn};

/// Fetch tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Clone with `--depth 1` when a checkout ref is given
    pub shallow: bool,
    /// Simulated progress tick interval
    pub tick_interval: Duration,
    /// Render the progress line
    pub show_progress: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            shallow: true,
            tick_interval: Duration::from_millis(200),
            show_progress: true,
        }
    }
}

impl FetchSettings {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            shallow: config.shallow,
            tick_interval: config.tick_interval(),
            show_progress: config.progress,
        }
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    /// Every attempt in order; at most two
    pub outcomes: Vec<RetryOutcome>,
    /// Final progress state of the attempt that succeeded
    pub progress: ProgressState,
    pub elapsed: Duration,
}

impl FetchReport {
    pub fn attempts(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the direct fallback was needed
    pub fn fell_back(&self) -> bool {
        self.outcomes.len() > 1
    }

    /// Transport of the attempt that succeeded
    pub fn transport(&self) -> Option<Transport> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.succeeded)
            .map(|outcome| outcome.transport)
    }
}

/// Callback told about the no-proxy fallback before it starts
pub type FallbackNotice = Arc<dyn Fn(&str) + Send + Sync>;

/// Clones repositories through the proxy policy
pub struct GitFetchEngine {
    runner: Arc<dyn CommandRunner>,
    policy: ProxyPolicy,
    classifier: FailureClassifier,
    settings: FetchSettings,
    fallback_notice: Option<FallbackNotice>,
}

impl GitFetchEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, policy: ProxyPolicy, settings: FetchSettings) -> Self {
        Self {
            runner,
            policy,
            classifier: FailureClassifier::proxy_failures(),
            settings,
            fallback_notice: None,
        }
    }

    /// Report the fallback to the user (the CLI prints a warning line)
    pub fn with_fallback_notice(mut self, notice: FallbackNotice) -> Self {
        self.fallback_notice = Some(notice);
        self
    }

    /// Replace the proxy-failure classifier
    pub fn with_classifier(mut self, classifier: FailureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Clone `source_url` into `destination` at the remote's default branch
    pub async fn fetch(&self, source_url: &str, destination: &Utf8Path) -> Result<FetchReport> {
        self.fetch_ref(source_url, destination, "").await
    }

    /// Clone `source_url` into `destination`, checking out `checkout_ref` when non-empty
    ///
    /// The destination is not checked here; callers decide what an existing path means.
    pub async fn fetch_ref(
        &self,
        source_url: &str,
        destination: &Utf8Path,
        checkout_ref: &str,
    ) -> Result<FetchReport> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(Error::validation("Repository URL must not be empty"));
        }

        let started = Instant::now();
        let use_proxy = self.policy.should_proxy(source_url);
        let target = FetchTarget::new(source_url, destination, use_proxy, checkout_ref.trim());
        info!(
            "Fetching {} into {} ({})",
            source_url,
            destination,
            target.transport()
        );

        let mut outcomes = Vec::with_capacity(2);
        let progress = match self.attempt(&target).await {
            Ok(progress) => {
                outcomes.push(RetryOutcome::succeeded(target.transport()));
                progress
            }
            Err(err) if err.is_proxy() => {
                outcomes.push(RetryOutcome::failed(target.transport()));
                warn!(
                    "Proxy fetch of {} failed ({}), retrying without the proxy",
                    source_url, err
                );

                if let Some(notice) = &self.fallback_notice {
                    notice(&format!(
                        "Proxy connection failed, retrying {} without the proxy",
                        source_url
                    ));
                }

                let direct = target.direct();
                let progress = self.attempt(&direct).await?;
                outcomes.push(RetryOutcome::succeeded(direct.transport()));
                progress
            }
            Err(err) => return Err(err),
        };

        let report = FetchReport {
            outcomes,
            progress,
            elapsed: started.elapsed(),
        };
        info!(
            "Fetched {} in {:.2}s after {} attempt(s)",
            source_url,
            report.elapsed.as_secs_f64(),
            report.attempts()
        );
        Ok(report)
    }

    /// One clone attempt with its own progress tracker
    ///
    /// A proxied failure that matches the classifier comes back as [`Error::Proxy`];
    /// everything else is [`Error::Fetch`].
    async fn attempt(&self, target: &FetchTarget) -> Result<ProgressState> {
        let spec = self.clone_command(target);
        debug!("Clone attempt ({}): {}", target.transport(), spec);

        let mut tracker = if self.settings.show_progress {
            ProgressTracker::new(match target.transport() {
                Transport::Proxied => "Downloading",
                Transport::Direct => "Downloading (direct)",
            })
        } else {
            ProgressTracker::hidden()
        };
        tracker.start_ticker(self.settings.tick_interval);

        let outcome = {
            let tracker = &tracker;
            let mut on_line = |line: &str| {
                if let Some(sample) = parse_progress_line(line) {
                    tracker.record(sample);
                }
            };
            self.runner.run_streaming(&spec, &mut on_line).await
        };

        // Only git's own diagnostics are classified, never the whole transcript.
        let message = match outcome {
            Ok(result) if result.success() => return Ok(tracker.finish()),
            Ok(result) => failure_summary(&result),
            Err(templet_core::Error::Command { stderr, .. }) => stderr,
            Err(err) => err.to_string(),
        };
        // Clear the line before anything reports the failure.
        drop(tracker);

        if target.use_proxy && self.classifier.matches(&self.strip_echoes(&message, target)) {
            debug!("Classified as a proxy failure: {}", message);
            Err(Error::proxy(message))
        } else {
            Err(Error::fetch(&target.source_url, message))
        }
    }

    /// Remove the URLs and the quoted destination git echoes back, so names like `rustls` or
    /// `my-proxy` never look like network failures
    fn strip_echoes(&self, detail: &str, target: &FetchTarget) -> String {
        let proxied = self.policy.apply(&target.source_url);
        let mut text = detail
            .replace(proxied.as_str(), "")
            .replace(target.source_url.as_str(), "")
            .replace(&format!("'{}'", target.destination_path), "''");
        if let Some(name) = target.destination_path.file_name() {
            text = text.replace(&format!("'{}'", name), "''");
        }
        text
    }

    fn clone_command(&self, target: &FetchTarget) -> CommandSpec {
        let url = if target.use_proxy {
            self.policy.apply(&target.source_url)
        } else {
            target.source_url.clone()
        };

        let mut spec = CommandSpec::new("git").args(["clone", "--progress"]);
        if !target.checkout_ref.is_empty() {
            if self.settings.shallow {
                spec = spec.args(["--depth", "1"]);
            }
            spec = spec.args(["--branch", target.checkout_ref.as_str()]);
        }
        spec.args([url, target.destination_path.to_string()])
    }
}

/// Condense git's stderr to the lines worth showing
///
/// `Cloning into '<dest>'...` is git's own echo and never part of the summary.
fn failure_summary(result: &CommandResult) -> String {
    let lines: Vec<&str> = result
        .stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("fatal:") || line.starts_with("error:"))
        .collect();

    if !lines.is_empty() {
        return lines.join("; ");
    }

    result
        .stderr
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty() && !line.starts_with("Cloning into"))
        .map(str::to_string)
        .unwrap_or_else(|| match result.exit_code {
            Some(code) => format!("git exited with code {}", code),
            None => "git was terminated by a signal".to_string(),
        })
}
