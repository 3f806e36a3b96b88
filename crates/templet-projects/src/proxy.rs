//! Accelerating proxy policy and proxy-failure classification

use templet_core::config::ProxyConfig;
use url::Url;

/// Default accelerating proxy origin
pub const DEFAULT_PROXY_ORIGIN: &str = "https://ghproxy.com/";

/// Hosts that are reachable directly by default
pub const DEFAULT_DIRECT_HOSTS: &[&str] = &["gitlab", "gitee"];

/// Markers in a failure message that point at the proxy or the network path to it
pub const PROXY_FAILURE_MARKERS: &[&str] = &[
    "proxy",
    "ssl_error_syscall",
    "ssl_connect",
    "ssl",
    "tls",
    "handshake",
    "connection",
    "timeout",
    "timed out",
];

/// Decides whether a repository fetch goes through the accelerating proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPolicy {
    enabled: bool,
    origin: String,
    direct_hosts: Vec<String>,
}

impl Default for ProxyPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROXY_ORIGIN,
            DEFAULT_DIRECT_HOSTS.iter().map(|h| h.to_string()),
        )
    }
}

impl ProxyPolicy {
    pub fn new<I, S>(origin: impl Into<String>, direct_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            origin: origin.into(),
            direct_hosts: direct_hosts
                .into_iter()
                .map(|h| h.into().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        let mut policy = Self::new(config.origin.clone(), config.direct_hosts.iter().cloned());
        policy.enabled = config.enabled;
        policy
    }

    /// Turn the proxy off entirely (`--no-proxy`)
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether `url` needs acceleration: false when its host contains a direct host (any case)
    pub fn needs_proxy(&self, url: &str) -> bool {
        let host = host_of(url);
        !self
            .direct_hosts
            .iter()
            .any(|direct| host.contains(direct.as_str()))
    }

    /// `needs_proxy`, unless the proxy is turned off
    pub fn should_proxy(&self, url: &str) -> bool {
        self.enabled && self.needs_proxy(url)
    }

    /// The URL routed through the proxy origin
    pub fn apply(&self, url: &str) -> String {
        format!("{}{}", self.origin, url)
    }
}

/// Host portion of a repository URL, lowercased
///
/// Handles scheme URLs (`https://host/path`) and scp-like ones (`git@host:path`).
fn host_of(url: &str) -> String {
    let url = url.trim();
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return host.to_lowercase();
        }
    }

    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split_once('@').map_or(rest, |(_, host)| host);
    rest.split([':', '/'])
        .next()
        .unwrap_or(rest)
        .to_lowercase()
}

/// Substring classifier for failure messages
///
/// Matching is case-insensitive. This is a heuristic over free text, not a structured signal.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    patterns: Vec<String>,
}

impl FailureClassifier {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Classifier for failures caused by the proxy or the network
    pub fn proxy_failures() -> Self {
        Self::new(PROXY_FAILURE_MARKERS.iter().map(|m| m.to_string()).collect())
    }

    pub fn matches(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| message.contains(pattern.as_str()))
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::proxy_failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_hosts_skip_proxy() {
        let policy = ProxyPolicy::default();

        for url in [
            "https://gitlab.com/group/repo.git",
            "https://GitLab.example.org/team/app",
            "https://gitee.com/user/repo.git",
            "git@gitee.com:user/repo.git",
            "ssh://git@GITLAB.internal:2222/a/b.git",
        ] {
            assert!(!policy.needs_proxy(url), "{} should be direct", url);
        }
    }

    #[test]
    fn test_other_hosts_need_proxy() {
        let policy = ProxyPolicy::default();

        for url in [
            "https://github.com/a/b.git",
            "git@github.com:a/b.git",
            "https://bitbucket.org/team/repo",
            "github.com:a/b",
        ] {
            assert!(policy.needs_proxy(url), "{} should be proxied", url);
        }
    }

    #[test]
    fn test_only_host_is_inspected() {
        let policy = ProxyPolicy::default();
        assert!(policy.needs_proxy("https://github.com/gitlab-mirror/repo.git"));
    }

    #[test]
    fn test_apply_prepends_origin() {
        let policy = ProxyPolicy::default();
        assert_eq!(
            policy.apply("https://github.com/a/b.git"),
            "https://ghproxy.com/https://github.com/a/b.git"
        );
    }

    #[test]
    fn test_disabled_policy_never_proxies() {
        let policy = ProxyPolicy::default().disabled();
        assert!(policy.needs_proxy("https://github.com/a/b.git"));
        assert!(!policy.should_proxy("https://github.com/a/b.git"));
    }

    #[test]
    fn test_from_config() {
        let config = ProxyConfig {
            enabled: false,
            origin: "https://mirror.example.com/".to_string(),
            direct_hosts: vec!["Codeberg".to_string()],
        };
        let policy = ProxyPolicy::from_config(&config);

        assert!(!policy.is_enabled());
        assert_eq!(policy.origin(), "https://mirror.example.com/");
        assert!(!policy.needs_proxy("https://codeberg.org/a/b"));
        assert!(policy.needs_proxy("https://gitlab.com/a/b"));
    }

    #[test]
    fn test_proxy_failure_markers() {
        let classifier = FailureClassifier::proxy_failures();

        assert!(classifier.matches("fatal: unable to access: Connection timed out"));
        assert!(classifier.matches("OpenSSL SSL_connect: SSL_ERROR_SYSCALL in connection"));
        assert!(classifier.matches("gnutls_handshake() failed"));
        assert!(classifier.matches("Received HTTP code 502 from proxy after CONNECT"));
        assert!(classifier.matches("operation TIMEOUT"));
    }

    #[test]
    fn test_non_proxy_failures() {
        let classifier = FailureClassifier::proxy_failures();

        assert!(!classifier.matches(
            "fatal: destination path 'b' already exists and is not an empty directory."
        ));
        assert!(!classifier.matches("fatal: Remote branch nope not found in upstream origin"));
    }
}
