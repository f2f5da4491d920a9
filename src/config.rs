//! Run configuration shared by the transport and every rule set.

use std::collections::HashMap;
use std::time::Duration;

use crate::utils::constants::AGENT_CARD_WELL_KNOWN_PATH;

/// Immutable configuration for network and protocol operations.
///
/// Built once per invocation and handed to the transport and the rule sets by
/// reference; nothing mutates it during a run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Timeout for plain request/response calls. Defaults to 8 seconds.
    pub timeout: Duration,
    /// Deadline for consuming an SSE stream, measured from subscription
    /// start. Defaults to 12 seconds.
    pub stream_timeout: Duration,
    /// Verify TLS certificates. Defaults to `true`.
    pub verify_tls: bool,
    /// Path appended to the origin when resolving the discovery document.
    pub well_known_path: String,
    /// Bearer token sent on authenticated requests.
    pub auth_bearer: Option<String>,
    /// Additional HTTP headers to include on every request.
    pub extra_headers: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            stream_timeout: Duration::from_secs(12),
            verify_tls: true,
            well_known_path: AGENT_CARD_WELL_KNOWN_PATH.to_string(),
            auth_bearer: None,
            extra_headers: HashMap::new(),
        }
    }
}

impl Settings {
    /// Set the request timeout (builder-style).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the SSE stream deadline (builder-style).
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Override the well-known discovery path. A missing leading `/` is added.
    pub fn with_well_known_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.well_known_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Set the bearer token. Empty tokens are treated as absent.
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.auth_bearer = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Add a custom header (builder-style).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    /// The bearer token in a form safe for logs.
    pub fn masked_bearer(&self) -> String {
        mask_token(self.auth_bearer.as_deref())
    }
}

/// Mask a secret for logging: `-` when absent, `***` when short, otherwise
/// the first and last four characters.
pub fn mask_token(token: Option<&str>) -> String {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return "-".to_string();
    };
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.timeout, Duration::from_secs(8));
        assert_eq!(s.stream_timeout, Duration::from_secs(12));
        assert!(s.verify_tls);
        assert_eq!(s.well_known_path, "/.well-known/agent-card.json");
        assert!(s.auth_bearer.is_none());
        assert!(s.extra_headers.is_empty());
    }

    #[test]
    fn well_known_path_gets_leading_slash() {
        let s = Settings::default().with_well_known_path("custom/card.json");
        assert_eq!(s.well_known_path, "/custom/card.json");
        let s = Settings::default().with_well_known_path("/x.json");
        assert_eq!(s.well_known_path, "/x.json");
    }

    #[test]
    fn blank_bearer_is_absent() {
        let s = Settings::default().with_bearer_token(Some("  ".into()));
        assert!(s.auth_bearer.is_none());
        let s = Settings::default().with_bearer_token(Some("tok".into()));
        assert_eq!(s.auth_bearer.as_deref(), Some("tok"));
    }

    #[test]
    fn token_masking() {
        assert_eq!(mask_token(None), "-");
        assert_eq!(mask_token(Some("")), "-");
        assert_eq!(mask_token(Some("short")), "***");
        assert_eq!(mask_token(Some("abcdefghijkl")), "abcd…ijkl");
    }
}
