//! Discovery-document resolution.
//!
//! Turns a user-supplied target (bare host, URL, or a URL already pointing at
//! the discovery document) into the origin to probe for reachability and the
//! canonical discovery-document URL. Resolution never fails: malformed input
//! degrades to a best-effort origin and surfaces later as an unreachable
//! endpoint.

use serde::{Deserialize, Serialize};

use crate::utils::constants::{AGENT_CARD_WELL_KNOWN_PATH, PREV_AGENT_CARD_WELL_KNOWN_PATH};

/// Where a run finds its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// `scheme://host[:port]`
    pub origin: String,
    /// URL of the discovery document.
    pub card_url: String,
}

/// Prefix `http://` when the input carries no `scheme://`.
pub fn ensure_scheme(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// `scheme://host[:port]` of `url`, with `http` assumed when no scheme is given.
pub fn build_origin(url: &str) -> String {
    let url = ensure_scheme(url);
    let (scheme, rest) = url.split_once("://").unwrap_or(("http", url.as_str()));
    let scheme = if scheme.is_empty() { "http" } else { scheme };
    let authority = rest
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");
    format!("{scheme}://{authority}")
}

/// Whether `url` already addresses a discovery document.
fn looks_like_card_url(url: &str, well_known_path: &str) -> bool {
    url.contains(AGENT_CARD_WELL_KNOWN_PATH)
        || url.contains(PREV_AGENT_CARD_WELL_KNOWN_PATH)
        || url.ends_with("agent-card.json")
        || (well_known_path != "/" && url.ends_with(well_known_path))
}

/// Canonical discovery-document URL for `target`.
///
/// An explicit override wins (scheme-normalized). A target that already names
/// a discovery document is used as-is. Otherwise `well_known_path` is
/// appended to the target's origin.
pub fn resolve_card_url(target: &str, override_url: Option<&str>, well_known_path: &str) -> String {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return ensure_scheme(url);
    }
    let target = ensure_scheme(target);
    let path = if well_known_path.starts_with('/') {
        well_known_path.to_string()
    } else {
        format!("/{well_known_path}")
    };
    if looks_like_card_url(&target, &path) {
        return target;
    }
    format!("{}{path}", build_origin(&target))
}

/// Resolve both the origin and the discovery-document URL.
pub fn resolve(target: &str, override_url: Option<&str>, well_known_path: &str) -> ResolvedTarget {
    ResolvedTarget {
        origin: build_origin(target),
        card_url: resolve_card_url(target, override_url, well_known_path),
    }
}
