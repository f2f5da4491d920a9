//! Probe error types and the JSON-RPC / A2A error codes the rule sets reason about.
//!
//! - Standard JSON-RPC 2.0 errors (-32700 through -32603)
//! - A2A-specific errors (-32001 through -32007)
//! - Allowlists of codes that signal an optional feature rather than a defect

// ---------------------------------------------------------------------------
// Standard JSON-RPC 2.0 error codes
// ---------------------------------------------------------------------------

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// ---------------------------------------------------------------------------
// A2A-specific error codes
// ---------------------------------------------------------------------------

/// The requested task was not found.
pub const TASK_NOT_FOUND: i64 = -32001;

/// The task cannot be canceled in its current state.
pub const TASK_NOT_CANCELABLE: i64 = -32002;

/// Push notifications are not supported by this agent.
pub const PUSH_NOTIFICATION_NOT_SUPPORTED: i64 = -32003;

/// The requested operation is not supported.
pub const UNSUPPORTED_OPERATION: i64 = -32004;

/// The content type is not supported.
pub const CONTENT_TYPE_NOT_SUPPORTED: i64 = -32005;

/// The agent returned an invalid response.
pub const INVALID_AGENT_RESPONSE: i64 = -32006;

/// Authenticated extended card is not configured.
pub const AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED: i64 = -32007;

// ---------------------------------------------------------------------------
// Tolerance allowlists
// ---------------------------------------------------------------------------

/// Codes accepted as a correct rejection of an unknown JSON-RPC method.
pub const UNKNOWN_METHOD_CODES: &[i64] = &[INVALID_REQUEST, METHOD_NOT_FOUND, INVALID_PARAMS];

/// Codes accepted as "this task cannot be canceled right now".
pub const NOT_CANCELABLE_CODES: &[i64] = &[TASK_NOT_CANCELABLE];

/// Codes accepted as "push notifications are not offered by this agent".
pub const PUSH_UNSUPPORTED_CODES: &[i64] = &[
    PUSH_NOTIFICATION_NOT_SUPPORTED,
    UNSUPPORTED_OPERATION,
    METHOD_NOT_FOUND,
];

/// Human-readable name for a well-known code, used in outcome messages.
pub fn code_name(code: i64) -> &'static str {
    match code {
        PARSE_ERROR => "parse error",
        INVALID_REQUEST => "invalid request",
        METHOD_NOT_FOUND => "method not found",
        INVALID_PARAMS => "invalid params",
        INTERNAL_ERROR => "internal error",
        TASK_NOT_FOUND => "task not found",
        TASK_NOT_CANCELABLE => "task not cancelable",
        PUSH_NOTIFICATION_NOT_SUPPORTED => "push notification not supported",
        UNSUPPORTED_OPERATION => "unsupported operation",
        CONTENT_TYPE_NOT_SUPPORTED => "content type not supported",
        INVALID_AGENT_RESPONSE => "invalid agent response",
        AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED => "extended card not configured",
        _ => "non-standard code",
    }
}

// ---------------------------------------------------------------------------
// ProbeError enum
// ---------------------------------------------------------------------------

/// Failure of a single probe against the target.
///
/// These never escape a rule set: each one is folded into exactly one ERROR
/// outcome scoped to the step that raised it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    /// Connection refused, DNS failure, TLS handshake failure, broken body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// HTTP error with status code and response body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Body could not be parsed as JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Body was JSON but not the expected envelope or media type.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A JSON-RPC error envelope where a result was required.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional structured error data.
        data: Option<serde_json::Value>,
    },

    /// Catch-all for errors that don't fit other categories.
    #[error("{0}")]
    Other(String),
}

/// Convenience result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

impl ProbeError {
    /// Map a `reqwest` failure onto the probe taxonomy.
    pub(crate) fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout(format!("{context} timed out: {err}"))
        } else if err.is_connect() {
            ProbeError::Transport(format!("{context} connection failed: {err}"))
        } else {
            ProbeError::Transport(format!("{context} failed: {err}"))
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::InvalidJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_match_protocol() {
        assert_eq!(PARSE_ERROR, -32700);
        assert_eq!(INVALID_REQUEST, -32600);
        assert_eq!(METHOD_NOT_FOUND, -32601);
        assert_eq!(INVALID_PARAMS, -32602);
        assert_eq!(INTERNAL_ERROR, -32603);
        assert_eq!(TASK_NOT_FOUND, -32001);
        assert_eq!(TASK_NOT_CANCELABLE, -32002);
        assert_eq!(PUSH_NOTIFICATION_NOT_SUPPORTED, -32003);
        assert_eq!(UNSUPPORTED_OPERATION, -32004);
        assert_eq!(CONTENT_TYPE_NOT_SUPPORTED, -32005);
        assert_eq!(INVALID_AGENT_RESPONSE, -32006);
        assert_eq!(AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED, -32007);
    }

    #[test]
    fn unknown_method_allowlist_is_the_broad_one() {
        for code in [-32600, -32601, -32602] {
            assert!(UNKNOWN_METHOD_CODES.contains(&code));
        }
        assert!(!UNKNOWN_METHOD_CODES.contains(&-32000));
        assert!(!UNKNOWN_METHOD_CODES.contains(&INTERNAL_ERROR));
    }

    #[test]
    fn push_allowlist_covers_unsupported_and_missing_method() {
        assert!(PUSH_UNSUPPORTED_CODES.contains(&PUSH_NOTIFICATION_NOT_SUPPORTED));
        assert!(PUSH_UNSUPPORTED_CODES.contains(&UNSUPPORTED_OPERATION));
        assert!(PUSH_UNSUPPORTED_CODES.contains(&METHOD_NOT_FOUND));
        assert!(!PUSH_UNSUPPORTED_CODES.contains(&TASK_NOT_FOUND));
    }

    #[test]
    fn code_names() {
        assert_eq!(code_name(-32601), "method not found");
        assert_eq!(code_name(-32002), "task not cancelable");
        assert_eq!(code_name(-32000), "non-standard code");
    }

    #[test]
    fn serde_error_converts_to_invalid_json() {
        let err: ProbeError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, ProbeError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
