//! Well-known paths, JSON-RPC method names and media types used by the checker.

/// The well-known path for the agent card (v0.3+ of A2A spec)
pub const AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent-card.json";

/// The previous well-known path for the agent card (deprecated, but still recognised)
pub const PREV_AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent.json";

/// Protocol version series this checker targets.
pub const SUPPORTED_PROTOCOL_SERIES: &str = "0.3";

/// Transport identifiers allowed in `preferredTransport` / `additionalInterfaces`.
pub const TRANSPORT_JSONRPC: &str = "JSONRPC";
/// gRPC transport identifier.
pub const TRANSPORT_GRPC: &str = "GRPC";
/// HTTP+JSON (REST mapping) transport identifier.
pub const TRANSPORT_HTTP_JSON: &str = "HTTP+JSON";

/// Every standard transport identifier.
pub const STANDARD_TRANSPORTS: &[&str] = &[TRANSPORT_JSONRPC, TRANSPORT_GRPC, TRANSPORT_HTTP_JSON];

// JSON-RPC method names exercised by the RPC rule set.

/// Deliberately nonexistent method used to probe error handling.
pub const METHOD_UNKNOWN: &str = "foo/bar";
pub const METHOD_MESSAGE_SEND: &str = "message/send";
pub const METHOD_MESSAGE_STREAM: &str = "message/stream";
pub const METHOD_TASKS_GET: &str = "tasks/get";
pub const METHOD_TASKS_CANCEL: &str = "tasks/cancel";
pub const METHOD_TASKS_RESUBSCRIBE: &str = "tasks/resubscribe";
pub const METHOD_PUSH_SET: &str = "tasks/pushNotificationConfig/set";
pub const METHOD_PUSH_GET: &str = "tasks/pushNotificationConfig/get";
pub const METHOD_PUSH_LIST: &str = "tasks/pushNotificationConfig/list";
pub const METHOD_PUSH_DELETE: &str = "tasks/pushNotificationConfig/delete";
pub const METHOD_EXTENDED_CARD: &str = "agent/getAuthenticatedExtendedCard";

/// Version segment of the HTTP+JSON mapping.
pub const REST_VERSION_SEGMENT: &str = "v1";

/// Webhook URL registered by the push-notification probe. Never called.
pub const PUSH_WEBHOOK_URL: &str = "https://client.example.com/webhook/a2a-notifications";

/// Media type every JSON response must carry.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Media type of an SSE response.
pub const SSE_MEDIA_TYPE: &str = "text/event-stream";
