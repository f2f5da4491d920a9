//! A2A v0.3 wire types the checker reads and writes.
//!
//! Reference: <https://github.com/a2aproject/A2A/blob/main/specification/a2a.proto>
//!
//! The [`AgentCard`] is the typed capability descriptor. It is built in exactly
//! one place, [`AgentCard::validate`], which first rewrites alias field names
//! to their canonical camelCase form and then collects every field-level
//! problem before handing the document to serde.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::error::{ProbeError, ProbeResult};
use crate::utils::constants::TRANSPORT_JSONRPC;

// ============================================================================
// Field aliasing
// ============================================================================

/// Top-level discovery-document fields that also appear in snake_case.
///
/// `(canonical, aliases)`. The canonical key wins when both are present.
pub const CARD_FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("protocolVersion", &["protocol_version"]),
    ("preferredTransport", &["preferred_transport"]),
    ("additionalInterfaces", &["additional_interfaces"]),
    ("securitySchemes", &["security_schemes"]),
    (
        "supportsAuthenticatedExtendedCard",
        &["supports_authenticated_extended_card"],
    ),
    ("defaultInputModes", &["default_input_modes"]),
    ("defaultOutputModes", &["default_output_modes"]),
    ("iconUrl", &["icon_url"]),
    ("documentationUrl", &["documentation_url"]),
];

/// Fields inside `capabilities` that also appear in snake_case.
pub const CAPABILITY_FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("pushNotifications", &["push_notifications"]),
    ("stateTransitionHistory", &["state_transition_history"]),
];

fn apply_aliases(object: &mut Map<String, Value>, table: &[(&str, &[&str])]) {
    for (canonical, aliases) in table {
        for alias in *aliases {
            if let Some(value) = object.remove(*alias) {
                if !object.contains_key(*canonical) {
                    object.insert((*canonical).to_string(), value);
                }
            }
        }
    }
}

/// Rewrite alias field names in a raw discovery document to canonical form.
///
/// Non-object documents are returned unchanged.
pub fn normalize_card_aliases(raw: &Value) -> Value {
    let mut doc = raw.clone();
    if let Value::Object(object) = &mut doc {
        apply_aliases(object, CARD_FIELD_ALIASES);
        if let Some(Value::Object(caps)) = object.get_mut("capabilities") {
            apply_aliases(caps, CAPABILITY_FIELD_ALIASES);
        }
    }
    doc
}

// ============================================================================
// Agent Card & Related Types
// ============================================================================

fn default_protocol_version() -> String {
    "0.3.0".to_string()
}

fn default_preferred_transport() -> String {
    TRANSPORT_JSONRPC.to_string()
}

/// Self-describing manifest for an A2A agent (the capability descriptor).
///
/// Proto ref: `message AgentCard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Protocol version — defaults to "0.3.0" when absent.
    #[serde(default = "default_protocol_version", alias = "protocol_version")]
    pub protocol_version: String,

    /// Human-readable name.
    pub name: String,

    /// Description of the agent's capabilities.
    pub description: String,

    /// Primary endpoint URL.
    pub url: String,

    /// Transport spoken at `url`. Defaults to "JSONRPC".
    #[serde(default = "default_preferred_transport", alias = "preferred_transport")]
    pub preferred_transport: String,

    /// Further transport interfaces.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "additional_interfaces"
    )]
    pub additional_interfaces: Option<Vec<AgentInterface>>,

    /// Agent version string.
    pub version: String,

    /// Service provider information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,

    /// URL to the agent's icon.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "icon_url")]
    pub icon_url: Option<String>,

    /// URL to the agent's documentation.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "documentation_url"
    )]
    pub documentation_url: Option<String>,

    /// Agent capabilities.
    pub capabilities: AgentCapabilities,

    /// Security requirements: scheme name to required scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<HashMap<String, Vec<String>>>>,

    /// Named security scheme definitions.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "security_schemes"
    )]
    pub security_schemes: Option<HashMap<String, SecurityScheme>>,

    /// Default MIME types accepted as input.
    #[serde(alias = "default_input_modes")]
    pub default_input_modes: Vec<String>,

    /// Default MIME types produced as output.
    #[serde(alias = "default_output_modes")]
    pub default_output_modes: Vec<String>,

    /// Skills the agent supports.
    pub skills: Vec<AgentSkill>,

    /// Whether the agent serves an authenticated extended card.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "supports_authenticated_extended_card"
    )]
    pub supports_authenticated_extended_card: Option<bool>,

    /// JWS signatures for the card, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Value>>,
}

/// A transport interface supported by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInterface {
    /// URL of the interface endpoint.
    pub url: String,

    /// Transport protocol (e.g. "JSONRPC", "HTTP+JSON", "GRPC").
    pub transport: String,
}

/// Agent capabilities declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether the agent supports streaming responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,

    /// Whether the agent supports push notifications.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "push_notifications"
    )]
    pub push_notifications: Option<bool>,

    /// Whether the agent keeps a history of state transitions.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "state_transition_history"
    )]
    pub state_transition_history: Option<bool>,

    /// Protocol extensions supported by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<AgentExtension>>,
}

/// A protocol extension supported by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentExtension {
    /// URI identifying the extension.
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A skill that an agent can perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Unique skill identifier.
    pub id: String,

    /// Human-readable skill name.
    pub name: String,

    /// Description of what the skill does.
    pub description: String,

    /// Categorization tags.
    pub tags: Vec<String>,

    /// Example prompts/inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
}

/// Information about the agent's provider/organization.
///
/// `url` is optional here so that an incomplete provider block is reported
/// as advisory instead of rejecting the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProvider {
    /// Organization name.
    pub organization: String,

    /// Organization URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A security scheme definition, discriminated by `type`.
///
/// OAuth flow details are kept opaque; the checker only needs the scheme to
/// exist under the referenced name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// API key authentication.
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Where the key is sent: header, query or cookie.
        #[serde(rename = "in")]
        location: String,
        /// Name of the API key parameter.
        name: String,
    },
    /// HTTP authentication (Bearer, Basic, etc.).
    #[serde(rename = "http")]
    Http {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Authentication scheme name (e.g. "bearer").
        scheme: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            rename = "bearerFormat"
        )]
        bearer_format: Option<String>,
    },
    /// OAuth 2.0 authentication.
    #[serde(rename = "oauth2")]
    OAuth2 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        flows: Value,
    },
    /// OpenID Connect authentication.
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: String,
    },
    /// Mutual TLS authentication.
    #[serde(rename = "mutualTLS")]
    MutualTls {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// One problem found while validating a discovery document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `skills[1].tags`.
    pub field: String,
    /// What is wrong with it.
    pub problem: String,
}

impl FieldError {
    fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Check `field` of `object` against a shape predicate, recording a problem.
fn require(
    errors: &mut Vec<FieldError>,
    object: &Map<String, Value>,
    prefix: &str,
    field: &str,
    expected: &str,
    ok: fn(&Value) -> bool,
) {
    let path = format!("{prefix}{field}");
    match object.get(field) {
        None | Some(Value::Null) => errors.push(FieldError::new(path, "field required")),
        Some(v) if !ok(v) => errors.push(FieldError::new(
            path,
            format!(
                "expected {expected}, got {}",
                crate::utils::json::type_name(v)
            ),
        )),
        Some(_) => {}
    }
}

fn optional(
    errors: &mut Vec<FieldError>,
    object: &Map<String, Value>,
    prefix: &str,
    field: &str,
    expected: &str,
    ok: fn(&Value) -> bool,
) {
    if let Some(v) = object.get(field) {
        if !v.is_null() && !ok(v) {
            errors.push(FieldError::new(
                format!("{prefix}{field}"),
                format!(
                    "expected {expected}, got {}",
                    crate::utils::json::type_name(v)
                ),
            ));
        }
    }
}

fn is_string(v: &Value) -> bool {
    v.is_string()
}

fn is_bool(v: &Value) -> bool {
    v.is_boolean()
}

fn is_object(v: &Value) -> bool {
    v.is_object()
}

fn is_array(v: &Value) -> bool {
    v.is_array()
}

fn is_string_array(v: &Value) -> bool {
    v.as_array()
        .map(|items| items.iter().all(Value::is_string))
        .unwrap_or(false)
}

impl AgentCard {
    /// Validate a raw discovery document and build the typed descriptor.
    ///
    /// Alias field names are resolved first. On failure every field-level
    /// problem found is returned, not just the first one.
    pub fn validate(raw: &Value) -> Result<AgentCard, Vec<FieldError>> {
        let doc = normalize_card_aliases(raw);
        let Some(object) = doc.as_object() else {
            return Err(vec![FieldError::new(
                "$",
                format!(
                    "expected object, got {}",
                    crate::utils::json::type_name(&doc)
                ),
            )]);
        };

        let mut errors = Vec::new();
        for field in ["name", "description", "url", "version"] {
            require(&mut errors, object, "", field, "string", is_string);
        }
        require(&mut errors, object, "", "capabilities", "object", is_object);
        for field in ["defaultInputModes", "defaultOutputModes"] {
            require(
                &mut errors,
                object,
                "",
                field,
                "array of strings",
                is_string_array,
            );
        }
        require(&mut errors, object, "", "skills", "array", is_array);
        for field in ["protocolVersion", "preferredTransport", "iconUrl"] {
            optional(&mut errors, object, "", field, "string", is_string);
        }
        optional(
            &mut errors,
            object,
            "",
            "supportsAuthenticatedExtendedCard",
            "boolean",
            is_bool,
        );

        if let Some(Value::Object(caps)) = object.get("capabilities") {
            for field in ["streaming", "pushNotifications", "stateTransitionHistory"] {
                optional(&mut errors, caps, "capabilities.", field, "boolean", is_bool);
            }
        }

        if let Some(Value::Array(skills)) = object.get("skills") {
            for (i, skill) in skills.iter().enumerate() {
                let prefix = format!("skills[{i}].");
                match skill.as_object() {
                    Some(s) => {
                        for field in ["id", "name", "description"] {
                            require(&mut errors, s, &prefix, field, "string", is_string);
                        }
                        require(
                            &mut errors,
                            s,
                            &prefix,
                            "tags",
                            "array of strings",
                            is_string_array,
                        );
                    }
                    None => errors.push(FieldError::new(
                        format!("skills[{i}]"),
                        format!(
                            "expected object, got {}",
                            crate::utils::json::type_name(skill)
                        ),
                    )),
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        serde_json::from_value(doc).map_err(|e| vec![FieldError::new("$", e.to_string())])
    }

    /// URL of the first declared interface speaking `transport`.
    ///
    /// The preferred transport at the primary URL is consulted first, then
    /// the additional interfaces in declaration order.
    pub fn interface_url(&self, transport: &str) -> Option<&str> {
        if self.preferred_transport == transport && !self.url.is_empty() {
            return Some(&self.url);
        }
        self.additional_interfaces
            .iter()
            .flatten()
            .find(|iface| iface.transport == transport)
            .map(|iface| iface.url.as_str())
    }
}

// ============================================================================
// Message, Task & Push Notification payloads
// ============================================================================

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the client/user.
    User,
    /// Message from the agent.
    Agent,
}

/// A content part within a message, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Part {
    /// A text content part. Discriminator: `"text"`.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
    /// A structured data content part. Discriminator: `"data"`.
    #[serde(rename = "data")]
    Data {
        /// Arbitrary structured data.
        data: Value,
    },
}

fn kind_message() -> String {
    "message".to_string()
}

fn kind_task() -> String {
    "task".to_string()
}

fn kind_status_update() -> String {
    "status-update".to_string()
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub message_id: String,

    /// Who sent this message.
    pub role: Role,

    /// Discriminator field — always "message".
    #[serde(default = "kind_message")]
    pub kind: String,

    /// Content parts of the message.
    pub parts: Vec<Part>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Message {
    /// Create a new user message with text content.
    pub fn user(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Message {
            message_id: message_id.into(),
            role: Role::User,
            kind: kind_message(),
            parts: vec![Part::Text { text: text.into() }],
            context_id: None,
            task_id: None,
        }
    }

    /// Create a new agent message with text content.
    pub fn agent(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Message {
            role: Role::Agent,
            ..Message::user(message_id, text)
        }
    }
}

/// The lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
    Canceled,
    InputRequired,
    Rejected,
    AuthRequired,
    Unknown,
}

impl TaskState {
    /// Whether the task can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled | TaskState::Rejected
        )
    }
}

/// Current status of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// The current state.
    pub state: TaskState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// ISO-8601 timestamp of when this status was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TaskStatus {
    /// Status in `state`, stamped with the current time.
    pub fn now(state: TaskState) -> Self {
        TaskStatus {
            state,
            message: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// A task — the server-side handle for a long-running unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: String,

    /// Context identifier (groups related tasks/messages).
    pub context_id: String,

    /// Discriminator field — always "task".
    #[serde(default = "kind_task")]
    pub kind: String,

    /// Current task status.
    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,
}

impl Task {
    /// A fresh task in `state` with newly generated ids.
    pub fn new(state: TaskState) -> Self {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            context_id: uuid::Uuid::new_v4().to_string(),
            kind: kind_task(),
            status: TaskStatus::now(state),
            history: None,
        }
    }
}

/// Notification that a task's status has changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    /// Discriminator field — always "status-update".
    #[serde(default = "kind_status_update")]
    pub kind: String,
    pub status: TaskStatus,
    /// Whether this is the last event of the stream.
    #[serde(rename = "final")]
    pub r#final: bool,
}

impl TaskStatusUpdateEvent {
    /// Status update for `task` carrying its current status.
    pub fn for_task(task: &Task, r#final: bool) -> Self {
        TaskStatusUpdateEvent {
            task_id: task.id.clone(),
            context_id: task.context_id.clone(),
            kind: kind_status_update(),
            status: task.status.clone(),
            r#final,
        }
    }
}

/// Configuration for a `message/send` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageConfiguration {
    /// Whether the request should block until the task completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_output_modes: Option<Vec<String>>,
}

/// Parameters for `message/send` and `message/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    /// The message to send.
    pub message: Message,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<SendMessageConfiguration>,
}

impl SendMessageParams {
    /// Minimal single-text-part user message.
    pub fn text(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        SendMessageParams {
            message: Message::user(message_id, text),
            configuration: None,
        }
    }

    /// Attach `blocking` to the send configuration (builder-style).
    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.configuration
            .get_or_insert_with(SendMessageConfiguration::default)
            .blocking = Some(blocking);
        self
    }
}

/// Authentication information for push notification delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationAuthenticationInfo {
    /// Supported authentication schemes (e.g. ["Bearer"]).
    pub schemes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// Configuration for push notification delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// URL to deliver notifications to.
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<PushNotificationAuthenticationInfo>,
}

/// Push notification config bound to a specific task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPushNotificationConfig {
    /// Task this config applies to.
    pub task_id: String,

    /// The push notification configuration details.
    pub push_notification_config: PushNotificationConfig,
}

// ============================================================================
// JSON-RPC Foundation
// ============================================================================

/// A JSON-RPC 2.0 request/notification ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    /// String identifier.
    String(String),
    /// Numeric identifier.
    Number(i64),
    /// Null.
    Null,
}

impl From<&str> for JsonRpcId {
    fn from(s: &str) -> Self {
        JsonRpcId::String(s.to_string())
    }
}

impl From<String> for JsonRpcId {
    fn from(s: String) -> Self {
        JsonRpcId::String(s)
    }
}

impl From<i64> for JsonRpcId {
    fn from(n: i64) -> Self {
        JsonRpcId::Number(n)
    }
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version — always "2.0".
    pub jsonrpc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonRpcId>,

    /// Method name.
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(id: impl Into<JsonRpcId>, method: impl Into<String>, params: Option<Value>) -> Self {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Request whose params are serialized from a typed value.
    pub fn with_params<P: Serialize>(
        id: impl Into<JsonRpcId>,
        method: impl Into<String>,
        params: &P,
    ) -> ProbeResult<Self> {
        Ok(Self::new(id, method, Some(serde_json::to_value(params)?)))
    }

    /// The request as a JSON value ready to POST.
    pub fn to_value(&self) -> Value {
        // Serializing plain strings and values cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,

    /// Human-readable error message.
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Error object with no data.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        JsonRpcError {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<JsonRpcError> for ProbeError {
    fn from(err: JsonRpcError) -> Self {
        ProbeError::JsonRpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

/// A JSON-RPC 2.0 response envelope, as sent by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version — always "2.0".
    pub jsonrpc: String,

    pub id: Option<JsonRpcId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a successful JSON-RPC response.
    pub fn success(id: Option<JsonRpcId>, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error JSON-RPC response.
    pub fn error(id: Option<JsonRpcId>, error: JsonRpcError) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A parsed JSON-RPC reply: either a result or an error envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcReply {
    /// `result` member of a success envelope.
    Success(Value),
    /// `error` member of an error envelope.
    Error(JsonRpcError),
}

impl JsonRpcReply {
    /// Interpret a JSON body as a JSON-RPC 2.0 response envelope.
    ///
    /// The envelope must be an object with `"jsonrpc": "2.0"` and exactly one
    /// of a well-formed `error` object or a `result` member.
    pub fn from_value(value: &Value) -> ProbeResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ProbeError::InvalidResponse(format!(
                "JSON-RPC response must be an object, got {}",
                crate::utils::json::type_name(value)
            ))
        })?;

        match object.get("jsonrpc").and_then(Value::as_str) {
            Some("2.0") => {}
            other => {
                return Err(ProbeError::InvalidResponse(format!(
                    "JSON-RPC version must be \"2.0\", got {}",
                    other.unwrap_or("nothing")
                )))
            }
        }

        if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
            let error: JsonRpcError = serde_json::from_value(error.clone()).map_err(|e| {
                ProbeError::InvalidResponse(format!("malformed JSON-RPC error object: {e}"))
            })?;
            return Ok(JsonRpcReply::Error(error));
        }

        object
            .get("result")
            .cloned()
            .map(JsonRpcReply::Success)
            .ok_or_else(|| {
                ProbeError::InvalidResponse(
                    "JSON-RPC response has neither 'result' nor 'error'".to_string(),
                )
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_card() -> Value {
        json!({
            "protocolVersion": "0.3.0",
            "name": "Agent",
            "description": "Does things",
            "url": "http://localhost:9999/a2a",
            "preferredTransport": "JSONRPC",
            "version": "1.0.0",
            "capabilities": {"streaming": true},
            "defaultInputModes": ["text/plain"],
            "defaultOutputModes": ["text/plain"],
            "skills": [{"id": "s", "name": "S", "description": "d", "tags": ["t"]}]
        })
    }

    #[test]
    fn error_object_converts_to_probe_error() {
        let mut err = JsonRpcError::new(-32001, "Task not found");
        err.data = Some(json!({"id": "t-1"}));
        let probe = ProbeError::from(err);
        assert_eq!(probe.to_string(), "JSON-RPC error -32001: Task not found");
        assert!(matches!(
            probe,
            ProbeError::JsonRpc { code: -32001, data: Some(_), .. }
        ));
    }

    #[test]
    fn valid_card_parses() {
        let card = AgentCard::validate(&minimal_card()).unwrap();
        assert_eq!(card.name, "Agent");
        assert_eq!(card.capabilities.streaming, Some(true));
        assert_eq!(card.skills.len(), 1);
    }

    #[test]
    fn defaults_apply_when_absent() {
        let mut raw = minimal_card();
        raw.as_object_mut().unwrap().remove("protocolVersion");
        raw.as_object_mut().unwrap().remove("preferredTransport");
        let card = AgentCard::validate(&raw).unwrap();
        assert_eq!(card.protocol_version, "0.3.0");
        assert_eq!(card.preferred_transport, "JSONRPC");
    }

    #[test]
    fn snake_case_aliases_resolve() {
        let raw = json!({
            "protocol_version": "0.3.0",
            "name": "Agent",
            "description": "d",
            "url": "http://x",
            "preferred_transport": "HTTP+JSON",
            "version": "1.0.0",
            "capabilities": {"push_notifications": true},
            "default_input_modes": ["text/plain"],
            "default_output_modes": ["text/plain"],
            "skills": [],
            "supports_authenticated_extended_card": true
        });
        let card = AgentCard::validate(&raw).unwrap();
        assert_eq!(card.preferred_transport, "HTTP+JSON");
        assert_eq!(card.capabilities.push_notifications, Some(true));
        assert_eq!(card.supports_authenticated_extended_card, Some(true));
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let raw = json!({"protocolVersion": "0.3.0", "protocol_version": "9.9"});
        let doc = normalize_card_aliases(&raw);
        assert_eq!(doc["protocolVersion"], "0.3.0");
        assert!(doc.get("protocol_version").is_none());
    }

    #[test]
    fn validation_lists_every_missing_field() {
        let raw = json!({"name": "Agent", "capabilities": {"streaming": "yes"}});
        let errors = AgentCard::validate(&raw).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        for expected in [
            "description",
            "url",
            "version",
            "defaultInputModes",
            "defaultOutputModes",
            "skills",
            "capabilities.streaming",
        ] {
            assert!(fields.contains(&expected), "missing {expected} in {fields:?}");
        }
        assert!(!fields.contains(&"name"));
    }

    #[test]
    fn validation_reports_skill_fields() {
        let mut raw = minimal_card();
        raw["skills"] = json!([{"id": "a", "name": "A", "tags": "nope"}, 7]);
        let errors = AgentCard::validate(&raw).unwrap_err();
        let fields: Vec<String> = errors.iter().map(|e| e.field.clone()).collect();
        assert!(fields.contains(&"skills[0].description".to_string()));
        assert!(fields.contains(&"skills[0].tags".to_string()));
        assert!(fields.contains(&"skills[1]".to_string()));
    }

    #[test]
    fn non_object_document_is_rejected() {
        let errors = AgentCard::validate(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "$");
    }

    #[test]
    fn interface_url_prefers_primary() {
        let mut raw = minimal_card();
        raw["additionalInterfaces"] = json!([
            {"url": "http://localhost:9999/a2a", "transport": "JSONRPC"},
            {"url": "http://localhost:9999", "transport": "HTTP+JSON"}
        ]);
        let card = AgentCard::validate(&raw).unwrap();
        assert_eq!(
            card.interface_url("JSONRPC"),
            Some("http://localhost:9999/a2a")
        );
        assert_eq!(
            card.interface_url("HTTP+JSON"),
            Some("http://localhost:9999")
        );
        assert_eq!(card.interface_url("GRPC"), None);
    }

    #[test]
    fn reply_parsing() {
        let ok = JsonRpcReply::from_value(&json!({"jsonrpc": "2.0", "id": 1, "result": {"kind": "task"}}))
            .unwrap();
        assert!(matches!(ok, JsonRpcReply::Success(_)));

        let err = JsonRpcReply::from_value(&json!({
            "jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "nope"}
        }))
        .unwrap();
        assert_eq!(err, JsonRpcReply::Error(JsonRpcError::new(-32601, "nope")));

        assert!(JsonRpcReply::from_value(&json!({"jsonrpc": "1.0", "result": 1})).is_err());
        assert!(JsonRpcReply::from_value(&json!({"jsonrpc": "2.0", "id": 1})).is_err());
        assert!(JsonRpcReply::from_value(&json!("text")).is_err());
        assert!(JsonRpcReply::from_value(&json!({
            "jsonrpc": "2.0", "id": 1, "error": {"message": "no code"}
        }))
        .is_err());
    }

    #[test]
    fn send_params_wire_format() {
        let params = SendMessageParams::text("msg-1", "ping").with_blocking(false);
        let v = serde_json::to_value(&params).unwrap();
        assert_eq!(v["message"]["messageId"], "msg-1");
        assert_eq!(v["message"]["role"], "user");
        assert_eq!(v["message"]["kind"], "message");
        assert_eq!(v["message"]["parts"][0]["kind"], "text");
        assert_eq!(v["message"]["parts"][0]["text"], "ping");
        assert_eq!(v["configuration"]["blocking"], false);
    }

    #[test]
    fn status_update_wire_format() {
        let task = Task::new(TaskState::Working);
        let v = serde_json::to_value(TaskStatusUpdateEvent::for_task(&task, true)).unwrap();
        assert_eq!(v["kind"], "status-update");
        assert_eq!(v["taskId"], task.id.as_str());
        assert_eq!(v["final"], true);
        assert_eq!(v["status"]["state"], "working");
    }
}
