//! Helpers for inspecting untyped JSON returned by a target.

use serde_json::Value;

/// Loose truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
///
/// Discovery documents are checked for "present and non-empty" this way, so a
/// field set to an empty string counts as missing.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Truthiness of an optional field lookup.
pub fn is_present(value: Option<&Value>) -> bool {
    value.map(is_truthy).unwrap_or(false)
}

/// JSON type name used in outcome messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read the `kind` discriminator and `id` of a result object.
pub fn kind_and_id(value: &Value) -> (Option<&str>, Option<&str>) {
    (
        value.get("kind").and_then(Value::as_str),
        value.get("id").and_then(Value::as_str),
    )
}

/// Task id carried by a `"task"`-shaped object, if non-empty.
///
/// Accepts both the flat form (`{"kind": "task", "id": ...}`) and the wrapped
/// form some HTTP+JSON servers return (`{"task": {"id": ...}}`).
pub fn task_id_of(value: &Value) -> Option<String> {
    if let (Some("task"), Some(id)) = kind_and_id(value) {
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    value
        .get("task")
        .and_then(|t| t.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// Task id referenced by one streamed JSON-RPC event.
///
/// A `Task` result carries it as `id`; status/artifact update events carry it
/// as `taskId`. A bare `Message` usually carries neither.
pub fn task_id_of_stream_result(result: &Value) -> Option<String> {
    if let (Some("task"), Some(id)) = kind_and_id(result) {
        return Some(id.to_string());
    }
    result
        .get("taskId")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Render a list of ids as `[a, b]` for messages, in input order.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let joined: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    format!("[{}]", joined.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([1])));
        assert!(is_truthy(&json!(true)));
        assert!(!is_present(None));
    }

    #[test]
    fn task_ids_flat_and_wrapped() {
        assert_eq!(
            task_id_of(&json!({"kind": "task", "id": "t1"})).as_deref(),
            Some("t1")
        );
        assert_eq!(
            task_id_of(&json!({"task": {"id": "t2"}})).as_deref(),
            Some("t2")
        );
        assert!(task_id_of(&json!({"kind": "task", "id": ""})).is_none());
        assert!(task_id_of(&json!({"kind": "message", "messageId": "m"})).is_none());
    }

    #[test]
    fn stream_result_task_ids() {
        assert_eq!(
            task_id_of_stream_result(&json!({"kind": "task", "id": "t"})).as_deref(),
            Some("t")
        );
        assert_eq!(
            task_id_of_stream_result(&json!({"kind": "status-update", "taskId": "u"})).as_deref(),
            Some("u")
        );
        assert!(task_id_of_stream_result(&json!({"kind": "message"})).is_none());
    }

    #[test]
    fn list_formatting() {
        assert_eq!(format_list(&["a", "b"]), "[a, b]");
        assert_eq!(format_list::<&str>(&[]), "[]");
    }
}
