//! Recovery of tool calls a model wrote into its text.
//!
//! Some models ignore the structured tool-call channel and answer with a
//! JSON block instead:
//!
//! ````text
//! I will read the file first.
//! ```json
//! {"name": "read_file", "arguments": {"path": "notes.txt"}}
//! ```
//! ````
//!
//! [`looks_like_tool_call`] is a cheap, permissive detector; a false
//! positive costs nothing more than a failed lookup later.
//! [`parse_tool_calls`] is the pure extraction step.

use serde_json::{Map, Value};
use stepwise_core::ToolCall;
use tracing::debug;
use uuid::Uuid;

const NAME_KEYS: [&str; 3] = ["\"name\"", "\"tool\"", "\"function\""];
const ARGUMENT_KEYS: [&str; 3] = ["arguments", "tool_input", "parameters"];
const FENCE: &str = "```";

/// Does this text look like it embeds a tool call?
pub fn looks_like_tool_call(text: &str) -> bool {
    let has_name_key = NAME_KEYS.iter().any(|key| text.contains(key));
    let structured = text.trim_start().starts_with('{') || text.contains(FENCE);
    has_name_key && structured
}

/// Extract tool calls from free text.
///
/// The first fenced block is tried first. Fences can also appear inside
/// string values (a README written through `write_file`), so bare JSON,
/// or a fenced body that does not parse, falls back to slicing the raw
/// text from its first `{` to its last `}`.
///
/// Returns `None` when no call can be recovered, including when the
/// embedded JSON is malformed.
pub fn parse_tool_calls(text: &str) -> Option<Vec<ToolCall>> {
    let trimmed = text.trim_start();
    let bare = trimmed.starts_with('{') || trimmed.starts_with('[');

    if !bare
        && text.contains(FENCE)
        && let Some(calls) = isolate_json(strip_fences(text)).and_then(calls_in)
    {
        return Some(calls);
    }
    isolate_json(text).and_then(calls_in)
}

fn calls_in(body: &str) -> Option<Vec<ToolCall>> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Embedded tool call is not valid JSON");
            return None;
        }
    };

    let calls: Vec<ToolCall> = match &value {
        Value::Array(items) => items.iter().filter_map(call_from_value).collect(),
        other => call_from_value(other).into_iter().collect(),
    };

    if calls.is_empty() {
        debug!("Embedded JSON carries no tool name");
        None
    } else {
        Some(calls)
    }
}

/// Inner text of the first fenced block, preferring a `json`-tagged one.
fn strip_fences(text: &str) -> &str {
    let open = format!("{FENCE}json");
    let start = match text.find(&open) {
        Some(idx) => idx + open.len(),
        None => match text.find(FENCE) {
            // skip any language tag on the opening line
            Some(idx) => {
                let after = idx + FENCE.len();
                text[after..].find('\n').map_or(after, |nl| after + nl + 1)
            }
            None => return text,
        },
    };
    let inner = &text[start..];
    match inner.find(FENCE) {
        Some(end) => &inner[..end],
        None => inner,
    }
}

/// Slice from the first opening bracket to the last matching closing one.
fn isolate_json(text: &str) -> Option<&str> {
    let (open, close) = if text.trim_start().starts_with('[') {
        ('[', ']')
    } else {
        ('{', '}')
    };
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn call_from_value(value: &Value) -> Option<ToolCall> {
    let object = value.as_object()?;

    let (name, arguments) = match name_of(object) {
        Some(name) => (name, arguments_of(object)),
        None => match object.get("function")? {
            Value::String(name) if !name.trim().is_empty() => {
                (name.trim().to_string(), arguments_of(object))
            }
            Value::Object(nested) => (name_of(nested)?, arguments_of(nested)),
            _ => return None,
        },
    };

    let arguments = correct_aliases(&name, arguments);
    Some(ToolCall::new(
        format!("fallback_{}", Uuid::new_v4().simple()),
        name,
        arguments,
    ))
}

fn name_of(object: &Map<String, Value>) -> Option<String> {
    ["name", "tool"]
        .iter()
        .filter_map(|key| object.get(*key)?.as_str())
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

fn arguments_of(object: &Map<String, Value>) -> String {
    match ARGUMENT_KEYS.iter().find_map(|key| object.get(*key)) {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => "{}".to_string(),
        Some(other) => other.to_string(),
    }
}

/// `read_file` takes `path`; models keep sending `file_path`.
fn correct_aliases(name: &str, arguments: String) -> String {
    if !name.contains("read_file") {
        return arguments;
    }
    let Ok(Value::Object(mut map)) = serde_json::from_str::<Value>(&arguments) else {
        return arguments;
    };
    if map.contains_key("path") {
        return arguments;
    }
    match map.remove("file_path") {
        Some(path) => {
            map.insert("path".into(), path);
            Value::Object(map).to_string()
        }
        None => arguments,
    }
}
