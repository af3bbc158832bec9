//! Notification payload normalization.
//!
//! WUD's webhook body has grown several shapes across releases: the image
//! can be a plain string, an object with a name, or nested under a
//! registry; the tag can sit at the top level or inside a result object.
//! Normalization flattens all of them into one canonical update command.

use serde::Serialize;
use serde_json::Value;

/// Name fields tried in order when looking for the container.
const NAME_KEYS: [&str; 3] = ["name", "container", "displayName"];

/// Canonical update command handed to the external handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateCommand {
    pub container: String,
    pub image: String,
    pub tag: String,
}

/// A payload with no usable container name cannot be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingTarget;

/// Normalize a notification payload into an update command.
///
/// `prefixes` is the ordered list of compose-project prefixes stripped
/// from the raw container name; the first match in list order wins, and a
/// name matching none is kept as-is. Missing image or tag information
/// degrades to "unknown" rather than rejecting the notification.
pub fn normalize(payload: &Value, prefixes: &[String]) -> Result<UpdateCommand, MissingTarget> {
    let raw_name = NAME_KEYS
        .iter()
        .find_map(|key| non_empty_str(payload.get(*key)))
        .ok_or(MissingTarget)?;

    let image = match payload.get("image") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => non_empty_str(obj.get("name"))
            .or_else(|| obj.get("registry").and_then(|r| non_empty_str(r.get("name")))),
        _ => None,
    };

    let tag = match payload.get("result") {
        Some(Value::Object(result)) => non_empty_str(result.get("tag")),
        _ => non_empty_str(payload.get("tag")),
    };

    Ok(UpdateCommand {
        container: strip_known_prefix(raw_name, prefixes),
        image: image.unwrap_or_else(|| "unknown".to_string()),
        tag: tag.unwrap_or_else(|| "unknown".to_string()),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn strip_known_prefix(name: String, prefixes: &[String]) -> String {
    for prefix in prefixes {
        if let Some(stripped) = name.strip_prefix(prefix.as_str()) {
            return stripped.to_string();
        }
    }
    name
}
