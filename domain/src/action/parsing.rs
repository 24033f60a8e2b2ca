//! Action parsing from free-form decision-source output.
//!
//! Decision sources are asked for a bare JSON action but routinely wrap it in
//! Markdown fences, nest it under an `action` key or rename fields. The
//! normalizations here accept those shapes; anything still malformed is an
//! [`ActionParseError`], which the committee treats like a timeout.
//!
//! | Input shape | Normalization |
//! |-------------|---------------|
//! | ```` ```json {...} ``` ```` | fence stripped |
//! | `{"action": {...}}` | inner object used |
//! | `{"action": "click", ...}` | `action` becomes `type` |
//! | `{"action_type": "click", ...}` | `action_type` becomes `type` |
//! | `{"action_input": {...}}` | merged into the top level |
//! | `{"method": "GET", ...}` | `method` dropped |

use super::entities::{Action, RawAction};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced when decoding an action
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionParseError {
    #[error("No JSON object found in output")]
    NoJson,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Expected a JSON object")]
    NotAnObject,

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown action type: {0}")]
    UnknownType(String),

    #[error("Action target cannot be empty")]
    EmptyTarget,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Parse a decision source's raw output into an [`Action`].
///
/// # Example
///
/// ```
/// use committee_domain::action::{parse_action, ActionType};
///
/// let output = "```json\n{\"action\": {\"type\": \"click\", \"target\": \"#buy\"}}\n```";
/// let action = parse_action(output).unwrap();
/// assert_eq!(action.action_type(), ActionType::Click);
/// assert_eq!(action.target(), "#buy");
/// ```
pub fn parse_action(output: &str) -> Result<Action, ActionParseError> {
    let json = extract_json_object(output).ok_or(ActionParseError::NoJson)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| ActionParseError::InvalidJson(e.to_string()))?;
    action_from_value(value)
}

/// Decode an already-parsed JSON value into an [`Action`], applying the same
/// normalizations as [`parse_action`].
pub fn action_from_value(value: Value) -> Result<Action, ActionParseError> {
    let Value::Object(map) = value else {
        return Err(ActionParseError::NotAnObject);
    };
    let map = normalize(map);

    let action_type = match map.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ActionParseError::InvalidPayload("'type' must be a string".into())),
        None => return Err(ActionParseError::MissingField("type")),
    };
    let target = match map.get("target") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(ActionParseError::InvalidPayload("'target' must be a string".into())),
        None => return Err(ActionParseError::MissingField("target")),
    };

    Action::try_from(RawAction {
        action_type,
        target,
        payload: map.get("payload").cloned(),
    })
}

fn normalize(mut map: Map<String, Value>) -> Map<String, Value> {
    match map.remove("action") {
        Some(Value::Object(inner)) => map = inner,
        Some(Value::String(action)) => {
            map.entry("type").or_insert(Value::String(action));
        }
        Some(other) => {
            map.insert("action".to_string(), other);
        }
        None => {}
    }

    if !map.contains_key("type")
        && let Some(action_type) = map.remove("action_type")
    {
        map.insert("type".to_string(), action_type);
    }

    if let Some(Value::Object(input)) = map.remove("action_input") {
        for (key, value) in input {
            if key == "target" {
                map.insert(key, value);
            } else {
                map.entry(key).or_insert(value);
            }
        }
    }

    map.remove("method");
    map
}

/// Locate the JSON object in model output: fenced block first, then the
/// outermost brace pair.
fn extract_json_object(output: &str) -> Option<&str> {
    let trimmed = output.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let block = body[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::entities::ActionType;

    #[test]
    fn test_parse_plain_json() {
        let action = parse_action(r##"{"type": "navigate", "target": "/products", "payload": null}"##)
            .unwrap();
        assert_eq!(action.action_type(), ActionType::Navigate);
        assert_eq!(action.target(), "/products");
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let output = r##"Sure! Here is my action: {"type": "click", "target": ".add-to-cart"} Hope that helps."##;
        let action = parse_action(output).unwrap();
        assert_eq!(action.target(), ".add-to-cart");
    }

    #[test]
    fn test_parse_fenced_block() {
        let output = "```json\n{\"type\": \"fill\", \"target\": \"#q\", \"payload\": {\"value\": \"shoes\"}}\n```";
        let action = parse_action(output).unwrap();
        assert_eq!(action.fill_value(), Some("shoes"));
    }

    #[test]
    fn test_action_string_becomes_type() {
        let action = parse_action(r##"{"action": "click", "target": "#go"}"##).unwrap();
        assert_eq!(action.action_type(), ActionType::Click);
    }

    #[test]
    fn test_action_type_alias() {
        let action = parse_action(r##"{"action_type": "scroll", "target": "down"}"##).unwrap();
        assert_eq!(action.action_type(), ActionType::Scroll);
    }

    #[test]
    fn test_action_input_merged() {
        let action = parse_action(
            r##"{"type": "fill", "target": "body", "action_input": {"target": "#email", "payload": {"value": "a@b.c"}}, "method": "POST"}"##,
        )
        .unwrap();
        assert_eq!(action.target(), "#email");
        assert_eq!(action.fill_value(), Some("a@b.c"));
    }

    #[test]
    fn test_missing_type_is_error_not_report() {
        let err = parse_action(r##"{"target": "/"}"##).unwrap_err();
        assert_eq!(err, ActionParseError::MissingField("type"));
    }

    #[test]
    fn test_missing_target() {
        let err = parse_action(r##"{"type": "click"}"##).unwrap_err();
        assert_eq!(err, ActionParseError::MissingField("target"));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(parse_action("I think we should click buy").unwrap_err(), ActionParseError::NoJson);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_action("{type: click}"),
            Err(ActionParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_unknown_type() {
        assert!(matches!(
            parse_action(r##"{"type": "hover", "target": "#x"}"##),
            Err(ActionParseError::UnknownType(_))
        ));
    }
}
