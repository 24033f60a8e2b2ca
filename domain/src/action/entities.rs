//! Action entities
//!
//! [`Action`] is the contract shared by every component of a session: proposers
//! emit it, the committee votes on it, guardrails rewrite it and the executor
//! performs it. The per-type payload is a sum type ([`ActionPayload`]) so that
//! the fields each action type carries are known statically.

use super::parsing::ActionParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of UI action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Navigate,
    Click,
    Fill,
    Scroll,
    Tap,
    Upload,
    Report,
}

impl ActionType {
    pub const ALL: [ActionType; 7] = [
        ActionType::Navigate,
        ActionType::Click,
        ActionType::Fill,
        ActionType::Scroll,
        ActionType::Tap,
        ActionType::Upload,
        ActionType::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Navigate => "navigate",
            ActionType::Click => "click",
            ActionType::Fill => "fill",
            ActionType::Scroll => "scroll",
            ActionType::Tap => "tap",
            ActionType::Upload => "upload",
            ActionType::Report => "report",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ActionParseError::UnknownType(s.to_string()))
    }
}

/// Type-specific action fields
///
/// Keys that a payload carries on the wire but that are not modeled here are
/// kept in [`Action::extra`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPayload {
    Navigate,
    Click { selector: Option<String> },
    Fill { selector: Option<String>, value: String },
    Scroll { pixels: Option<i64> },
    Tap { selector: Option<String> },
    Upload { file_path: Option<String>, field: Option<String> },
    Report { issue: Option<String> },
}

impl ActionPayload {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionPayload::Navigate => ActionType::Navigate,
            ActionPayload::Click { .. } => ActionType::Click,
            ActionPayload::Fill { .. } => ActionType::Fill,
            ActionPayload::Scroll { .. } => ActionType::Scroll,
            ActionPayload::Tap { .. } => ActionType::Tap,
            ActionPayload::Upload { .. } => ActionType::Upload,
            ActionPayload::Report { .. } => ActionType::Report,
        }
    }

    /// Build the typed payload from a wire map, consuming the keys it models.
    fn from_wire(action_type: ActionType, map: &mut Map<String, Value>) -> Result<Self, ActionParseError> {
        let payload = match action_type {
            ActionType::Navigate => ActionPayload::Navigate,
            ActionType::Click => ActionPayload::Click {
                selector: take_string(map, "selector")?,
            },
            ActionType::Fill => ActionPayload::Fill {
                selector: take_string(map, "selector")?,
                value: take_string(map, "value")?.unwrap_or_default(),
            },
            ActionType::Scroll => ActionPayload::Scroll {
                pixels: take_integer(map, "pixels")?,
            },
            ActionType::Tap => ActionPayload::Tap {
                selector: take_string(map, "selector")?,
            },
            ActionType::Upload => ActionPayload::Upload {
                file_path: take_string(map, "file_path")?,
                field: take_string(map, "field")?,
            },
            ActionType::Report => ActionPayload::Report {
                issue: take_string(map, "issue")?,
            },
        };
        Ok(payload)
    }

    fn write_wire(&self, map: &mut Map<String, Value>) {
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        };
        match self {
            ActionPayload::Navigate => {}
            ActionPayload::Click { selector } | ActionPayload::Tap { selector } => {
                put("selector", selector.clone().map(Value::String));
            }
            ActionPayload::Fill { selector, value } => {
                put("selector", selector.clone().map(Value::String));
                put("value", Some(Value::String(value.clone())));
            }
            ActionPayload::Scroll { pixels } => {
                put("pixels", pixels.map(Value::from));
            }
            ActionPayload::Upload { file_path, field } => {
                put("file_path", file_path.clone().map(Value::String));
                put("field", field.clone().map(Value::String));
            }
            ActionPayload::Report { issue } => {
                put("issue", issue.clone().map(Value::String));
            }
        }
    }
}

/// Accept strings as-is and stringify scalar numbers/booleans; models are not
/// consistent about quoting.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, ActionParseError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(ActionParseError::InvalidPayload(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
    }
}

fn take_integer(map: &mut Map<String, Value>, key: &str) -> Result<Option<i64>, ActionParseError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| ActionParseError::InvalidPayload(format!("'{}' out of range", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ActionParseError::InvalidPayload(format!("'{}' is not an integer: {}", key, s))),
        Some(other) => Err(ActionParseError::InvalidPayload(format!(
            "'{}' must be an integer, got {}",
            key, other
        ))),
    }
}

/// Grouping key for actions: `(type, target)`
///
/// Two actions with the same key are considered "the same action" for voting,
/// revision tracking and loop detection, regardless of payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub target: String,
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.action_type, self.target)
    }
}

/// Wire representation of an action
///
/// `{"type": "click", "target": "#add", "payload": {"selector": "#add"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub target: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// A single UI action (immutable value)
///
/// # Example
///
/// ```
/// use committee_domain::action::{Action, ActionType};
///
/// let action = Action::fill("#email", "test@example.com");
/// assert_eq!(action.action_type(), ActionType::Fill);
/// assert_eq!(action.fill_value(), Some("test@example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub struct Action {
    target: String,
    payload: ActionPayload,
    extra: Map<String, Value>,
}

impl Action {
    /// Create an action, rejecting an empty target
    pub fn new(target: impl Into<String>, payload: ActionPayload) -> Result<Self, ActionParseError> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(ActionParseError::EmptyTarget);
        }
        Ok(Self {
            target,
            payload,
            extra: Map::new(),
        })
    }

    /// Backs the infallible constructors below, which are meant for
    /// literal targets only. They do not reject an empty target; use
    /// [`Action::new`] for anything decoded or user supplied. An empty
    /// target built here is reported as `missing_target` by validation.
    fn build(target: impl Into<String>, payload: ActionPayload) -> Self {
        Self {
            target: target.into(),
            payload,
            extra: Map::new(),
        }
    }

    pub fn navigate(target: impl Into<String>) -> Self {
        Self::build(target, ActionPayload::Navigate)
    }

    pub fn click(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::build(
            selector.clone(),
            ActionPayload::Click {
                selector: Some(selector),
            },
        )
    }

    pub fn fill(selector: impl Into<String>, value: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::build(
            selector.clone(),
            ActionPayload::Fill {
                selector: Some(selector),
                value: value.into(),
            },
        )
    }

    pub fn scroll(direction: impl Into<String>, pixels: Option<i64>) -> Self {
        Self::build(direction, ActionPayload::Scroll { pixels })
    }

    pub fn tap(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::build(
            selector.clone(),
            ActionPayload::Tap {
                selector: Some(selector),
            },
        )
    }

    pub fn upload(target: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self::build(
            target,
            ActionPayload::Upload {
                file_path: Some(file_path.into()),
                field: None,
            },
        )
    }

    pub fn report(target: impl Into<String>, issue: Option<String>) -> Self {
        Self::build(target, ActionPayload::Report { issue })
    }

    /// Attach an untyped payload entry (e.g. `headers` for REST executors)
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn action_type(&self) -> ActionType {
        self.payload.action_type()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn key(&self) -> ActionKey {
        ActionKey {
            action_type: self.action_type(),
            target: self.target.clone(),
        }
    }

    /// Same `(type, target)`, ignoring payload
    pub fn same_key(&self, other: &Action) -> bool {
        self.action_type() == other.action_type() && self.target == other.target
    }

    /// Same payload (typed fields and extra keys), ignoring target
    pub fn same_payload(&self, other: &Action) -> bool {
        self.payload == other.payload && self.extra == other.extra
    }

    pub fn is_report(&self) -> bool {
        self.action_type() == ActionType::Report
    }

    /// Value typed into a field, for fill actions
    pub fn fill_value(&self) -> Option<&str> {
        match &self.payload {
            ActionPayload::Fill { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Issue text of a report action
    pub fn report_issue(&self) -> Option<&str> {
        match &self.payload {
            ActionPayload::Report { issue } => issue.as_deref(),
            _ => None,
        }
    }

    /// All string content carried by the action (target, typed fields and
    /// string extras, one level deep)
    pub fn text_fields(&self) -> Vec<String> {
        let mut texts = vec![self.target.clone()];
        if let Some(Value::Object(map)) = RawAction::from(self.clone()).payload {
            for value in map.values() {
                match value {
                    Value::String(s) => texts.push(s.clone()),
                    Value::Object(nested) => texts.extend(
                        nested
                            .values()
                            .filter_map(|v| v.as_str().map(str::to_string)),
                    ),
                    _ => {}
                }
            }
        }
        texts
    }

    /// Payload as it travels on the wire (`None` when empty)
    pub fn wire_payload(&self) -> Option<Map<String, Value>> {
        match RawAction::from(self.clone()).payload {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.action_type(), self.target)
    }
}

impl TryFrom<RawAction> for Action {
    type Error = ActionParseError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let action_type: ActionType = raw.action_type.parse()?;
        let mut map = match raw.payload {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(ActionParseError::InvalidPayload(format!(
                    "payload must be an object, got {}",
                    other
                )));
            }
        };
        let payload = ActionPayload::from_wire(action_type, &mut map)?;
        let mut action = Action::new(raw.target, payload)?;
        action.extra = map;
        Ok(action)
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let mut map = Map::new();
        action.payload.write_wire(&mut map);
        map.extend(action.extra);
        RawAction {
            action_type: action.payload.action_type().to_string(),
            target: action.target,
            payload: if map.is_empty() {
                None
            } else {
                Some(Value::Object(map))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_type_parse() {
        assert_eq!("click".parse::<ActionType>().unwrap(), ActionType::Click);
        assert_eq!(" Navigate ".parse::<ActionType>().unwrap(), ActionType::Navigate);
        assert!(matches!(
            "type".parse::<ActionType>(),
            Err(ActionParseError::UnknownType(t)) if t == "type"
        ));
    }

    #[test]
    fn test_deserialize_fill() {
        let action: Action = serde_json::from_value(json!({
            "type": "fill",
            "target": "#minPrice",
            "payload": {"selector": "#minPrice", "value": 10}
        }))
        .unwrap();

        assert_eq!(action.action_type(), ActionType::Fill);
        assert_eq!(action.fill_value(), Some("10"));
        assert!(action.extra().is_empty());
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let result: Result<Action, _> = serde_json::from_value(json!({
            "type": "hover",
            "target": "#menu",
            "payload": null
        }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unknown action type"), "{err}");
    }

    #[test]
    fn test_empty_target_rejected() {
        let result: Result<Action, _> =
            serde_json::from_value(json!({"type": "click", "target": "  "}));
        assert!(result.is_err());
        assert!(matches!(
            Action::new("", ActionPayload::Navigate),
            Err(ActionParseError::EmptyTarget)
        ));

        // Literal constructors accept it, but it cannot be decoded back
        let literal = Action::navigate("");
        assert_eq!(literal.target(), "");
        let wire = serde_json::to_value(&literal).unwrap();
        assert!(serde_json::from_value::<Action>(wire).is_err());
    }

    #[test]
    fn test_extra_keys_survive_serialization() {
        let action: Action = serde_json::from_value(json!({
            "type": "tap",
            "target": "/api/orders",
            "payload": {"json": {"quantity": 2}, "headers": {"X-Test": "1"}}
        }))
        .unwrap();

        assert_eq!(action.extra().len(), 2);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["payload"]["json"]["quantity"], 2);
        assert_eq!(value["type"], "tap");
    }

    #[test]
    fn test_navigate_serializes_null_payload() {
        let value = serde_json::to_value(Action::navigate("/products")).unwrap();
        assert_eq!(value, json!({"type": "navigate", "target": "/products", "payload": null}));
    }

    #[test]
    fn test_same_key_ignores_payload() {
        let a = Action::fill("#q", "shoes");
        let b = Action::fill("#q", "boots");
        assert!(a.same_key(&b));
        assert!(!a.same_payload(&b));
        assert_eq!(a.key().to_string(), "fill::#q");
    }

    #[test]
    fn test_text_fields_include_nested_strings() {
        let action = Action::fill("#comment", "<script>")
            .with_extra("json", json!({"note": "hello", "count": 3}));
        let texts = action.text_fields();
        assert!(texts.contains(&"#comment".to_string()));
        assert!(texts.contains(&"<script>".to_string()));
        assert!(texts.contains(&"hello".to_string()));
    }

    #[test]
    fn test_scroll_pixels_from_string() {
        let action: Action = serde_json::from_value(json!({
            "type": "scroll", "target": "down", "payload": {"pixels": "500"}
        }))
        .unwrap();
        assert_eq!(action.payload(), &ActionPayload::Scroll { pixels: Some(500) });
    }
}
