//! Decoding of the backend's NPC action envelope.
//!
//! The envelope is `{success, llm_response, rounds: [{tools_used: [...]}],
//! error?}`. Every field is optional on the way in: missing or mistyped
//! values fall back to defaults so schema drift on the backend never costs a
//! game tick. Only a body that is not a JSON object is rejected.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{json_kind, NpcError, Result};

const UNREPORTED_FAILURE: &str = "backend reported failure without an error message";

/// One tool invocation made by the NPC during inference.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ToolCall {
    pub name: String,
    pub args: Map<String, Value>,
    pub success: bool,
    /// Human-readable tool output. `None` means nothing was reported, which
    /// is different from `Some("")`.
    pub response: Option<String>,
    /// Secondary result channel, meaning defined by the tool.
    pub result: Option<String>,
}

impl ToolCall {
    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            name: obj
                .get("tool_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            args: obj
                .get("args")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            success: obj.get("success").and_then(Value::as_bool).unwrap_or(false),
            response: optional_text(obj.get("response")),
            result: optional_text(obj.get("result")),
        }
    }

    /// A string argument by name.
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }
}

/// One pass of backend inference.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Round {
    pub tool_calls: Vec<ToolCall>,
    /// Every round field other than `tools_used`, kept verbatim.
    pub raw: Map<String, Value>,
}

impl Round {
    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let tool_calls = obj
            .get("tools_used")
            .and_then(Value::as_array)
            .map(|calls| calls.iter().map(ToolCall::from_value).collect())
            .unwrap_or_default();
        let raw = obj
            .iter()
            .filter(|(key, _)| key.as_str() != "tools_used")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self { tool_calls, raw }
    }
}

/// Typed result of one NPC action.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActionResult {
    pub success: bool,
    /// Free-text reply, trimmed. May be empty.
    pub text: String,
    pub rounds: Vec<Round>,
    /// Set iff `success` is false or the backend reported an error.
    pub error: Option<String>,
    /// The decoded payload as received.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl ActionResult {
    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| NpcError::MalformedResponse(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Decode an already-parsed payload.
    pub fn from_value(value: Value) -> Result<Self> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(NpcError::MalformedResponse(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let success = obj.get("success").and_then(Value::as_bool).unwrap_or(false);
        let text = obj
            .get("llm_response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let rounds = obj
            .get("rounds")
            .and_then(Value::as_array)
            .map(|rounds| rounds.iter().map(Round::from_value).collect())
            .unwrap_or_default();
        let mut error = optional_text(obj.get("error")).filter(|e| !e.is_empty());
        if !success && error.is_none() {
            error = Some(UNREPORTED_FAILURE.to_string());
        }

        Ok(Self {
            success,
            text,
            rounds,
            error,
            raw: obj,
        })
    }

    /// A failed result carrying `error`, for failures that never produced a body.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Every tool call across all rounds, in round order then call order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.rounds.iter().flat_map(|round| round.tool_calls.iter())
    }

    /// Tool calls with the given name, in order.
    pub fn calls_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ToolCall> {
        self.tool_calls().filter(move |call| call.name == name)
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
