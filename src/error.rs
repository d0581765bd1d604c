//! Error taxonomy for the NPC client.
//!
//! Setup calls (tool registration, NPC creation, listing, deletion) surface
//! these directly. [`Npc::act`](crate::client::Npc::act) never does: it folds
//! them into a failed [`ActionResult`](crate::response::ActionResult).

/// Every way a client call can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NpcError {
    /// A callable was passed to registration without being marked as a tool.
    #[error("function {name} is not marked as a tool")]
    ToolNotDecorated { name: String },

    /// Two tools in one registration batch share a name.
    #[error("duplicate tool name in registration batch: {name}")]
    DuplicateTool { name: String },

    /// Context normalization got a value that is none of the accepted shapes.
    #[error("invalid {field} entry: expected {expected}, got {shape}")]
    InvalidInputShape {
        field: &'static str,
        expected: &'static str,
        shape: String,
    },

    /// The backend accepted NPC creation but returned no usable id.
    #[error("backend did not return npc_id")]
    MissingIdentifier,

    /// The outgoing request could not be built: an unusable id or base URL,
    /// or a body that failed to encode.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body is not a JSON object.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// The transport could not reach the backend.
    #[error("failed to reach backend: {0}")]
    ConnectionFailure(String),

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    BackendFailure { status: u16, message: String },

    #[error("npc not found: {0}")]
    NpcNotFound(String),

    #[error("tool session not found: {0}")]
    SessionNotFound(String),
}

pub type Result<T> = std::result::Result<T, NpcError>;

/// JSON kind of a value, used when naming a rejected input shape.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
