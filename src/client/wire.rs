//! Request and response bodies of the backend REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::context::ActionContext;
use crate::tools::ToolDescriptor;

#[derive(Debug, Serialize)]
pub(crate) struct RegisterToolsRequest<'a> {
    pub session_id: &'a str,
    pub tools: &'a [ToolDescriptor],
}

/// Backend acknowledgement of a tool registration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolRegistration {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub tools_count: usize,
    #[serde(default)]
    pub tool_names: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ToolRegistration {
    /// What a 2xx with an unreadable body is taken to mean.
    pub(crate) fn assumed(session_id: &str, tools: &[ToolDescriptor]) -> Self {
        Self {
            session_id: session_id.to_string(),
            tools_count: tools.len(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            registered_at: None,
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterNpcRequest<'a> {
    pub name: &'a str,
    pub background_story: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterNpcResponse {
    #[serde(default)]
    pub npc_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActionRequest<'a> {
    pub npc_id: &'a str,
    #[serde(flatten)]
    pub context: ActionContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// An NPC as the backend reports it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NpcInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub background_story: String,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /npc/list`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NpcListing {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub npcs: BTreeMap<String, NpcInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NpcLookup {
    #[serde(default)]
    pub npc: NpcInfo,
}

/// `GET /tools/session/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionTools {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub tools_count: usize,
    #[serde(default)]
    pub tool_names: Vec<String>,
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}
