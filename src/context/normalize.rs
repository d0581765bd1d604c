//! Loosely-typed caller input → canonical action context.

use serde::Serialize;
use serde_json::{Map, Value};

use super::builder::{ContextBuilder, Surroundings};
use super::types::{GameEvent, KnowledgeGraph, Surrounding};
use crate::error::{json_kind, NpcError, Result};

const SURROUNDING_SHAPE: &str = "string or {name, description}";
const EVENT_SHAPE: &str = "string or {event_type, event_description}";
const GRAPH_SHAPE: &str = "{nodes, edges} object";

/// Normalized context, ready to be merged into an action payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActionContext {
    pub surroundings: Vec<Surrounding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<GameEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<Value>,
}

/// One surrounding in any accepted shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SurroundingInput {
    /// Used as both name and description.
    Text(String),
    /// A JSON string, or an object with string `name` and `description`.
    Record(Value),
    Entity(Surrounding),
}

impl SurroundingInput {
    pub fn normalize(self) -> Result<Surrounding> {
        match self {
            Self::Text(text) => Ok(Surrounding::new(text.clone(), text)),
            Self::Entity(surrounding) => Ok(surrounding),
            Self::Record(Value::String(text)) => Ok(Surrounding::new(text.clone(), text)),
            Self::Record(Value::Object(record)) => {
                match (string_field(&record, "name"), string_field(&record, "description")) {
                    (Some(name), Some(description)) => Ok(Surrounding::new(name, description)),
                    _ => Err(invalid("surroundings", SURROUNDING_SHAPE, &Value::Object(record))),
                }
            }
            Self::Record(other) => Err(invalid("surroundings", SURROUNDING_SHAPE, &other)),
        }
    }
}

impl From<&str> for SurroundingInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SurroundingInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Surrounding> for SurroundingInput {
    fn from(surrounding: Surrounding) -> Self {
        Self::Entity(surrounding)
    }
}

impl From<Value> for SurroundingInput {
    fn from(value: Value) -> Self {
        Self::Record(value)
    }
}

/// The surroundings argument of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum SurroundingsInput {
    Items(Vec<SurroundingInput>),
    Builder(Surroundings),
    /// A full context; replaces separately supplied events and graph.
    Context(ContextBuilder),
}

impl Default for SurroundingsInput {
    fn default() -> Self {
        Self::Items(Vec::new())
    }
}

impl<T: Into<SurroundingInput>> From<Vec<T>> for SurroundingsInput {
    fn from(items: Vec<T>) -> Self {
        Self::Items(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SurroundingInput>, const N: usize> From<[T; N]> for SurroundingsInput {
    fn from(items: [T; N]) -> Self {
        Self::Items(items.into_iter().map(Into::into).collect())
    }
}

impl From<Surroundings> for SurroundingsInput {
    fn from(builder: Surroundings) -> Self {
        Self::Builder(builder)
    }
}

impl From<ContextBuilder> for SurroundingsInput {
    fn from(context: ContextBuilder) -> Self {
        Self::Context(context)
    }
}

/// One event in any accepted shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EventInput {
    /// Becomes `{event_type: "event", event_description: text}`.
    Text(String),
    /// A JSON string, or an object with string `event_type` and
    /// `event_description`.
    Record(Value),
    Entity(GameEvent),
}

impl EventInput {
    pub fn normalize(self) -> Result<GameEvent> {
        match self {
            Self::Text(text) | Self::Record(Value::String(text)) => {
                Ok(GameEvent::new(GameEvent::UNTYPED, text))
            }
            Self::Entity(event) => Ok(event),
            Self::Record(Value::Object(record)) => match (
                string_field(&record, "event_type"),
                string_field(&record, "event_description"),
            ) {
                (Some(kind), Some(description)) => Ok(GameEvent::new(kind, description)),
                _ => Err(invalid("events", EVENT_SHAPE, &Value::Object(record))),
            },
            Self::Record(other) => Err(invalid("events", EVENT_SHAPE, &other)),
        }
    }
}

impl From<&str> for EventInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for EventInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<GameEvent> for EventInput {
    fn from(event: GameEvent) -> Self {
        Self::Entity(event)
    }
}

impl From<Value> for EventInput {
    fn from(value: Value) -> Self {
        Self::Record(value)
    }
}

/// A knowledge graph, built or raw.
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeGraphInput {
    Graph(KnowledgeGraph),
    /// Already in `{nodes, edges}` shape; passed through unchanged.
    Raw(Value),
}

impl KnowledgeGraphInput {
    pub fn normalize(self) -> Result<Value> {
        match self {
            Self::Graph(graph) => Ok(graph.into_value()),
            Self::Raw(value @ Value::Object(_)) => Ok(value),
            Self::Raw(other) => Err(invalid("knowledge_graph", GRAPH_SHAPE, &other)),
        }
    }
}

impl From<KnowledgeGraph> for KnowledgeGraphInput {
    fn from(graph: KnowledgeGraph) -> Self {
        Self::Graph(graph)
    }
}

impl From<Value> for KnowledgeGraphInput {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

/// Arguments of one NPC action.
///
/// ```
/// use llm_npc::context::ActInput;
///
/// let input = ActInput::new(["Forest", "Sword on ground"])
///     .with_events(["You found a weapon"]);
/// let ctx = input.normalize().unwrap();
/// assert_eq!(ctx.surroundings.len(), 2);
/// assert_eq!(ctx.events.unwrap()[0].event_type, "event");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActInput {
    surroundings: SurroundingsInput,
    events: Option<Vec<EventInput>>,
    knowledge_graph: Option<KnowledgeGraphInput>,
}

impl ActInput {
    pub fn new(surroundings: impl Into<SurroundingsInput>) -> Self {
        Self {
            surroundings: surroundings.into(),
            events: None,
            knowledge_graph: None,
        }
    }

    pub fn with_events<I, T>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EventInput>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_knowledge_graph(mut self, knowledge_graph: impl Into<KnowledgeGraphInput>) -> Self {
        self.knowledge_graph = Some(knowledge_graph.into());
        self
    }

    pub fn normalize(self) -> Result<ActionContext> {
        let items = match self.surroundings {
            SurroundingsInput::Context(context) => {
                if self.events.is_some() || self.knowledge_graph.is_some() {
                    tracing::debug!("context builder supplied; separate events/graph ignored");
                }
                return Ok(context.build());
            }
            SurroundingsInput::Builder(builder) => builder.into_vec(),
            SurroundingsInput::Items(items) => items
                .into_iter()
                .map(SurroundingInput::normalize)
                .collect::<Result<Vec<_>>>()?,
        };

        let events = self
            .events
            .map(|events| {
                events
                    .into_iter()
                    .map(EventInput::normalize)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        let knowledge_graph = self
            .knowledge_graph
            .map(KnowledgeGraphInput::normalize)
            .transpose()?;

        Ok(ActionContext {
            surroundings: items,
            events,
            knowledge_graph,
        })
    }
}

impl From<ContextBuilder> for ActInput {
    fn from(context: ContextBuilder) -> Self {
        Self::new(context)
    }
}

impl From<SurroundingsInput> for ActInput {
    fn from(surroundings: SurroundingsInput) -> Self {
        Self::new(surroundings)
    }
}

fn string_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(ToString::to_string)
}

fn invalid(field: &'static str, expected: &'static str, value: &Value) -> NpcError {
    let shape = match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        other => json_kind(other).to_string(),
    };
    NpcError::InvalidInputShape {
        field,
        expected,
        shape,
    }
}
