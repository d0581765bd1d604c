//! Canonical world-context entities, in the shape the backend expects.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Something the NPC can see or interact with this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surrounding {
    pub name: String,
    pub description: String,
}

impl Surrounding {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Something that happened since the previous tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub event_type: String,
    pub event_description: String,
}

impl GameEvent {
    /// Event type used when an event is given as bare text.
    pub const UNTYPED: &'static str = "event";

    pub fn new(event_type: impl Into<String>, event_description: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            event_description: event_description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KgNode {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KgEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Long-term memory handed to the NPC as nodes and edges.
///
/// Not validated here: dangling edges or repeated node ids are the backend's
/// concern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: Vec<KgNode>,
    #[serde(default)]
    pub edges: Vec<KgEdge>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with arbitrary attributes, e.g. `[("type", "person")]`.
    pub fn add_node<I, K, V>(mut self, id: impl Into<String>, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.nodes.push(KgNode {
            id: id.into(),
            data: into_map(data),
        });
        self
    }

    /// Add a relationship between two node ids.
    pub fn add_edge<I, K, V>(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        data: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.edges.push(KgEdge {
            source: source.into(),
            target: target.into(),
            data: into_map(data),
        });
        self
    }

    /// Total number of nodes and edges.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// The `{nodes, edges}` wire value. Built directly, so it cannot fail.
    pub fn into_value(self) -> Value {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| json!({"id": node.id, "data": Value::Object(node.data)}))
            .collect::<Vec<_>>();
        let edges = self
            .edges
            .into_iter()
            .map(|edge| {
                json!({
                    "source": edge.source,
                    "target": edge.target,
                    "data": Value::Object(edge.data)
                })
            })
            .collect::<Vec<_>>();
        json!({"nodes": nodes, "edges": edges})
    }
}

fn into_map<I, K, V>(data: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    data.into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn knowledge_graph_wire_shape() {
        let kg = KnowledgeGraph::new()
            .add_node("player", [("type", "person"), ("name", "Hero")])
            .add_node("quest", [("type", "quest")])
            .add_edge("player", "quest", [("relationship", "active")]);

        assert_eq!(kg.len(), 3);
        assert_eq!(
            serde_json::to_value(&kg).unwrap(),
            json!({
                "nodes": [
                    {"id": "player", "data": {"type": "person", "name": "Hero"}},
                    {"id": "quest", "data": {"type": "quest"}}
                ],
                "edges": [
                    {"source": "player", "target": "quest", "data": {"relationship": "active"}}
                ]
            })
        );
    }

    #[test]
    fn into_value_matches_serialized_shape() {
        let kg = KnowledgeGraph::new()
            .add_node("elara", [("role", "innkeeper")])
            .add_edge("elara", "pony", [("relation", "owns")]);
        let serialized = serde_json::to_value(&kg).unwrap();
        assert_eq!(kg.into_value(), serialized);
        assert_eq!(
            KnowledgeGraph::new().into_value(),
            json!({"nodes": [], "edges": []})
        );
    }

    #[test]
    fn node_data_accepts_mixed_values() {
        let kg = KnowledgeGraph::new().add_node(
            "gold",
            [("amount", json!(40)), ("cursed", json!(true))],
        );
        assert_eq!(kg.nodes[0].data["amount"], 40);
        assert_eq!(kg.nodes[0].data["cursed"], true);
    }

    #[test]
    fn event_serializes_with_backend_field_names() {
        let event = GameEvent::new("discovery", "You found a hidden passage");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event_type": "discovery", "event_description": "You found a hidden passage"})
        );
    }
}
