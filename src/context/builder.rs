//! Fluent builders for per-tick context.

use super::normalize::ActionContext;
use super::types::{GameEvent, KnowledgeGraph, Surrounding};

/// Ordered collection of surroundings.
///
/// ```
/// use llm_npc::context::Surroundings;
///
/// let here = Surroundings::new()
///     .add("Tavern", "A cozy room with wooden tables")
///     .add("Stranger", "A hooded figure in the corner");
/// assert_eq!(here.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surroundings {
    items: Vec<Surrounding>,
}

impl Surroundings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.items.push(Surrounding::new(name, description));
        self
    }

    pub fn push(&mut self, surrounding: Surrounding) {
        self.items.push(surrounding);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Surrounding> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Surrounding> {
        self.items
    }
}

impl FromIterator<Surrounding> for Surroundings {
    fn from_iter<I: IntoIterator<Item = Surrounding>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Surroundings {
    type Item = &'a Surrounding;
    type IntoIter = std::slice::Iter<'a, Surrounding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Everything an NPC needs for one tick, assembled in one place.
///
/// Passing a `ContextBuilder` to an action replaces any separately supplied
/// surroundings, events or knowledge graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBuilder {
    surroundings: Surroundings,
    events: Vec<GameEvent>,
    knowledge_graph: Option<KnowledgeGraph>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_surrounding(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.surroundings = self.surroundings.add(name, description);
        self
    }

    pub fn add_event(
        mut self,
        event_type: impl Into<String>,
        event_description: impl Into<String>,
    ) -> Self {
        self.events.push(GameEvent::new(event_type, event_description));
        self
    }

    pub fn set_knowledge_graph(mut self, knowledge_graph: KnowledgeGraph) -> Self {
        self.knowledge_graph = Some(knowledge_graph);
        self
    }

    pub fn surroundings(&self) -> &Surroundings {
        &self.surroundings
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn knowledge_graph(&self) -> Option<&KnowledgeGraph> {
        self.knowledge_graph.as_ref()
    }

    /// Canonical context. `events` is omitted when none were added and
    /// `knowledge_graph` when unset or empty.
    pub fn build(self) -> ActionContext {
        let events = (!self.events.is_empty()).then_some(self.events);
        let knowledge_graph = self
            .knowledge_graph
            .filter(|kg| !kg.is_empty())
            .map(KnowledgeGraph::into_value);

        ActionContext {
            surroundings: self.surroundings.into_vec(),
            events,
            knowledge_graph,
        }
    }
}
