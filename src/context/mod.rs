//! Per-tick world context: what the NPC sees, what just happened, and what it
//! remembers.
//!
//! Callers may hand over bare strings, JSON records, typed entities or the
//! builders in [`builder`]; [`ActInput::normalize`] turns any of them into the
//! single [`ActionContext`] shape the backend accepts.

pub mod builder;
pub mod normalize;
pub mod types;

pub use builder::{ContextBuilder, Surroundings};
pub use normalize::{
    ActInput, ActionContext, EventInput, KnowledgeGraphInput, SurroundingInput, SurroundingsInput,
};
pub use types::{GameEvent, KgEdge, KgNode, KnowledgeGraph, Surrounding};
