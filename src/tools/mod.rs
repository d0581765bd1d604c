//! Tool schemas an NPC may invoke during backend inference.
//!
//! Tools execute in the game, not here: this module only describes them. A
//! tool is declared as a [`Callable`] signature (or built directly with
//! [`ToolDescriptor::builder`]) and converted into the `{name, description,
//! parameters}` shape the backend registers per session.
//!
//! # Extension
//!
//! New type-hint spellings go in [`schema::resolve_type`]; the wire shape lives
//! in [`traits`].

pub mod schema;
pub mod traits;

pub use schema::{extract, Callable, Param};
pub use traits::{ParamType, ParameterSpec, Parameters, ToolDescriptor, ToolDescriptorBuilder};

use crate::error::{NpcError, Result};
use std::collections::HashSet;

/// Resolve a registration batch into descriptors.
///
/// Fails before anything is sent if a callable is not marked as a tool or two
/// tools share a name.
pub fn descriptors_for(callables: &[Callable]) -> Result<Vec<ToolDescriptor>> {
    let mut descriptors = Vec::with_capacity(callables.len());
    for callable in callables {
        let descriptor = callable
            .descriptor()
            .ok_or_else(|| NpcError::ToolNotDecorated {
                name: callable.name().to_string(),
            })?;
        descriptors.push(descriptor.clone());
    }
    ensure_unique_names(&descriptors)?;
    Ok(descriptors)
}

pub(crate) fn ensure_unique_names(descriptors: &[ToolDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if !seen.insert(descriptor.name.as_str()) {
            return Err(NpcError::DuplicateTool {
                name: descriptor.name.clone(),
            });
        }
    }
    Ok(())
}
