//! Wire-level tool descriptors sent to the backend on registration.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Parameter type understood by the backend tool schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for a single tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type", default)]
    pub kind: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl ParameterSpec {
    pub fn new(kind: ParamType, description: impl Into<String>, required: bool) -> Self {
        Self {
            kind,
            description: description.into(),
            required,
        }
    }
}

/// Parameter specs keyed by name, in declaration order.
///
/// Serializes as a JSON object whose keys keep insertion order, so the
/// registration payload is byte-stable for a given declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameters(Vec<(String, ParameterSpec)>);

impl Parameters {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace a parameter. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, spec: ParameterSpec) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.0.push((name, spec));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ParameterSpec)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, ParameterSpec)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, spec) in iter {
            params.insert(name, spec);
        }
        params
    }
}

impl Serialize for Parameters {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to parameter spec")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut params = Parameters::new();
                while let Some((name, spec)) = access.next_entry::<String, ParameterSpec>()? {
                    params.insert(name, spec);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

/// A tool as the backend sees it: `{name, description, parameters}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl ToolDescriptor {
    /// Start a descriptor by hand, bypassing signature extraction.
    pub fn builder(name: impl Into<String>) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            name: name.into(),
            description: None,
            parameters: Parameters::new(),
        }
    }
}

/// Builds a [`ToolDescriptor`] with the same defaults extraction applies.
#[derive(Debug, Clone)]
pub struct ToolDescriptorBuilder {
    name: String,
    description: Option<String>,
    parameters: Parameters,
}

impl ToolDescriptorBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a parameter. An empty description is replaced by `Parameter: <name>`.
    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        let mut description = description.into();
        if description.trim().is_empty() {
            description = default_param_description(&name);
        }
        self.parameters
            .insert(name, ParameterSpec::new(kind, description, required));
        self
    }

    pub fn build(self) -> ToolDescriptor {
        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_tool_description(&self.name));
        ToolDescriptor {
            name: self.name,
            description,
            parameters: self.parameters,
        }
    }
}

pub(crate) fn default_tool_description(name: &str) -> String {
    format!("Tool: {name}")
}

pub(crate) fn default_param_description(name: &str) -> String {
    format!("Parameter: {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ParamType::Integer).unwrap(),
            "\"integer\""
        );
        assert_eq!(ParamType::Float.to_string(), "float");
    }

    #[test]
    fn parameters_keep_declaration_order_on_the_wire() {
        let tool = ToolDescriptor::builder("give_item")
            .description("Give an item")
            .param("zeta", ParamType::String, "last letter", true)
            .param("alpha", ParamType::Integer, "first letter", false)
            .build();

        let json = serde_json::to_string(&tool).unwrap();
        let zeta = json.find("\"zeta\"").unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        assert!(zeta < alpha, "declaration order lost: {json}");
    }

    #[test]
    fn descriptor_wire_shape() {
        let tool = ToolDescriptor::builder("speak")
            .description("Say something")
            .param("message", ParamType::String, "What to say", true)
            .build();

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["name"], "speak");
        assert_eq!(value["description"], "Say something");
        assert_eq!(value["parameters"]["message"]["type"], "string");
        assert_eq!(value["parameters"]["message"]["description"], "What to say");
        assert_eq!(value["parameters"]["message"]["required"], true);
    }

    #[test]
    fn builder_fills_default_descriptions() {
        let tool = ToolDescriptor::builder("wave")
            .param("target", ParamType::String, "", false)
            .build();
        assert_eq!(tool.description, "Tool: wave");
        assert_eq!(
            tool.parameters.get("target").unwrap().description,
            "Parameter: target"
        );
    }

    #[test]
    fn parameters_deserialize_in_document_order() {
        let json = r#"{"b":{"type":"boolean","description":"b","required":true},
                       "a":{"type":"float","description":"a","required":false}}"#;
        let params: Parameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(params.get("a").unwrap().kind, ParamType::Float);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut params = Parameters::new();
        params.insert("x", ParameterSpec::new(ParamType::String, "x", true));
        params.insert("y", ParameterSpec::new(ParamType::String, "y", true));
        params.insert("x", ParameterSpec::new(ParamType::Integer, "x2", false));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(params.get("x").unwrap().kind, ParamType::Integer);
    }
}
