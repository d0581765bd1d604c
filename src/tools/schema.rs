//! Signature-to-schema extraction.
//!
//! A [`Callable`] is a declared function signature: a name, an optional doc
//! string and an ordered list of [`Param`]s with optional type hints. Marking it
//! with [`Callable::tool`] turns it into something registration accepts; the
//! [`ToolDescriptor`] is derived from the signature once and cached on the
//! callable.
//!
//! Extraction never fails. Unknown hints resolve to `string`, missing
//! descriptions get generated fallbacks.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::traits::{
    default_param_description, default_tool_description, ParamType, ParameterSpec, Parameters,
    ToolDescriptor,
};

const RECEIVER_NAMES: [&str; 4] = ["self", "&self", "&mut self", "mut self"];

/// One declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    hint: Option<String>,
    has_default: bool,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: None,
            has_default: false,
        }
    }

    /// Attach a type hint, e.g. `"str"`, `"Optional[int]"`, `"Option<f64>"`.
    pub fn typed(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Declare that the parameter has a default value, making it optional.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_receiver(&self) -> bool {
        RECEIVER_NAMES.contains(&self.name.trim())
    }
}

#[derive(Debug, Clone)]
struct ToolMark {
    description: Option<String>,
    descriptor: OnceLock<ToolDescriptor>,
}

/// A callable signature that can be turned into a tool.
#[derive(Debug, Clone)]
pub struct Callable {
    name: String,
    doc: Option<String>,
    params: Vec<Param>,
    mark: Option<ToolMark>,
}

impl Callable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            mark: None,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Mark this callable as a tool, describing it from its doc string.
    pub fn tool(mut self) -> Self {
        self.mark = Some(ToolMark {
            description: None,
            descriptor: OnceLock::new(),
        });
        self
    }

    /// Mark this callable as a tool with an explicit description.
    pub fn tool_with_description(mut self, description: impl Into<String>) -> Self {
        self.mark = Some(ToolMark {
            description: Some(description.into()),
            descriptor: OnceLock::new(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_tool(&self) -> bool {
        self.mark.is_some()
    }

    /// The cached tool descriptor, or `None` when the callable is not a tool.
    pub fn descriptor(&self) -> Option<&ToolDescriptor> {
        let mark = self.mark.as_ref()?;
        Some(
            mark.descriptor
                .get_or_init(|| extract(self, mark.description.as_deref())),
        )
    }
}

/// Derive a descriptor from a signature. Pure; does not touch the cache.
pub fn extract(callable: &Callable, description: Option<&str>) -> ToolDescriptor {
    let doc = callable.doc.as_deref();
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(ToString::to_string)
        .or_else(|| doc.and_then(first_doc_line))
        .unwrap_or_else(|| default_tool_description(&callable.name));

    let documented = doc.map(parse_param_descriptions).unwrap_or_default();

    let parameters: Parameters = callable
        .params
        .iter()
        .filter(|p| !p.is_receiver())
        .map(|p| {
            let kind = p.hint.as_deref().map_or(ParamType::String, resolve_type);
            let description = documented
                .get(p.name.as_str())
                .cloned()
                .unwrap_or_else(|| default_param_description(&p.name));
            (
                p.name.clone(),
                ParameterSpec::new(kind, description, !p.has_default),
            )
        })
        .collect();

    ToolDescriptor {
        name: callable.name.clone(),
        description,
        parameters,
    }
}

fn first_doc_line(doc: &str) -> Option<String> {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
}

/// Collect `name: text` / `name (type): text` entries from an `Args:` or
/// `Parameters:` section. Later entries for the same name win.
pub fn parse_param_descriptions(doc: &str) -> HashMap<String, String> {
    let mut descriptions = HashMap::new();
    let mut in_section = false;

    for line in doc.lines() {
        let stripped = line.trim();
        let lower = stripped.to_lowercase();

        if lower.starts_with("args:") || lower.starts_with("parameters:") {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if looks_like_section_header(stripped) {
            break;
        }

        let Some((name_part, text)) = stripped.split_once(':') else {
            continue;
        };
        let name = name_part
            .split_once('(')
            .map_or(name_part, |(before, _)| before)
            .trim();
        let text = text.trim();
        if !name.is_empty() && !text.is_empty() {
            descriptions.insert(name.to_string(), text.to_string());
        }
    }

    descriptions
}

fn looks_like_section_header(line: &str) -> bool {
    line.contains(':') && line.chars().next().is_some_and(char::is_uppercase)
}

/// Map a type hint to a schema type. Optional wrappers unwrap to their inner
/// type; anything unrecognized is `string`.
pub fn resolve_type(hint: &str) -> ParamType {
    let inner = unwrap_optional(hint.trim());
    match base_name(inner) {
        "str" | "String" | "string" => ParamType::String,
        "int" | "integer" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16"
        | "u32" | "u64" | "u128" | "usize" => ParamType::Integer,
        "float" | "f32" | "f64" => ParamType::Float,
        "bool" | "boolean" => ParamType::Boolean,
        _ => ParamType::String,
    }
}

fn unwrap_optional(hint: &str) -> &str {
    let hint = hint.trim().trim_matches(|c| c == '"' || c == '\'');

    for (open, close) in [
        ("Optional[", ']'),
        ("typing.Optional[", ']'),
        ("Option<", '>'),
        ("std::option::Option<", '>'),
    ] {
        if let Some(rest) = hint.strip_prefix(open) {
            if let Some(inner) = rest.strip_suffix(close) {
                return unwrap_optional(inner);
            }
        }
    }

    for open in ["Union[", "typing.Union["] {
        if let Some(inner) = hint.strip_prefix(open).and_then(|r| r.strip_suffix(']')) {
            if let Some(first) = split_top_level(inner, ',').into_iter().find(|t| !is_none(t)) {
                return unwrap_optional(first);
            }
        }
    }

    let alternatives = split_top_level(hint, '|');
    if alternatives.len() > 1 {
        if let Some(first) = alternatives.into_iter().find(|t| !is_none(t)) {
            return unwrap_optional(first);
        }
    }

    hint
}

fn is_none(hint: &str) -> bool {
    matches!(hint.trim(), "None" | "NoneType" | "type(None)" | "()")
}

/// Split on `sep` outside of any bracket nesting.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '[' | '<' | '(' => depth += 1,
            ']' | '>' | ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

/// Strip references, lifetimes and module paths: `&'a std::string::String` → `String`.
fn base_name(hint: &str) -> &str {
    let mut rest = hint.trim().trim_start_matches('&');
    if let Some(after_lifetime) = rest.strip_prefix('\'') {
        rest = after_lifetime
            .split_once(' ')
            .map_or(after_lifetime, |(_, r)| r);
    }
    rest = rest.trim().strip_prefix("mut ").unwrap_or(rest).trim();
    let rest = rest.rsplit("::").next().unwrap_or(rest);
    rest.rsplit('.').next().unwrap_or(rest)
}
