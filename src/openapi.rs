//! Loosely-typed view over a parsed OpenAPI document.
//!
//! Documents found in the wild are rarely well-formed, so instead of
//! deserializing into a strict model the parsed tree is kept as a
//! [`serde_yaml::Value`] and read through [`ValueExt`]. Every lookup returns an
//! `Option` and the caller picks the default.

use serde_yaml::{Mapping, Value};

pub const PATHS: &str = "paths";

/// A parsed document whose root is known to be a mapping with a `paths` key.
#[derive(Clone, Debug)]
pub struct RawDocument {
    root: Mapping,
}

impl RawDocument {
    /// Checks the shape of a freshly parsed tree.
    ///
    /// Returns the reason for rejection when the root is not a mapping or has
    /// no `paths` key.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let root = match value {
            Value::Mapping(root) => root,
            Value::Tagged(tagged) => return Self::from_value(tagged.value),
            other => {
                return Err(format!(
                    "document root must be a mapping, found {}",
                    kind_of(&other)
                ))
            }
        };

        if !root.contains_key(PATHS) {
            return Err("document has no `paths` section".to_string());
        }

        Ok(Self { root })
    }

    pub fn title(&self) -> Option<&str> {
        self.info().and_then(|info| info.str_field("title"))
    }

    pub fn version(&self) -> Option<&str> {
        self.info().and_then(|info| info.str_field("version"))
    }

    pub fn description(&self) -> Option<&str> {
        self.info().and_then(|info| info.str_field("description"))
    }

    /// URL of the first entry under `servers`.
    pub fn first_server_url(&self) -> Option<&str> {
        self.root
            .get("servers")
            .and_then(Value::as_sequence)
            .and_then(|servers| servers.first())
            .and_then(|server| server.str_field("url"))
    }

    /// `(path, method map)` pairs in document order. A `paths` value that is
    /// not a mapping yields nothing.
    pub fn paths(&self) -> impl Iterator<Item = (String, &Mapping)> {
        self.root
            .get(PATHS)
            .and_then(Value::as_mapping)
            .into_iter()
            .flat_map(|paths| paths.iter())
            .filter_map(|(path, methods)| Some((key_to_string(path)?, methods.as_mapping()?)))
    }

    fn info(&self) -> Option<&Value> {
        self.root.get("info")
    }
}

/// Optional-field accessors over a YAML tree.
pub trait ValueExt {
    fn field(&self, key: &str) -> Option<&Value>;

    fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(scalar_str)
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        self.field(key).and_then(Value::as_bool)
    }

    fn mapping_field(&self, key: &str) -> Option<&Mapping> {
        self.field(key).and_then(Value::as_mapping)
    }

    fn seq_field(&self, key: &str) -> Option<&Vec<Value>> {
        self.field(key).and_then(Value::as_sequence)
    }

    /// Walks nested mappings, e.g. `["content", "application/json", "schema"]`.
    fn at(&self, keys: &[&str]) -> Option<&Value> {
        let (first, rest) = keys.split_first()?;
        rest.iter()
            .try_fold(self.field(first)?, |node, key| node.field(key))
    }
}

impl ValueExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(mapping) => mapping.get(key),
            Value::Tagged(tagged) => tagged.value.field(key),
            _ => None,
        }
    }
}

impl ValueExt for Mapping {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Textual form of a mapping key. YAML happily produces integer keys for
/// status codes (`200:`), which are rendered as `"200"`.
pub fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => key_to_string(&tagged.value),
        _ => None,
    }
}

/// Converts a YAML subtree into JSON so it can be pretty-printed for the UI.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Mapping(mapping) => serde_json::Value::Object(
            mapping
                .iter()
                .filter_map(|(k, v)| Some((key_to_string(k)?, to_json(v))))
                .collect(),
        ),
        Value::Tagged(tagged) => to_json(&tagged.value),
    }
}

/// Pretty-prints a YAML subtree as JSON with two-space indentation.
pub fn pretty_json(value: &Value) -> Option<String> {
    serde_json::to_string_pretty(&to_json(value)).ok()
}

fn scalar_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Tagged(tagged) => scalar_str(&tagged.value),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
