//! Parse nodes: the typed object literals a module document declares

use serde::de::DeserializeOwned;
use std::fmt;

use super::ParseError;

/// Kind string marking a node as a sub-module include
pub const MODULE_KIND: &str = "module";

/// A single parsed resource declaration.
///
/// Carries the discriminator kind, the sibling-local name, and the raw body
/// table. The body stays undecoded until hydration so the dependency
/// resolver can enumerate its string fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    kind: String,
    name: String,
    body: toml::Table,
}

impl ParseNode {
    pub(crate) fn new(kind: String, name: String, body: toml::Table) -> Self {
        Self { kind, name, body }
    }

    /// The kind discriminator, e.g. `task`, `group`, `file.content`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The sibling-local name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node's label, `{kind}.{name}`: the segment it contributes to
    /// its graph ID
    pub fn label(&self) -> String {
        format!("{}.{}", self.kind, self.name)
    }

    /// True if this node includes a sub-module
    pub fn is_module(&self) -> bool {
        self.kind == MODULE_KIND
    }

    /// The sub-module source, for module nodes that declare one
    pub fn source(&self) -> Option<&str> {
        self.body.get("source").and_then(toml::Value::as_str)
    }

    /// Fetches a named field as a list of strings.
    ///
    /// Returns [`ParseError::FieldNotFound`] when the field is absent so
    /// callers can treat "no field" differently from a malformed one.
    pub fn get_string_slice(&self, field: &str) -> Result<Vec<String>, ParseError> {
        let value = self
            .body
            .get(field)
            .ok_or_else(|| ParseError::FieldNotFound(field.to_string()))?;

        let items = value.as_array().ok_or_else(|| ParseError::FieldType {
            field: field.to_string(),
            expected: "a list of strings",
        })?;

        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ParseError::FieldType {
                        field: field.to_string(),
                        expected: "a list of strings",
                    })
            })
            .collect()
    }

    /// Every string-valued field in the body, recursively through nested
    /// tables and arrays, in document order.
    pub fn strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for value in self.body.values() {
            collect_strings(value, &mut out);
        }
        out
    }

    /// Decodes the whole body into a typed descriptor
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, toml::de::Error> {
        toml::Value::Table(self.body.clone()).try_into()
    }
}

fn collect_strings(value: &toml::Value, out: &mut Vec<String>) {
    match value {
        toml::Value::String(s) => out.push(s.clone()),
        toml::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        toml::Value::Table(table) => {
            for nested in table.values() {
                collect_strings(nested, out);
            }
        }
        _ => {}
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}
