//! # Module Document Parsing
//!
//! Turns a module document into an ordered list of [`ParseNode`]s.
//!
//! Modules are TOML documents where every top-level entry is a table of
//! tables: the outer key names the resource kind, the inner key the
//! sibling-local name, and the body is the typed object literal.
//!
//! ```toml
//! [param.message]
//! default = "hello world"
//!
//! [task.greet]
//! check = "test -f /tmp/greeted"
//! apply = "echo {{param \"message\"}} > /tmp/greeted"
//!
//! [module.users]
//! source = "users.toml"
//! ```
//!
//! Enumeration order is deterministic and follows the document: kinds in
//! first-appearance order, and within a kind, names in declaration order.
//! The loader adds vertices in exactly this order.

mod node;

pub use node::{ParseNode, MODULE_KIND};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid module document: {0}")]
    Syntax(#[from] toml::de::Error),

    #[error("Module document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Top-level entry '{kind}' must be a table of named resources")]
    NotATable { kind: String },

    #[error("Resource body for '{label}' must be a table")]
    BodyNotATable { label: String },

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field '{field}' must be {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },
}

/// Parses a module document into its declared resources, in order.
pub fn parse(content: &str) -> Result<Vec<ParseNode>, ParseError> {
    let document: toml::Table = toml::from_str(content)?;

    let mut nodes = Vec::new();
    for (kind, group) in &document {
        let group = group.as_table().ok_or_else(|| ParseError::NotATable {
            kind: kind.clone(),
        })?;

        for (name, body) in group {
            let body = body.as_table().ok_or_else(|| ParseError::BodyNotATable {
                label: format!("{}.{}", kind, name),
            })?;
            nodes.push(ParseNode::new(kind.clone(), name.clone(), body.clone()));
        }
    }

    Ok(nodes)
}
