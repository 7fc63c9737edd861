//! Hierarchical node IDs
//!
//! ID Format: a slash-separated path rooted at the literal `root`.
//! - The root vertex: `root`
//! - A node declared with label `task.greet` at the top level: `root/task.greet`
//! - The same node inside module `module.users`: `root/module.users/task.greet`
//!
//! The label of a node is `{kind}.{name}`, so dots separate kind from name
//! within a segment while slashes separate levels. IDs are compared and
//! hashed as opaque strings; the structural operations below (`parent`,
//! `sibling`) are the only places that look inside.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The distinguished root ID
pub const ROOT: &str = "root";

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Node ID must be 'root' or start with 'root/', got '{0}'")]
    NotRooted(String),

    #[error("Node ID contains an empty segment: '{0}'")]
    EmptySegment(String),
}

/// A hierarchical node ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId {
    path: String,
}

impl NodeId {
    /// Returns the root ID
    pub fn root() -> Self {
        Self {
            path: ROOT.to_string(),
        }
    }

    /// Returns true if this is the root ID
    pub fn is_root(&self) -> bool {
        self.path == ROOT
    }

    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Returns the last path segment (the node's label), e.g. `task.greet`
    pub fn label(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) => &self.path[pos + 1..],
            None => &self.path,
        }
    }

    /// Returns the parent ID, or None for the root
    pub fn parent(&self) -> Option<NodeId> {
        let pos = self.path.rfind('/')?;
        Some(Self {
            path: self.path[..pos].to_string(),
        })
    }

    /// Creates a child ID under this node with the given label
    pub fn child(&self, label: &str) -> NodeId {
        Self {
            path: format!("{}/{}", self.path, label),
        }
    }

    /// Expands a short reference within this node's declaring scope.
    ///
    /// `root/task.b` with reference `task.a` resolves to `root/task.a`;
    /// `root/module.users/task.b` with `param.gid` resolves to
    /// `root/module.users/param.gid`.
    pub fn sibling(&self, reference: &str) -> NodeId {
        match self.parent() {
            Some(parent) => parent.child(reference),
            None => self.child(reference),
        }
    }

    /// Returns the path segments from root outward
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s != ROOT && !s.starts_with("root/") {
            return Err(IdError::NotRooted(s.to_string()));
        }

        if s.split('/').any(str::is_empty) {
            return Err(IdError::EmptySegment(s.to_string()));
        }

        Ok(Self {
            path: s.to_string(),
        })
    }
}

impl TryFrom<String> for NodeId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_id() {
        let id = NodeId::root();
        assert!(id.is_root());
        assert_eq!(id.as_str(), "root");
        assert!(id.parent().is_none());
    }

    #[test]
    fn child_and_parent() {
        let id = NodeId::root().child("task.greet");
        assert_eq!(id.as_str(), "root/task.greet");
        assert_eq!(id.label(), "task.greet");
        assert_eq!(id.parent(), Some(NodeId::root()));
    }

    #[test]
    fn nested_parent_chain() {
        let id = NodeId::root().child("module.users").child("task.greet");
        assert_eq!(id.as_str(), "root/module.users/task.greet");

        let parent = id.parent().unwrap();
        assert_eq!(parent.as_str(), "root/module.users");
        assert_eq!(parent.parent(), Some(NodeId::root()));
    }

    #[test]
    fn sibling_resolution() {
        let id = NodeId::root().child("task.b");
        assert_eq!(id.sibling("task.a").as_str(), "root/task.a");

        let nested = NodeId::root().child("module.users").child("task.b");
        assert_eq!(
            nested.sibling("param.gid").as_str(),
            "root/module.users/param.gid"
        );
    }

    #[test]
    fn sibling_of_root_is_a_child() {
        assert_eq!(NodeId::root().sibling("task.a").as_str(), "root/task.a");
    }

    #[test]
    fn parses_valid_ids() {
        let id: NodeId = "root/task.a".parse().unwrap();
        assert_eq!(id.label(), "task.a");

        let root: NodeId = "root".parse().unwrap();
        assert!(root.is_root());
    }

    #[test]
    fn rejects_unrooted_ids() {
        assert_eq!(
            "task.a".parse::<NodeId>(),
            Err(IdError::NotRooted("task.a".to_string()))
        );
        assert!("rooted/task.a".parse::<NodeId>().is_err());
    }

    #[test]
    fn rejects_empty_segments() {
        assert_eq!(
            "root//task.a".parse::<NodeId>(),
            Err(IdError::EmptySegment("root//task.a".to_string()))
        );
        assert!("root/".parse::<NodeId>().is_err());
    }

    #[test]
    fn display_roundtrip() {
        let id = NodeId::root().child("module.users").child("task.greet");
        let parsed: NodeId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_roundtrip() {
        let id = NodeId::root().child("task.a");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"root/task.a\"");

        let parsed: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn segments_iterate_from_root() {
        let id = NodeId::root().child("module.users").child("task.greet");
        let segments: Vec<_> = id.segments().collect();
        assert_eq!(segments, vec!["root", "module.users", "task.greet"]);
    }
}
