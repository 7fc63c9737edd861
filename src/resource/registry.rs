//! Kind registry
//!
//! Maps kind strings to descriptor factories. Process-wide registration
//! happens once at startup via [`ResourceRegistry::with_defaults`]; the
//! load pipeline receives the registry as an explicit collaborator and
//! treats it as read-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::parse::ParseNode;

use super::{file, group, module, param, shell, systemd, Resource};

/// A descriptor construction failure: the body does not conform to the
/// descriptor's schema.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(String);

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<toml::de::Error> for DecodeError {
    fn from(err: toml::de::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("\"{kind}\" is not a valid resource type in \"{node}\"")]
    UnknownKind { kind: String, node: String },

    #[error("Invalid \"{node}\": {source}")]
    Decode {
        node: String,
        #[source]
        source: DecodeError,
    },
}

/// Builds a typed descriptor from a parse node
pub type ResourceFactory =
    Arc<dyn Fn(&ParseNode) -> Result<Box<dyn Resource>, DecodeError> + Send + Sync>;

/// Open mapping from kind string to descriptor factory
#[derive(Clone)]
pub struct ResourceRegistry {
    factories: HashMap<String, ResourceFactory>,
}

impl ResourceRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The standard registry: every built-in kind wired with its real
    /// system capabilities.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("module", module::preparer());
        registry.register("param", param::preparer());
        registry.register("task", shell::preparer());
        registry.register("group", group::preparer(Arc::new(group::EtcGroup)));
        registry.register("file.content", file::preparer());
        registry.register("systemd.unit", systemd::preparer());
        registry
    }

    /// Installs a factory for a kind, replacing any existing one
    pub fn register(&mut self, kind: impl Into<String>, factory: ResourceFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Returns true if a factory is registered for the kind
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Hydrates a parse node into its typed descriptor
    pub fn prepare(&self, node: &ParseNode) -> Result<Box<dyn Resource>, RegistryError> {
        let factory = self
            .factories
            .get(node.kind())
            .ok_or_else(|| RegistryError::UnknownKind {
                kind: node.kind().to_string(),
                node: node.to_string(),
            })?;

        factory(node).map_err(|source| RegistryError::Decode {
            node: node.to_string(),
            source,
        })
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("ResourceRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
