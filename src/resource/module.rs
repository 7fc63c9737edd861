//! Module resource
//!
//! The structural vertex a sub-module include hydrates into. Carries the
//! resolved source for inspection; converging a module means converging
//! its children, so check and apply are no-ops.

use serde::Deserialize;

use super::{registry::DecodeError, Resource, ResourceError, ResourceFactory, Status};

/// Decoded `module` body
#[derive(Debug, Clone, Deserialize)]
pub struct Preparer {
    pub source: String,
}

/// A sub-module include
#[derive(Debug)]
pub struct Module {
    pub source: String,
}

/// Factory for the `module` kind
pub fn preparer() -> ResourceFactory {
    std::sync::Arc::new(|node| {
        let spec: Preparer = node.decode().map_err(DecodeError::from)?;
        Ok(Box::new(Module {
            source: spec.source,
        }))
    })
}

impl Resource for Module {
    fn kind(&self) -> &str {
        "module"
    }

    fn check(&self) -> Result<Status, ResourceError> {
        Ok(Status::no_change())
    }

    fn apply(&self) -> Result<Status, ResourceError> {
        Ok(Status::no_change())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_required() {
        let node = crate::parse::parse("[module.users]").unwrap().remove(0);
        assert!(preparer()(&node).is_err());
    }

    #[test]
    fn decodes_source() {
        let node = crate::parse::parse("[module.users]\nsource = \"users.toml\"")
            .unwrap()
            .remove(0);
        assert!(preparer()(&node).is_ok());
    }
}
