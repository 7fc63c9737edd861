//! Parameter resource
//!
//! A named, defaulted scalar declared in a module. Parameters appear as
//! graph vertices so that ordering and change propagation apply to them
//! the same way they apply to every other resource.

use serde::Deserialize;

use super::{registry::DecodeError, Resource, ResourceError, ResourceFactory, Status};

/// Decoded `param` body
#[derive(Debug, Clone, Deserialize)]
pub struct Preparer {
    #[serde(default)]
    pub default: Option<toml::Value>,
}

/// A module parameter with an optional default
#[derive(Debug)]
pub struct Param {
    pub default: Option<toml::Value>,
}

/// Factory for the `param` kind
pub fn preparer() -> ResourceFactory {
    std::sync::Arc::new(|node| {
        let spec: Preparer = node.decode().map_err(DecodeError::from)?;
        Ok(Box::new(Param {
            default: spec.default,
        }))
    })
}

impl Resource for Param {
    fn kind(&self) -> &str {
        "param"
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
    fn default_is_optional() {
        let node = crate::parse::parse("[param.message]").unwrap().remove(0);
        assert!(preparer()(&node).is_ok());
    }

    #[test]
    fn decodes_scalar_default() {
        let node = crate::parse::parse("[param.message]\ndefault = \"hello\"")
            .unwrap()
            .remove(0);
        let spec: Preparer = node.decode().unwrap();
        assert_eq!(spec.default, Some(toml::Value::String("hello".to_string())));
    }
}
