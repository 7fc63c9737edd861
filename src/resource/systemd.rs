//! Systemd unit resource
//!
//! Declares whether a unit is enabled or disabled, probing and mutating
//! through `systemctl`.

use serde::Deserialize;
use std::process::Command;

use super::{registry::DecodeError, Resource, ResourceError, ResourceFactory, Status};

/// Desired unit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    #[default]
    Enabled,
    Disabled,
}

impl UnitState {
    fn as_str(self) -> &'static str {
        match self {
            UnitState::Enabled => "enabled",
            UnitState::Disabled => "disabled",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            UnitState::Enabled => "enable",
            UnitState::Disabled => "disable",
        }
    }
}

/// Decoded `systemd.unit` body
#[derive(Debug, Clone, Deserialize)]
pub struct Preparer {
    #[serde(default)]
    pub unit: String,

    #[serde(default)]
    pub state: UnitState,
}

/// A systemd unit managed through `systemctl`
#[derive(Debug)]
pub struct SystemdUnit {
    unit: String,
    state: UnitState,
}

/// Factory for the `systemd.unit` kind
pub fn preparer() -> ResourceFactory {
    std::sync::Arc::new(|node| {
        let spec: Preparer = node.decode().map_err(DecodeError::from)?;
        if spec.unit.is_empty() {
            return Err(DecodeError::new("task requires a \"unit\" parameter"));
        }
        Ok(Box::new(SystemdUnit {
            unit: spec.unit,
            state: spec.state,
        }))
    })
}

impl Resource for SystemdUnit {
    fn kind(&self) -> &str {
        "systemd.unit"
    }

    fn check(&self) -> Result<Status, ResourceError> {
        let output = Command::new("systemctl")
            .args(["is-enabled", self.unit.as_str()])
            .output()?;

        // `systemctl is-enabled` exits non-zero for disabled units but
        // still prints the state; only the text matters here
        let current = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if current == self.state.as_str() {
            return Ok(Status::no_change());
        }

        let mut status = Status::will_change();
        status.record(format!("unit {} is {}", self.unit, current));
        status.add_difference(self.unit.clone(), current, self.state.as_str());
        Ok(status)
    }

    fn apply(&self) -> Result<Status, ResourceError> {
        let output = Command::new("systemctl")
            .args([self.state.verb(), self.unit.as_str()])
            .output()?;

        if !output.status.success() {
            return Err(ResourceError::Failed(format!(
                "systemctl {} {} failed: {}",
                self.state.verb(),
                self.unit,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut status = Status::no_change();
        status.record(format!("{}d unit {}", self.state.verb(), self.unit));
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(body: &str) -> crate::parse::ParseNode {
        let doc = format!("[\"systemd.unit\".journald]\n{}", body);
        crate::parse::parse(&doc).unwrap().remove(0)
    }

    #[test]
    fn valid_preparer() {
        let resource = preparer()(&node("unit = \"systemd-journald.service\"")).unwrap();
        assert_eq!(resource.kind(), "systemd.unit");
    }

    #[test]
    fn unit_is_required() {
        let err = preparer()(&node("state = \"enabled\"")).unwrap_err();
        assert!(err.to_string().contains("\"unit\""));
    }

    #[test]
    fn state_defaults_to_enabled() {
        let spec: Preparer = node("unit = \"sshd.service\"").decode().unwrap();
        assert_eq!(spec.state, UnitState::Enabled);
    }

    #[test]
    fn state_decodes_disabled() {
        let spec: Preparer = node("unit = \"sshd.service\"\nstate = \"disabled\"")
            .decode()
            .unwrap();
        assert_eq!(spec.state, UnitState::Disabled);
    }
}
