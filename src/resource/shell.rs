//! Shell task resource
//!
//! The workhorse kind: a `check` script probes the current state and an
//! optional `apply` script converges it. A non-zero check exit status
//! means the task will change.

use serde::Deserialize;
use std::process::Command;

use super::{registry::DecodeError, Resource, ResourceError, ResourceFactory, Status};

fn default_interpreter() -> String {
    "/bin/sh".to_string()
}

/// Decoded `task` body
#[derive(Debug, Clone, Deserialize)]
pub struct Preparer {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    pub check: String,

    #[serde(default)]
    pub apply: Option<String>,
}

/// A shell-scripted convergence task
#[derive(Debug)]
pub struct ShellTask {
    interpreter: String,
    check: String,
    apply: Option<String>,
}

/// Factory for the `task` kind
pub fn preparer() -> ResourceFactory {
    std::sync::Arc::new(|node| {
        let spec: Preparer = node.decode().map_err(DecodeError::from)?;
        Ok(Box::new(ShellTask {
            interpreter: spec.interpreter,
            check: spec.check,
            apply: spec.apply,
        }))
    })
}

impl ShellTask {
    fn run(&self, script: &str) -> Result<std::process::Output, ResourceError> {
        Command::new(&self.interpreter)
            .arg("-c")
            .arg(script)
            .output()
            .map_err(ResourceError::from)
    }
}

impl Resource for ShellTask {
    fn kind(&self) -> &str {
        "task"
    }

    fn check(&self) -> Result<Status, ResourceError> {
        let output = self.run(&self.check)?;

        let mut status = if output.status.success() {
            Status::no_change()
        } else {
            Status::will_change()
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            status.record(stdout.trim().to_string());
        }
        if status.is_will_change() {
            status.add_difference("check", format!("exit {}", output.status), "exit 0");
        }

        Ok(status)
    }

    fn apply(&self) -> Result<Status, ResourceError> {
        let script = match &self.apply {
            Some(script) => script,
            None => {
                let mut status = Status::no_change();
                status.record("no apply script");
                return Ok(status);
            }
        };

        let output = self.run(script)?;
        if !output.status.success() {
            return Err(ResourceError::Failed(format!(
                "apply script failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut status = Status::no_change();
        status.record(format!("applied via {}", self.interpreter));
        Ok(status)
    }
}
