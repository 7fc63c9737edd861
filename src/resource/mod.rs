//! # Resource Descriptors
//!
//! Typed descriptors for everything a module can declare, plus the open
//! registry that maps kind strings to descriptor factories.
//!
//! ## Resource Model
//!
//! Every descriptor implements [`Resource`]: `check` reports whether the
//! machine already matches the declared state, `apply` makes it so. Both
//! return a [`Status`] carrying the change level, human-readable output
//! and recorded differences.
//!
//! ## Registered Kinds
//!
//! | Kind | Descriptor | Purpose |
//! |------|------------|---------|
//! | `task` | [`shell::ShellTask`] | check/apply shell scripts |
//! | `group` | [`group::Group`] | system group presence |
//! | `file.content` | [`file::FileContent`] | literal file content |
//! | `systemd.unit` | [`systemd::SystemdUnit`] | unit enable/disable |
//! | `module` | [`module::Module`] | structural, no-op |
//! | `param` | [`param::Param`] | structural, no-op |
//!
//! The registry is open: callers can register additional kinds before
//! loading. Factories needing system capabilities receive them by
//! injection when registered (see [`group::SystemUtils`]).

pub mod file;
pub mod group;
pub mod module;
pub mod param;
pub mod registry;
pub mod shell;
pub mod systemd;

pub use registry::{DecodeError, RegistryError, ResourceFactory, ResourceRegistry};

use serde::Serialize;
use std::fmt::Debug;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How far the machine is from the declared state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    #[default]
    NoChange,
    WillChange,
    Fatal,
}

/// A recorded difference between current and desired state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diff {
    pub field: String,
    pub current: String,
    pub desired: String,
}

/// Outcome of a check or apply
#[derive(Debug, Default, Serialize)]
pub struct Status {
    pub level: StatusLevel,
    pub messages: Vec<String>,
    pub diffs: Vec<Diff>,
}

impl Status {
    pub fn no_change() -> Self {
        Self::default()
    }

    pub fn will_change() -> Self {
        Self {
            level: StatusLevel::WillChange,
            ..Self::default()
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Fatal,
            messages: vec![message.into()],
            diffs: vec![],
        }
    }

    /// Appends a line of human-readable output
    pub fn record(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Records a current/desired difference
    pub fn add_difference(
        &mut self,
        field: impl Into<String>,
        current: impl Into<String>,
        desired: impl Into<String>,
    ) {
        self.diffs.push(Diff {
            field: field.into(),
            current: current.into(),
            desired: desired.into(),
        });
    }

    pub fn is_will_change(&self) -> bool {
        self.level == StatusLevel::WillChange
    }
}

/// A checkable, applicable resource.
///
/// `check` must not mutate the system; `apply` brings it to the declared
/// state and reports what it did.
pub trait Resource: Debug + Send + Sync {
    fn kind(&self) -> &str;
    fn check(&self) -> Result<Status, ResourceError>;
    fn apply(&self) -> Result<Status, ResourceError>;
}
