//! File content resource
//!
//! Declares the literal content of a file. Apply writes atomically: the
//! content lands in a temporary sibling first, then renames over the
//! destination.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{registry::DecodeError, Resource, ResourceError, ResourceFactory, Status};

/// Decoded `file.content` body
#[derive(Debug, Clone, Deserialize)]
pub struct Preparer {
    pub destination: String,
    pub content: String,
}

/// A file whose content is managed verbatim
#[derive(Debug)]
pub struct FileContent {
    destination: PathBuf,
    content: String,
}

/// Factory for the `file.content` kind
pub fn preparer() -> ResourceFactory {
    std::sync::Arc::new(|node| {
        let spec: Preparer = node.decode().map_err(DecodeError::from)?;
        if spec.destination.is_empty() {
            return Err(DecodeError::new("file.content requires a \"destination\""));
        }
        Ok(Box::new(FileContent {
            destination: PathBuf::from(spec.destination),
            content: spec.content,
        }))
    })
}

impl Resource for FileContent {
    fn kind(&self) -> &str {
        "file.content"
    }

    fn check(&self) -> Result<Status, ResourceError> {
        match fs::read_to_string(&self.destination) {
            Ok(current) if current == self.content => Ok(Status::no_change()),
            Ok(current) => {
                let mut status = Status::will_change();
                status.add_difference(
                    self.destination.display().to_string(),
                    current,
                    self.content.clone(),
                );
                Ok(status)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let mut status = Status::will_change();
                status.record(format!("{} does not exist", self.destination.display()));
                status.add_difference(
                    self.destination.display().to_string(),
                    "<absent>",
                    self.content.clone(),
                );
                Ok(status)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn apply(&self) -> Result<Status, ResourceError> {
        if let Some(parent) = self.destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = tmp_path(&self.destination);
        fs::write(&tmp, &self.content)?;
        fs::rename(&tmp, &self.destination)?;

        let mut status = Status::no_change();
        status.record(format!("wrote {}", self.destination.display()));
        Ok(status)
    }
}

fn tmp_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".settle-tmp");
    destination.with_file_name(name)
}
