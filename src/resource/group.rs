//! System group resource
//!
//! Declares that a group with a given name and GID is present or absent.
//! All probing and mutation goes through the injected [`SystemUtils`]
//! capability so the decision logic stays testable without a root shell.

use serde::Deserialize;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::process::Command;
use std::sync::Arc;

use super::{registry::DecodeError, Resource, ResourceError, ResourceFactory, Status};

/// Desired group state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

impl State {
    fn as_str(self) -> &'static str {
        match self {
            State::Present => "present",
            State::Absent => "absent",
        }
    }
}

/// A group as the system reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub gid: String,
}

/// System utilities for group management
pub trait SystemUtils: Debug + Send + Sync {
    fn add_group(&self, name: &str, gid: &str) -> io::Result<()>;
    fn del_group(&self, name: &str) -> io::Result<()>;
    fn lookup_group(&self, name: &str) -> io::Result<Option<GroupEntry>>;
    fn lookup_gid(&self, gid: &str) -> io::Result<Option<GroupEntry>>;
}

/// Decoded `group` body
#[derive(Debug, Clone, Deserialize)]
pub struct Preparer {
    pub gid: String,
    pub name: String,

    #[serde(default)]
    pub state: State,
}

/// Manages a system group
#[derive(Debug)]
pub struct Group {
    pub gid: String,
    pub name: String,
    pub state: State,
    system: Arc<dyn SystemUtils>,
}

/// Factory for the `group` kind, closing over the system capability
pub fn preparer(system: Arc<dyn SystemUtils>) -> ResourceFactory {
    Arc::new(move |node| {
        let spec: Preparer = node.decode().map_err(DecodeError::from)?;
        Ok(Box::new(Group {
            gid: spec.gid,
            name: spec.name,
            state: spec.state,
            system: Arc::clone(&system),
        }))
    })
}

impl Group {
    fn desired(&self) -> String {
        format!("group {} with gid {}", self.name, self.gid)
    }
}

impl Resource for Group {
    fn kind(&self) -> &str {
        "group"
    }

    fn check(&self) -> Result<Status, ResourceError> {
        let by_name = self.system.lookup_group(&self.name)?;
        let by_gid = self.system.lookup_gid(&self.gid)?;

        let mut status = Status::no_change();

        match self.state {
            State::Present => match (by_name, by_gid) {
                (None, None) => {
                    status = Status::will_change();
                    status.record("group name and gid do not exist");
                    status.add_difference("group", State::Absent.as_str(), self.desired());
                }
                (None, Some(_)) => {
                    status = Status::fatal(format!("group gid {} already exists", self.gid));
                }
                (Some(_), None) => {
                    status = Status::fatal(format!("group {} already exists", self.name));
                }
                (Some(ref a), Some(ref b)) if a != b => {
                    status = Status::fatal(format!(
                        "group {} and gid {} belong to different groups",
                        self.name, self.gid
                    ));
                }
                (Some(_), Some(_)) => {}
            },
            State::Absent => match (by_name, by_gid) {
                (None, None) => {
                    status.record("group name and gid do not exist");
                }
                (None, Some(_)) => {
                    status = Status::fatal(format!("group {} does not exist", self.name));
                }
                (Some(_), None) => {
                    status = Status::fatal(format!("group gid {} does not exist", self.gid));
                }
                (Some(ref a), Some(ref b)) if a != b => {
                    status = Status::fatal(format!(
                        "group {} and gid {} belong to different groups",
                        self.name, self.gid
                    ));
                }
                (Some(_), Some(_)) => {
                    status = Status::will_change();
                    status.add_difference("group", self.desired(), State::Absent.as_str());
                }
            },
        }

        Ok(status)
    }

    fn apply(&self) -> Result<Status, ResourceError> {
        let by_name = self.system.lookup_group(&self.name)?;
        let by_gid = self.system.lookup_gid(&self.gid)?;

        let mut status = Status::no_change();

        match self.state {
            State::Present => match (by_name, by_gid) {
                (None, None) => {
                    self.system.add_group(&self.name, &self.gid)?;
                    status.record(format!("added {}", self.desired()));
                }
                _ => {
                    return Err(ResourceError::Failed(format!(
                        "will not attempt add: {}",
                        self.desired()
                    )));
                }
            },
            State::Absent => match (by_name, by_gid) {
                (Some(ref a), Some(ref b)) if a == b => {
                    self.system.del_group(&self.name)?;
                    status.record(format!("deleted {}", self.desired()));
                }
                _ => {
                    return Err(ResourceError::Failed(format!(
                        "will not attempt delete: {}",
                        self.desired()
                    )));
                }
            },
        }

        Ok(status)
    }
}

/// The real capability: reads `/etc/group`, shells out to `groupadd` and
/// `groupdel` for mutation.
#[derive(Debug, Default)]
pub struct EtcGroup;

const GROUP_FILE: &str = "/etc/group";

impl EtcGroup {
    fn entries(&self) -> io::Result<Vec<GroupEntry>> {
        let content = fs::read_to_string(GROUP_FILE)?;
        Ok(content
            .lines()
            .filter_map(|line| {
                let mut fields = line.split(':');
                let name = fields.next()?;
                let _password = fields.next()?;
                let gid = fields.next()?;
                Some(GroupEntry {
                    name: name.to_string(),
                    gid: gid.to_string(),
                })
            })
            .collect())
    }

    fn run(command: &str, args: &[&str]) -> io::Result<()> {
        let status = Command::new(command).args(args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", command, status),
            ))
        }
    }
}

impl SystemUtils for EtcGroup {
    fn add_group(&self, name: &str, gid: &str) -> io::Result<()> {
        Self::run("groupadd", &["--gid", gid, name])
    }

    fn del_group(&self, name: &str) -> io::Result<()> {
        Self::run("groupdel", &[name])
    }

    fn lookup_group(&self, name: &str) -> io::Result<Option<GroupEntry>> {
        Ok(self.entries()?.into_iter().find(|e| e.name == name))
    }

    fn lookup_gid(&self, gid: &str) -> io::Result<Option<GroupEntry>> {
        Ok(self.entries()?.into_iter().find(|e| e.gid == gid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeSystem {
        groups: Mutex<Vec<GroupEntry>>,
        added: Mutex<Vec<(String, String)>>,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeSystem {
        fn with_group(name: &str, gid: &str) -> Arc<Self> {
            let fake = Self::default();
            fake.groups.lock().unwrap().push(GroupEntry {
                name: name.to_string(),
                gid: gid.to_string(),
            });
            Arc::new(fake)
        }
    }

    impl SystemUtils for FakeSystem {
        fn add_group(&self, name: &str, gid: &str) -> io::Result<()> {
            self.added
                .lock()
                .unwrap()
                .push((name.to_string(), gid.to_string()));
            Ok(())
        }

        fn del_group(&self, name: &str) -> io::Result<()> {
            self.deleted.lock().unwrap().push(name.to_string());
            Ok(())
        }

        fn lookup_group(&self, name: &str) -> io::Result<Option<GroupEntry>> {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.name == name)
                .cloned())
        }

        fn lookup_gid(&self, gid: &str) -> io::Result<Option<GroupEntry>> {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.gid == gid)
                .cloned())
        }
    }

    fn group(system: Arc<FakeSystem>, state: State) -> Group {
        Group {
            gid: "4242".to_string(),
            name: "ops".to_string(),
            state,
            system,
        }
    }

    #[test]
    fn present_and_missing_will_change() {
        let g = group(Arc::new(FakeSystem::default()), State::Present);
        let status = g.check().unwrap();

        assert!(status.is_will_change());
        assert_eq!(status.diffs[0].current, "absent");
        assert_eq!(status.diffs[0].desired, "group ops with gid 4242");
    }

    #[test]
    fn present_and_existing_is_no_change() {
        let g = group(FakeSystem::with_group("ops", "4242"), State::Present);
        let status = g.check().unwrap();
        assert_eq!(status.level, super::super::StatusLevel::NoChange);
    }

    #[test]
    fn present_with_taken_gid_is_fatal() {
        let g = group(FakeSystem::with_group("other", "4242"), State::Present);
        let status = g.check().unwrap();

        assert_eq!(status.level, super::super::StatusLevel::Fatal);
        assert_eq!(status.messages, vec!["group gid 4242 already exists"]);
    }

    #[test]
    fn present_with_taken_name_is_fatal() {
        let g = group(FakeSystem::with_group("ops", "9999"), State::Present);
        let status = g.check().unwrap();

        assert_eq!(status.level, super::super::StatusLevel::Fatal);
        assert_eq!(status.messages, vec!["group ops already exists"]);
    }

    #[test]
    fn absent_and_missing_is_no_change() {
        let g = group(Arc::new(FakeSystem::default()), State::Absent);
        let status = g.check().unwrap();
        assert_eq!(status.level, super::super::StatusLevel::NoChange);
    }

    #[test]
    fn absent_and_existing_will_change() {
        let g = group(FakeSystem::with_group("ops", "4242"), State::Absent);
        let status = g.check().unwrap();

        assert!(status.is_will_change());
        assert_eq!(status.diffs[0].desired, "absent");
    }

    #[test]
    fn apply_adds_missing_group() {
        let system = Arc::new(FakeSystem::default());
        let g = group(Arc::clone(&system), State::Present);

        let status = g.apply().unwrap();
        assert_eq!(status.messages, vec!["added group ops with gid 4242"]);
        assert_eq!(
            system.added.lock().unwrap().as_slice(),
            &[("ops".to_string(), "4242".to_string())]
        );
    }

    #[test]
    fn apply_refuses_conflicting_add() {
        let g = group(FakeSystem::with_group("other", "4242"), State::Present);
        let err = g.apply().unwrap_err();
        assert!(err.to_string().starts_with("will not attempt add"));
    }

    #[test]
    fn apply_deletes_existing_group() {
        let system = FakeSystem::with_group("ops", "4242");
        let g = group(Arc::clone(&system), State::Absent);

        let status = g.apply().unwrap();
        assert_eq!(status.messages, vec!["deleted group ops with gid 4242"]);
        assert_eq!(system.deleted.lock().unwrap().as_slice(), &["ops".to_string()]);
    }

    #[test]
    fn state_decodes_from_lowercase() {
        let node = crate::parse::parse("[group.ops]\ngid = \"42\"\nname = \"ops\"\nstate = \"absent\"")
            .unwrap()
            .remove(0);
        let spec: Preparer = node.decode().unwrap();
        assert_eq!(spec.state, State::Absent);
    }
}
