//! The leader's per-iteration setup and teardown.
//!
//! Only the leader's fixture runs, before and after *every* initiator, whichever collaborator owns that initiator.
//! Collaborators have no setup of their own; state they need is produced by their initiators.

use std::fmt;
use std::rc::Rc;

use super::error::SetupError;
use super::isolation::{EnvironmentContext, FsProvisioner, Provisioner};

/// Per-iteration setup and teardown owned by the leader.
pub trait Fixture {
    /// Bring the isolated environment to a known-clean state before an initiator runs.
    fn set_up(&mut self, env: &EnvironmentContext) -> Result<(), SetupError>;

    /// Undo per-iteration state after an initiator (and its verifiers) ran.
    fn tear_down(&mut self, _env: &EnvironmentContext) {}
}

/// Default fixture: empties the isolated file directory before every initiator.
///
/// The directory is cleared and recreated through the same [`Provisioner`] that created it.
#[derive(Clone)]
pub struct CleanSlate {
    provisioner: Rc<dyn Provisioner>,
}

impl CleanSlate {
    pub fn new(provisioner: Rc<dyn Provisioner>) -> Self {
        Self { provisioner }
    }
}

impl Default for CleanSlate {
    fn default() -> Self {
        Self::new(Rc::new(FsProvisioner))
    }
}

impl fmt::Debug for CleanSlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanSlate").finish_non_exhaustive()
    }
}

impl Fixture for CleanSlate {
    fn set_up(&mut self, env: &EnvironmentContext) -> Result<(), SetupError> {
        let dir = &env.isolated.file_dir;
        if self.provisioner.exists(dir) {
            self.provisioner
                .discard(dir)
                .map_err(|e| SetupError::io(format!("cannot clear {}", dir.display()), e))?;
        }
        self.provisioner
            .provision(dir)
            .map_err(|e| SetupError::io(format!("cannot create {}", dir.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::engine::isolation::Namespace;

    fn context(dir: &Path) -> EnvironmentContext {
        EnvironmentContext {
            name: "collabtest".to_string(),
            isolated: Namespace::new("collabtest", dir.join("collab").join("test")),
            previous: Namespace::new("", dir),
        }
    }

    #[test]
    fn test_clean_slate_empties_directory() {
        let root = tempfile::tempdir().unwrap();
        let env = context(root.path());
        let mut fixture = CleanSlate::default();

        fixture.set_up(&env).unwrap();
        std::fs::write(env.isolated.file_dir.join("leftover.txt"), "x").unwrap();
        fixture.set_up(&env).unwrap();

        assert!(env.isolated.file_dir.is_dir());
        assert_eq!(std::fs::read_dir(&env.isolated.file_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_slate_reports_failure() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let env = EnvironmentContext {
            name: "collabtest".to_string(),
            isolated: Namespace::new("collabtest", blocker.join("inner")),
            previous: Namespace::new("", root.path()),
        };
        assert!(CleanSlate::default().set_up(&env).is_err());
    }

    /// Provisioner that only remembers what it was asked to do.
    #[derive(Default)]
    struct RecordingProvisioner {
        existing: bool,
        calls: std::cell::RefCell<Vec<String>>,
    }

    impl Provisioner for RecordingProvisioner {
        fn exists(&self, _dir: &Path) -> bool {
            self.existing
        }

        fn provision(&self, dir: &Path) -> std::io::Result<()> {
            self.calls.borrow_mut().push(format!("provision {}", dir.display()));
            Ok(())
        }

        fn discard(&self, dir: &Path) -> std::io::Result<()> {
            self.calls.borrow_mut().push(format!("discard {}", dir.display()));
            Ok(())
        }
    }

    #[test]
    fn test_clean_slate_goes_through_provisioner() {
        let provisioner = Rc::new(RecordingProvisioner {
            existing: true,
            ..Default::default()
        });
        let env = context(Path::new("/nonexistent/concord"));
        let mut fixture = CleanSlate::new(provisioner.clone());

        fixture.set_up(&env).unwrap();

        assert_eq!(
            *provisioner.calls.borrow(),
            vec![
                "discard /nonexistent/concord/collab/test",
                "provision /nonexistent/concord/collab/test"
            ]
        );
        assert!(!Path::new("/nonexistent/concord").exists());
    }
}
