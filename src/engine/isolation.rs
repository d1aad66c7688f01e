//! Environment isolation for a run.
//!
//! A run works inside a uniquely named namespace pair: a storage prefix and a file directory. The namespace active
//! before the run is held in an explicit [`ActiveNamespace`] value (never process globals); acquiring isolation
//! snapshots it and switches it to the fresh namespace, and the returned [`EnvironmentGuard`] switches it back when
//! released or dropped, including during unwinding.

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use concord_core::naming::isolated_name;
use uuid::Uuid;

use super::error::EnvironmentError;

/// Number of fresh names tried before giving up on a collision-free namespace.
pub const MAX_NAME_ATTEMPTS: usize = 8;

/// Length of the random suffix appended to the namespace base.
const SUFFIX_LEN: usize = 12;

/// A storage prefix and file directory pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub storage_prefix: String,
    pub file_dir: PathBuf,
}

impl Namespace {
    pub fn new(storage_prefix: impl Into<String>, file_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_prefix: storage_prefix.into(),
            file_dir: file_dir.into(),
        }
    }
}

/// The namespace currently in effect for the host.
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone)]
pub struct ActiveNamespace {
    slot: Rc<RefCell<Namespace>>,
}

impl ActiveNamespace {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            slot: Rc::new(RefCell::new(namespace)),
        }
    }

    pub fn get(&self) -> Namespace {
        self.slot.borrow().clone()
    }

    fn replace(&self, namespace: Namespace) -> Namespace {
        self.slot.replace(namespace)
    }
}

/// Creates and removes file namespaces.
pub trait Provisioner {
    fn exists(&self, dir: &Path) -> bool;

    /// Create `dir` (and parents) if absent.
    fn provision(&self, dir: &Path) -> io::Result<()>;

    /// Remove `dir` and its contents.
    fn discard(&self, dir: &Path) -> io::Result<()>;
}

/// Provisioner backed by the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProvisioner;

impl Provisioner for FsProvisioner {
    fn exists(&self, dir: &Path) -> bool {
        dir.exists()
    }

    fn provision(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn discard(&self, dir: &Path) -> io::Result<()> {
        match std::fs::remove_dir_all(dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// The isolated namespace of a run together with the namespace it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    /// `<base><suffix>`, unique per acquisition.
    pub name: String,
    pub isolated: Namespace,
    pub previous: Namespace,
}

/// Acquires and releases isolated namespaces.
pub struct EnvironmentIsolator {
    active: ActiveNamespace,
    provisioner: Rc<dyn Provisioner>,
    keep_artifacts: bool,
    in_use: Rc<Cell<bool>>,
}

impl EnvironmentIsolator {
    pub fn new(active: ActiveNamespace, provisioner: Rc<dyn Provisioner>) -> Self {
        Self {
            active,
            provisioner,
            keep_artifacts: false,
            in_use: Rc::new(Cell::new(false)),
        }
    }

    /// Leave isolated file directories on disk after release.
    pub fn with_keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    pub fn active(&self) -> &ActiveNamespace {
        &self.active
    }

    /// Switch to a fresh isolated namespace derived from `base`.
    ///
    /// ## Errors
    /// - [`EnvironmentError::InUse`] if a previous acquisition has not been released.
    /// - [`EnvironmentError::NameExhausted`] if every generated name collided with an existing directory.
    /// - [`EnvironmentError::Provision`] if the file namespace cannot be created.
    pub fn acquire(&self, base: &str) -> Result<EnvironmentGuard, EnvironmentError> {
        if self.in_use.get() {
            return Err(EnvironmentError::InUse);
        }
        let previous = self.active.get();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let suffix = unique_suffix();
            let file_dir = previous.file_dir.join(base).join(&suffix);
            if self.provisioner.exists(&file_dir) {
                tracing::debug!(path = %file_dir.display(), "isolated namespace name collision, retrying");
                continue;
            }
            self.provisioner
                .provision(&file_dir)
                .map_err(|source| EnvironmentError::Provision {
                    path: file_dir.clone(),
                    source,
                })?;

            let name = isolated_name(base, &suffix);
            let isolated = Namespace::new(format!("{}{}", previous.storage_prefix, name), file_dir);
            self.active.replace(isolated.clone());
            self.in_use.set(true);
            tracing::debug!(namespace = %name, "isolated environment acquired");

            return Ok(EnvironmentGuard {
                context: EnvironmentContext {
                    name,
                    isolated,
                    previous,
                },
                active: self.active.clone(),
                provisioner: Rc::clone(&self.provisioner),
                keep_artifacts: self.keep_artifacts,
                in_use: Rc::clone(&self.in_use),
                released: false,
            });
        }

        Err(EnvironmentError::NameExhausted {
            attempts: MAX_NAME_ATTEMPTS,
        })
    }
}

fn unique_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Scoped ownership of an isolated namespace; restores the previous namespace exactly once.
#[must_use = "dropping the guard immediately releases the isolated environment"]
pub struct EnvironmentGuard {
    context: EnvironmentContext,
    active: ActiveNamespace,
    provisioner: Rc<dyn Provisioner>,
    keep_artifacts: bool,
    in_use: Rc<Cell<bool>>,
    released: bool,
}

impl EnvironmentGuard {
    pub fn context(&self) -> &EnvironmentContext {
        &self.context
    }

    /// Restore the previous namespace and discard the isolated one.
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.active.replace(self.context.previous.clone());
        if !self.keep_artifacts {
            if let Err(e) = self.provisioner.discard(&self.context.isolated.file_dir) {
                tracing::warn!(
                    path = %self.context.isolated.file_dir.display(),
                    error = %e,
                    "failed to discard isolated file namespace"
                );
            }
        }
        self.in_use.set(false);
        tracing::debug!(namespace = %self.context.name, "isolated environment released");
    }
}

impl Drop for EnvironmentGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
