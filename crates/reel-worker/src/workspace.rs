//! Ephemeral per-execution job workspaces.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// A fresh, uniquely-named directory owned by exactly one stage execution.
///
/// One root per stage family bounds the blast radius of naming collisions.
/// The directory and everything in it is removed on every return path of
/// the owning handler (success, error, panic unwind) via `Drop`.
#[derive(Debug)]
pub struct JobWorkspace {
    path: PathBuf,
}

impl JobWorkspace {
    /// Acquire a workspace under `{root}/{scope}/job-{uuid}`.
    ///
    /// Failure (filesystem exhaustion) is fatal only to the current
    /// message; it propagates and the queue redelivers.
    pub fn acquire(root: &Path, scope: &str) -> io::Result<Self> {
        let path = root.join(scope).join(format!("job-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        debug!("Acquired workspace {}", path.display());
        Ok(Self { path })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path for a file inside the workspace.
    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove workspace {}: {}", self.path.display(), e);
            }
        }
    }
}
