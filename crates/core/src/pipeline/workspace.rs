use std::path::{Path, PathBuf};

use crate::error::ProcessError;

/// Job-scoped scratch directory for rendered avatars.
///
/// Backed by a `TempDir`: dropping the workspace removes the directory
/// and everything in it, which covers the error path for free. A caller
/// that wants the files to outlive the job calls [`persist`].
///
/// [`persist`]: JobWorkspace::persist
pub struct JobWorkspace {
    dir: tempfile::TempDir,
}

impl JobWorkspace {
    pub fn create() -> Result<Self, ProcessError> {
        let dir = tempfile::Builder::new().prefix("facegroup-job-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn avatar_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.jpg"))
    }

    /// Disables cleanup and returns the directory path.
    pub fn persist(self) -> PathBuf {
        self.dir.keep()
    }
}
