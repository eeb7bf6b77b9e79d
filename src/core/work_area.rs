// src/core/work_area.rs

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkAreaError {
    #[error("Could not create the temporary work area: {0}")]
    Create(#[from] io::Error),
}

/// The private directory holding everything extracted for one run.
///
/// The extraction root is named after the capsule file and lives inside a fresh
/// scratch directory; removal always takes the scratch directory with it.
#[derive(Debug)]
pub struct WorkArea {
    scratch: Option<TempDir>,
    root: PathBuf,
}

impl WorkArea {
    /// Creates the scratch directory and the extraction root inside it.
    pub fn create(capsule: &Path) -> Result<Self, WorkAreaError> {
        Self::create_in(&tempfile::env::temp_dir(), capsule)
    }

    /// Like [`WorkArea::create`], with the scratch directory placed under `base`.
    pub fn create_in(base: &Path, capsule: &Path) -> Result<Self, WorkAreaError> {
        let scratch = tempfile::Builder::new()
            .prefix("warboot")
            .suffix("webroot")
            .tempdir_in(base)?;
        let name = capsule
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("capsule"));
        let root = scratch.path().join(name);
        fs::create_dir_all(&root)?;
        log::debug!("webroot directory is {}", root.display());

        Ok(Self {
            scratch: Some(scratch),
            root,
        })
    }

    /// The extraction root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute, platform-friendly rendering of the root, used for `{{webroot}}`.
    pub fn root_display(&self) -> String {
        dunce::simplified(&self.root).to_string_lossy().into_owned()
    }

    /// The scratch directory containing the root. `None` once removed.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Recursively deletes the scratch directory. Only the first call does any work.
    pub fn remove(&mut self) -> io::Result<()> {
        match self.scratch.take() {
            Some(scratch) => {
                let path = scratch.path().to_path_buf();
                scratch.close()?;
                log::debug!("Removed work area {}", path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for WorkArea {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            log::warn!("{} {}", t!("cleanup.warn.failed"), e);
        }
    }
}
