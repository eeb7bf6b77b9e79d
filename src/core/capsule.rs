// src/core/capsule.rs

use crate::constants::{CAPSULE_ENV, COPY_BUFFER_SIZE};
use crate::core::payload::ExtractionError;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

/// Returns the location of the capsule being launched.
///
/// `WARBOOT_CAPSULE` wins when set; otherwise the capsule is the running
/// executable itself, with the archive appended to the launcher binary.
pub fn locate() -> io::Result<PathBuf> {
    match env::var_os(CAPSULE_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => env::current_exe(),
    }
}

/// Read access to the entries of a capsule archive.
#[derive(Debug)]
pub struct Capsule {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl Capsule {
    /// Opens the archive at `path`. Leading data (the launcher binary) is tolerated.
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let file = File::open(path).map_err(|e| ExtractionError::Io {
            entry: path.display().to_string(),
            source: e,
        })?;
        let archive = ZipArchive::new(file).map_err(|e| archive_error(path, e))?;
        log::debug!("Opened capsule '{}' ({} entries)", path.display(), archive.len());
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in archive order.
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Reads a text entry. `Ok(None)` means the entry does not exist.
    pub fn read_to_string(&mut self, name: &str) -> Result<Option<String>, ExtractionError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(archive_error(&self.path, e)),
        };
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| ExtractionError::Io {
                entry: name.to_string(),
                source: e,
            })?;
        Ok(Some(content))
    }

    /// Copies the bytes of entry `name` into `out` through a fixed-size buffer.
    ///
    /// # Errors
    /// `ExtractionError::MissingPayload` if the entry does not exist.
    pub fn copy_entry<W: Write>(&mut self, name: &str, out: &mut W) -> Result<u64, ExtractionError> {
        let entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(ExtractionError::MissingPayload {
                    entry: name.to_string(),
                    capsule: self.path.display().to_string(),
                });
            }
            Err(e) => return Err(archive_error(&self.path, e)),
        };
        let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, entry);
        io::copy(&mut reader, out).map_err(|e| ExtractionError::Io {
            entry: name.to_string(),
            source: e,
        })
    }
}

fn archive_error(path: &Path, source: ZipError) -> ExtractionError {
    ExtractionError::Archive {
        path: path.display().to_string(),
        source,
    }
}
