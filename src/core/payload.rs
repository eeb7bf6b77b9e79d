// src/core/payload.rs

//! Extraction of capsule entries into the work area.
//!
//! Entries are remapped so the capsule's application root lands at the top of the
//! work area. Every extracted file is written to disk, but only library archives
//! (`*.jar`) are reported back as loader search-path entries.

use crate::constants::{
    APP_ROOT_PREFIX, LIBRARY_SUFFIX, PUBLIC_DIR, SKIPPED_ENTRIES, WEBSERVER_JAR,
};
use crate::core::capsule::Capsule;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Capsule entry '{entry}' was not found in '{capsule}'")]
    MissingPayload { entry: String, capsule: String },
    #[error("Refusing to extract entry '{0}': it escapes the work area")]
    UnsafeEntry(String),
    #[error("Could not read capsule '{path}': {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("I/O error while extracting '{entry}': {source}")]
    Io {
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractionError {
    /// True when the server library payload itself is absent from the capsule.
    pub fn is_missing_webserver(&self) -> bool {
        matches!(self, Self::MissingPayload { entry, .. } if entry == WEBSERVER_JAR)
    }
}

/// Maps an archive entry name to its destination, relative to the work area.
///
/// - `WEB-INF/app/x.rb` -> `/app/x.rb`
/// - `404.html` -> `/public/404.html`
/// - `lib/foo.jar` -> `/lib/foo.jar`
pub fn map_entry_path(name: &str) -> String {
    if let Some(stripped) = name.strip_prefix(APP_ROOT_PREFIX) {
        return stripped.to_string();
    }
    if !name.contains('/') {
        return format!("/{}/{}", PUBLIC_DIR, name);
    }
    format!("/{}", name)
}

/// True when an extracted destination contributes to the loader search path.
pub fn is_library(destination: &str) -> bool {
    destination.ends_with(LIBRARY_SUFFIX)
}

fn validate_entry_name(name: &str) -> Result<(), ExtractionError> {
    let escapes = Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ExtractionError::UnsafeEntry(name.to_string()));
    }
    Ok(())
}

/// Extracts a single entry below `root`.
///
/// The bytes are always written; the return value is the absolute destination
/// only when it is a library archive.
pub fn extract_entry(
    capsule: &mut Capsule,
    name: &str,
    root: &Path,
) -> Result<Option<PathBuf>, ExtractionError> {
    validate_entry_name(name)?;
    let mapped = map_entry_path(name);
    let destination = root.join(mapped.trim_start_matches('/'));
    let io_error = |source| ExtractionError::Io {
        entry: name.to_string(),
        source,
    };

    if name.ends_with('/') {
        fs::create_dir_all(&destination).map_err(io_error)?;
        return Ok(None);
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut file = File::create(&destination).map_err(io_error)?;
    capsule.copy_entry(name, &mut file)?;
    file.flush().map_err(io_error)?;

    Ok(is_library(&mapped).then_some(destination))
}

/// Extracts every entry of the capsule below `root` and returns the loader
/// search path, in archive order.
pub fn extract_all(capsule: &mut Capsule, root: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let names = capsule.entry_names();
    let mut search_path = Vec::new();
    for name in &names {
        if SKIPPED_ENTRIES.contains(&name.as_str()) {
            continue;
        }
        if let Some(library) = extract_entry(capsule, name, root)? {
            log::debug!("Library added to search path: {}", library.display());
            search_path.push(library);
        }
    }
    log::debug!(
        "Extracted {} entries to '{}'",
        names.len(),
        root.display()
    );
    Ok(search_path)
}

/// Copies the web server library into its own temporary file, removed on drop.
pub fn extract_webserver(capsule: &mut Capsule) -> Result<NamedTempFile, ExtractionError> {
    let io_error = |source| ExtractionError::Io {
        entry: WEBSERVER_JAR.to_string(),
        source,
    };
    let mut jar_file = tempfile::Builder::new()
        .prefix("webserver")
        .suffix(LIBRARY_SUFFIX)
        .tempfile()
        .map_err(io_error)?;
    capsule.copy_entry(WEBSERVER_JAR, &mut jar_file)?;
    jar_file.flush().map_err(io_error)?;
    log::debug!("webserver.jar extracted to {}", jar_file.path().display());
    Ok(jar_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capsule::testing::write_capsule;
    use tempfile::tempdir;

    #[test]
    fn test_map_entry_path() {
        assert_eq!(map_entry_path("WEB-INF/app/x.rb"), "/app/x.rb");
        assert_eq!(map_entry_path("404.html"), "/public/404.html");
        assert_eq!(map_entry_path("lib/foo.jar"), "/lib/foo.jar");
        assert_eq!(map_entry_path("WEB-INF/"), "/");
    }

    #[test]
    fn test_is_library() {
        assert!(is_library("/lib/foo.jar"));
        assert!(!is_library("/public/404.html"));
        assert!(!is_library("/lib/foo.jar.txt"));
    }

    #[test]
    fn test_extract_all_writes_everything_but_reports_only_libraries() {
        let dir = tempdir().unwrap();
        let capsule_path = dir.path().join("app.war");
        write_capsule(
            &capsule_path,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
                ("WEB-INF/", b""),
                ("WEB-INF/app/x.rb", b"puts 1"),
                ("WEB-INF/lib/jruby-core.jar", b"jar bytes"),
                ("404.html", b"not found"),
                ("lib/foo.jar", b"foo"),
            ],
        );
        let root = dir.path().join("root");
        fs::create_dir_all(&root).unwrap();

        let mut capsule = Capsule::open(&capsule_path).unwrap();
        let search_path = extract_all(&mut capsule, &root).unwrap();

        assert_eq!(
            search_path,
            vec![root.join("lib/jruby-core.jar"), root.join("lib/foo.jar")]
        );
        assert_eq!(fs::read(root.join("app/x.rb")).unwrap(), b"puts 1");
        assert_eq!(fs::read(root.join("public/404.html")).unwrap(), b"not found");
        assert!(!root.join("META-INF/MANIFEST.MF").exists());
    }

    #[test]
    fn test_extract_entry_rejects_traversal() {
        let dir = tempdir().unwrap();
        let capsule_path = dir.path().join("app.war");
        write_capsule(&capsule_path, &[("index.html", b"")]);
        let mut capsule = Capsule::open(&capsule_path).unwrap();

        let err = extract_entry(&mut capsule, "lib/../../evil.jar", dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsafeEntry(_)));
    }

    #[test]
    fn test_extract_webserver() {
        let dir = tempdir().unwrap();
        let capsule_path = dir.path().join("app.war");
        write_capsule(&capsule_path, &[("WEB-INF/webserver.jar", b"server")]);
        let mut capsule = Capsule::open(&capsule_path).unwrap();

        let jar = extract_webserver(&mut capsule).unwrap();
        assert!(jar.path().to_string_lossy().ends_with(".jar"));
        assert_eq!(fs::read(jar.path()).unwrap(), b"server");

        let jar_path = jar.path().to_path_buf();
        drop(jar);
        assert!(!jar_path.exists());
    }

    #[test]
    fn test_missing_webserver_is_distinguished() {
        let dir = tempdir().unwrap();
        let capsule_path = dir.path().join("app.war");
        write_capsule(&capsule_path, &[("index.html", b"")]);
        let mut capsule = Capsule::open(&capsule_path).unwrap();

        let err = extract_webserver(&mut capsule).unwrap_err();
        assert!(err.is_missing_webserver());
    }
}
