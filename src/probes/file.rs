//! Filesystem probe.
use std::io::ErrorKind;
use std::path::Path;

use super::{ObservedState, ProbeError};

/// Observe whether `path` exists and whether it is a directory.
///
/// Symlinks are followed, so a dangling link reads as absent.
///
/// # Errors
///
/// Returns [`ProbeError::Io`] for any failure other than the entry not
/// existing (permission denied, device errors, ...).
pub fn probe(path: &str) -> Result<ObservedState, ProbeError> {
    match std::fs::metadata(Path::new(path)) {
        Ok(meta) => Ok(ObservedState::File {
            exists: true,
            is_directory: meta.is_dir(),
        }),
        Err(e) if is_absent(&e) => Ok(ObservedState::File {
            exists: false,
            is_directory: false,
        }),
        Err(source) => Err(ProbeError::Io {
            path: path.to_string(),
            source,
        }),
    }
}

/// `NotFound` plus the "a path component is a regular file" case, which is
/// just another way of not existing.
fn is_absent(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn probe_path(path: &Path) -> Result<ObservedState, ProbeError> {
        probe(&path.to_string_lossy())
    }

    #[test]
    fn missing_path_is_observed_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let state = probe_path(&dir.path().join("Tentacle.exe")).unwrap();
        assert_eq!(
            state,
            ObservedState::File {
                exists: false,
                is_directory: false
            }
        );
    }

    #[test]
    fn missing_nested_path_is_observed_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let state = probe_path(&dir.path().join("a/b/c/d.txt")).unwrap();
        assert!(matches!(state, ObservedState::File { exists: false, .. }));
    }

    #[test]
    fn path_below_regular_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let state = probe_path(&file.join("child")).unwrap();
        assert!(matches!(state, ObservedState::File { exists: false, .. }));
    }

    #[test]
    fn directory_is_observed() {
        let dir = tempfile::tempdir().unwrap();
        let state = probe_path(dir.path()).unwrap();
        assert_eq!(
            state,
            ObservedState::File {
                exists: true,
                is_directory: true
            }
        );
    }

    #[test]
    fn regular_file_is_observed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Tentacle.exe");
        std::fs::write(&file, b"MZ").unwrap();
        let state = probe_path(&file).unwrap();
        assert_eq!(
            state,
            ObservedState::File {
                exists: true,
                is_directory: false
            }
        );
    }

    #[test]
    fn probing_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = probe_path(dir.path()).unwrap();
        let second = probe_path(dir.path()).unwrap();
        assert_eq!(first, second);
    }
}
