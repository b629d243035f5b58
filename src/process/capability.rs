use std::path::Path;

use crate::fsutil::{self, ExistenceCheckError};

/// Data sources a process can be sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Per-process files below a process-information root such as `/proc`.
    Structured,
    /// The external status command, for hosts without such a root (e.g. macOS, BSD).
    CommandFallback,
}

/// Decides which source to sample from by probing for the process-information root.
///
/// The decision is taken on every call, so the same binary works on hosts with and
/// without the root.
///
/// # Errors
///
/// Returns [`ExistenceCheckError`] if the existence of `proc_root` cannot be determined.
pub fn detect_source(proc_root: impl AsRef<Path>) -> Result<SourceKind, ExistenceCheckError> {
    if fsutil::path_exists(proc_root)? {
        Ok(SourceKind::Structured)
    } else {
        Ok(SourceKind::CommandFallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_structured_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_source(dir.path()).unwrap(), SourceKind::Structured);
    }

    #[test]
    fn test_detect_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            detect_source(dir.path().join("proc")).unwrap(),
            SourceKind::CommandFallback
        );
    }
}
