use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Error that occurs when the existence of a path cannot be determined.
#[derive(Debug, thiserror::Error)]
#[error("failed to check if path `{path}` exists: {source}")]
pub struct ExistenceCheckError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use proc_sampler::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/status")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Returns whether `path` exists.
///
/// Unlike [`Path::exists`], errors other than "not found" (e.g. permission denied on a
/// parent directory) are reported instead of being folded into `false`.
///
/// # Errors
///
/// Returns an [`ExistenceCheckError`] if the check itself fails.
pub fn path_exists(path: impl AsRef<Path>) -> Result<bool, ExistenceCheckError> {
    let path = path.as_ref();
    path.try_exists().map_err(|source| ExistenceCheckError {
        path: path.to_path_buf(),
        source,
    })
}
