//! Structured error types for process sampling.
//!
//! - [`StatParseError`]: a per-process file (`status`, `stat`) could not be parsed.
//! - [`DurationParseError`]: a `MM:SS.CC` CPU time did not match the expected shape.
//! - [`CommandError`]: the fallback status command failed or produced unusable output.
//! - [`CollectError`]: what [`ProcessSampler::collect`](super::ProcessSampler::collect)
//!   returns, wrapping all of the above with the context of the failing step.

use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::fsutil;
use crate::metrics::StoreError;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("duplicate field '{field}' at line {line}")]
    DuplicateField { field: &'static str, line: usize },

    #[error("missing value for '{field}' at line {line}")]
    MissingValue { field: &'static str, line: usize },

    #[error("invalid value for '{field}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        field: &'static str,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("expected at least {expected} fields, found {found}")]
    MissingField { expected: usize, found: usize },

    #[error("invalid value in field {index}: '{value}': {source}")]
    InvalidField {
        index: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("value for '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("cpu time '{0}' does not match MM:SS.CC")]
    Malformed(String),

    #[error("cpu time '{0}' is too large")]
    OutOfRange(String),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Status {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("missing data line in output: '{output}'")]
    MissingDataLine { output: String },

    #[error("expected {expected} columns, found {found} in line '{line}'")]
    ColumnCount {
        expected: usize,
        found: usize,
        line: String,
    },

    #[error("invalid value for '{column}': '{value}': {source}")]
    InvalidValue {
        column: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("value for '{column}' out of range: {value}")]
    OutOfRange { column: &'static str, value: u64 },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Probe(#[from] fsutil::ExistenceCheckError),

    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),

    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: StatParseError,
    },

    #[error("status command failed for pid {pid}: {source}")]
    Command {
        pid: u32,
        #[source]
        source: CommandError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, CollectError>;
