//! Fallback data source for hosts without a process-information filesystem.
//!
//! The status command is queried for four columns of a single pid:
//!
//! ```text
//!    RSS      VSZ      TIME     UTIME
//!   1024   316964   0:16.63   0:03.00
//! ```
//!
//! Memory is reported in kibibytes, both times as `MM:SS.CC`. `TIME` is the total CPU time
//! (user + system) and `UTIME` the user share.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::duration::CpuDuration;
use super::status::kib_to_bytes;
use super::{CommandError, DurationParseError};

/// Columns requested from `ps`, in the order [`StatusReport::parse`] expects them.
const PS_COLUMNS: &str = "rss,vsz,time,utime";
const COLUMN_COUNT: usize = 4;

/// Runs the external status query for a pid.
///
/// Implemented by [`PsCommand`]; tests substitute canned output.
pub trait StatusCommand {
    /// Returns the standard output of the query.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the program cannot be started and
    /// [`CommandError::Status`] if it exits unsuccessfully, e.g. for an unknown pid.
    fn query(&self, pid: u32) -> Result<String, CommandError>;
}

/// Queries `ps` as `ps So rss,vsz,time,utime -p <pid>`.
#[derive(Debug, Clone)]
pub struct PsCommand {
    program: PathBuf,
}

impl Default for PsCommand {
    fn default() -> Self {
        Self::new("ps")
    }
}

impl PsCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl StatusCommand for PsCommand {
    fn query(&self, pid: u32) -> Result<String, CommandError> {
        let output = Command::new(&self.program)
            .args(["So", PS_COLUMNS, "-p", &pid.to_string()])
            .output()
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Status {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// One parsed data line of the status command.
///
/// Memory columns are required. The time columns are kept as individual results so that a
/// malformed time only affects the counters derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub rss_bytes: i64,
    pub vsz_bytes: i64,
    pub total_time: Result<CpuDuration, DurationParseError>,
    pub user_time: Result<CpuDuration, DurationParseError>,
}

impl StatusReport {
    /// Parses the header and data line of the status command output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::MissingDataLine`] if there is no second line,
    /// [`CommandError::ColumnCount`] unless it has exactly four columns and
    /// [`CommandError::InvalidValue`] / [`CommandError::OutOfRange`] for bad memory values.
    pub fn parse(output: &str) -> Result<Self, CommandError> {
        let line = output
            .lines()
            .nth(1)
            .ok_or_else(|| CommandError::MissingDataLine {
                output: output.to_owned(),
            })?;

        let columns: Vec<&str> = line.split_whitespace().collect();
        let &[rss, vsz, total, user] = columns.as_slice() else {
            return Err(CommandError::ColumnCount {
                expected: COLUMN_COUNT,
                found: columns.len(),
                line: line.to_owned(),
            });
        };

        Ok(Self {
            rss_bytes: parse_kib("rss", rss)?,
            vsz_bytes: parse_kib("vsz", vsz)?,
            total_time: total.parse(),
            user_time: user.parse(),
        })
    }

    /// System time, derived as total minus user. Needs both times.
    pub fn system_ticks(&self) -> Option<i64> {
        match (&self.total_time, &self.user_time) {
            (Ok(total), Ok(user)) => Some(total.ticks() - user.ticks()),
            _ => None,
        }
    }
}

fn parse_kib(column: &'static str, value: &str) -> Result<i64, CommandError> {
    let kib = value
        .parse::<u64>()
        .map_err(|source| CommandError::InvalidValue {
            column,
            value: value.to_owned(),
            source,
        })?;
    kib_to_bytes(kib).ok_or(CommandError::OutOfRange { column, value: kib })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_report() {
        let output = "   RSS      VSZ      TIME     UTIME\n  1024   316964   0:16.63   0:03.00\n";
        let report = StatusReport::parse(output).unwrap();
        assert_eq!(report.rss_bytes, 1024 * 1024);
        assert_eq!(report.vsz_bytes, 316_964 * 1024);
        assert_eq!(report.total_time.as_ref().unwrap().ticks(), 1663);
        assert_eq!(report.user_time.as_ref().unwrap().ticks(), 300);
        assert_eq!(report.system_ticks(), Some(1363));
    }

    #[test]
    fn test_parse_status_report_bad_time_is_kept() {
        let output = "RSS VSZ TIME UTIME\n1024 2048 1:02:03 0:01.00\n";
        let report = StatusReport::parse(output).unwrap();
        assert_eq!(report.rss_bytes, 1024 * 1024);
        assert_eq!(
            report.total_time,
            Err(DurationParseError::Malformed("1:02:03".into()))
        );
        assert!(report.user_time.is_ok());
        assert_eq!(report.system_ticks(), None);
    }

    #[test]
    fn test_parse_status_report_missing_data_line() {
        let err = StatusReport::parse("RSS VSZ TIME UTIME\n").unwrap_err();
        assert!(matches!(err, CommandError::MissingDataLine { .. }));
        assert!(StatusReport::parse("").is_err());
    }

    #[test]
    fn test_parse_status_report_column_count() {
        let err = StatusReport::parse("RSS VSZ TIME UTIME\n1024 2048 0:01.00\n").unwrap_err();
        assert!(matches!(
            err,
            CommandError::ColumnCount {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_status_report_bad_memory() {
        let err =
            StatusReport::parse("RSS VSZ TIME UTIME\n1024 lots 0:01.00 0:00.50\n").unwrap_err();
        match err {
            CommandError::InvalidValue { column, value, .. } => {
                assert_eq!(column, "vsz");
                assert_eq!(value, "lots");
            }
            other => panic!("Expected InvalidValue error, got {other:?}"),
        }
    }

    #[test]
    fn test_ps_command_program() {
        assert_eq!(PsCommand::default().program(), Path::new("ps"));
        assert_eq!(PsCommand::new("/bin/ps").program(), Path::new("/bin/ps"));
    }

    #[test]
    fn test_ps_command_failure_status() {
        let err = PsCommand::new("false").query(1).unwrap_err();
        match err {
            CommandError::Status { program, status, .. } => {
                assert_eq!(program, PathBuf::from("false"));
                assert_eq!(status.code(), Some(1));
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }

    #[test]
    fn test_ps_command_spawn_failure() {
        let cmd = PsCommand::new("/definitely/does/not/exist/ps");
        let err = cmd.query(1).unwrap_err();
        match err {
            CommandError::Spawn { program, source } => {
                assert_eq!(program, PathBuf::from("/definitely/does/not/exist/ps"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Expected Spawn error, got {other:?}"),
        }
    }
}
