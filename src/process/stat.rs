//! CPU tick counters from `/proc/<pid>/stat`.
//!
//! The file is a single space-separated record. Fields are addressed by their fixed
//! 0-based position, see `proc_pid_stat(5)`:
//!
//! | index | name     | meaning                                   |
//! |-------|----------|-------------------------------------------|
//! | 13    | `utime`  | ticks spent in user mode                  |
//! | 14    | `stime`  | ticks spent in kernel mode                |
//! | 15    | `cutime` | user ticks of waited-for, terminated children   |
//! | 16    | `cstime` | kernel ticks of waited-for, terminated children |

use std::io::BufRead;

use super::StatParseError;

const UTIME: usize = 13;
const STIME: usize = 14;
const CUTIME: usize = 15;
const CSTIME: usize = 16;

/// Raw tick counters of one process, no unit conversion applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: i64,
    pub system: i64,
    pub children_user: i64,
    pub children_system: i64,
}

impl CpuTicks {
    /// Parses the first line of a stat document.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::MissingField`] if the record is too short and
    /// [`StatParseError::InvalidField`] if one of the tick fields is not an integer.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        Self::parse_line(&line)
    }

    pub fn parse_line(line: &str) -> Result<Self, StatParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= CSTIME {
            return Err(StatParseError::MissingField {
                expected: CSTIME + 1,
                found: fields.len(),
            });
        }

        let field = |index: usize| {
            fields[index]
                .parse::<i64>()
                .map_err(|source| StatParseError::InvalidField {
                    index,
                    value: fields[index].to_owned(),
                    source,
                })
        };

        Ok(Self {
            user: field(UTIME)?,
            system: field(STIME)?,
            children_user: field(CUTIME)?,
            children_system: field(CSTIME)?,
        })
    }
}
