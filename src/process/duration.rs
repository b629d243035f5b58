//! Parsing of the compact `MM:SS.CC` CPU time format printed by `ps`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::DurationParseError;

static CPU_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A([0-9]+):([0-9]{2})\.([0-9]{2})\z")
        .expect("cpu time pattern is a valid regex")
});

const CENTIS_PER_MINUTE: i64 = 60 * 100;

/// A CPU time of minutes, seconds and centiseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuDuration {
    minutes: u32,
    seconds: u8,
    centiseconds: u8,
}

impl CpuDuration {
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn centiseconds(&self) -> u8 {
        self.centiseconds
    }

    /// Total duration in ticks of 1/100 s.
    pub fn ticks(&self) -> i64 {
        i64::from(self.minutes) * CENTIS_PER_MINUTE
            + i64::from(self.seconds) * 100
            + i64::from(self.centiseconds)
    }
}

impl FromStr for CpuDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CPU_TIME
            .captures(s)
            .ok_or_else(|| DurationParseError::Malformed(s.to_owned()))?;

        let minutes = caps[1]
            .parse::<u32>()
            .map_err(|_| DurationParseError::OutOfRange(s.to_owned()))?;
        // The pattern guarantees exactly two digits for both.
        let seconds = caps[2]
            .parse::<u8>()
            .map_err(|_| DurationParseError::Malformed(s.to_owned()))?;
        let centiseconds = caps[3]
            .parse::<u8>()
            .map_err(|_| DurationParseError::Malformed(s.to_owned()))?;

        Ok(Self {
            minutes,
            seconds,
            centiseconds,
        })
    }
}
