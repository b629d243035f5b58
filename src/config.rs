use std::path::PathBuf;
use std::time::Duration;

use crate::process::TICKS_PER_SEC;

/// Errors that may occur while reading the sampler configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid number in `{var}`: `{value}`")]
    InvalidNumber { var: &'static str, value: String },
    #[error("`{var}` must be greater than zero")]
    Zero { var: &'static str },
}

/// Settings of the sampling loop.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Process-information root probed on every pass.
    pub proc_root: PathBuf,
    /// Program queried when `proc_root` is missing.
    pub status_command: PathBuf,
    /// Seconds between two samples. Also the rate window of the CPU counters.
    pub cycle_secs: u64,
    /// Pid to watch; the sampler's own pid when unset.
    pub pid: Option<u32>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            status_command: PathBuf::from("ps"),
            cycle_secs: 15,
            pid: None,
        }
    }
}

impl SamplerConfig {
    /// Reads `PROC_ROOT`, `STATUS_COMMAND`, `SAMPLE_INTERVAL_SECS` and `SAMPLE_PID`,
    /// falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric variable is malformed or zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`SamplerConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup("PROC_ROOT") {
            config.proc_root = PathBuf::from(root);
        }
        if let Some(command) = lookup("STATUS_COMMAND") {
            config.status_command = PathBuf::from(command);
        }
        if let Some(secs) = lookup("SAMPLE_INTERVAL_SECS") {
            config.cycle_secs = parse_number("SAMPLE_INTERVAL_SECS", &secs)?;
            if config.cycle_secs == 0 {
                return Err(ConfigError::Zero {
                    var: "SAMPLE_INTERVAL_SECS",
                });
            }
        }
        if let Some(pid) = lookup("SAMPLE_PID") {
            config.pid = Some(parse_number("SAMPLE_PID", &pid)?);
        }

        Ok(config)
    }

    pub fn cycle(&self) -> Duration {
        Duration::from_secs(self.cycle_secs)
    }

    /// Length of one sampling cycle in CPU ticks.
    pub fn cycle_ticks(&self) -> i64 {
        i64::try_from(self.cycle_secs.saturating_mul(TICKS_PER_SEC)).unwrap_or(i64::MAX)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_owned(),
        })
}
