use std::path::PathBuf;

use crate::fsutil;
use crate::metrics::MetricStore;

use super::command::{StatusCommand, StatusReport};
use super::parser::LabeledStat;
use super::stat::CpuTicks;
use super::status::MemoryStatus;
use super::{CPU, CollectError, MEMORY, RSS, Result, SYSTEM, TOTAL_SYSTEM, TOTAL_USER, USER, VSZ};

/// A way of reading one process's memory and CPU figures into a store.
pub trait Source {
    /// Reads the current figures of `pid` and saves them into `store`.
    ///
    /// # Errors
    ///
    /// Hard failures abort the pass. Metrics saved before the failing step keep their new
    /// values, the others stay at their previous reading.
    fn collect(&self, pid: u32, store: &mut MetricStore) -> Result<()>;
}

/// Reads `<root>/<pid>/status` and `<root>/<pid>/stat`.
#[derive(Debug, Clone)]
pub struct StructuredSource {
    root: PathBuf,
}

impl StructuredSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Saves `rss` and `vsz` in bytes. Absent labels leave their gauge untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::FileOpen`] if the status file cannot be opened and
    /// [`CollectError::Parse`] if a memory value is malformed.
    pub fn collect_memory(&self, pid: u32, store: &mut MetricStore) -> Result<()> {
        let path = self.process_file(pid, "status");
        let mut reader = fsutil::open_file_reader(&path)?;
        let parse_error = |source| CollectError::Parse {
            path: path.clone(),
            source,
        };

        let status = MemoryStatus::from_reader(&mut reader).map_err(parse_error)?;
        for (field, bytes) in status.bytes().map_err(parse_error)? {
            store.save(MEMORY, field.metric(), bytes)?;
        }
        Ok(())
    }

    /// Saves the raw tick counters of the process and its terminated children.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::FileOpen`] if the stat file cannot be opened and
    /// [`CollectError::Parse`] if one of the tick fields is missing or malformed.
    pub fn collect_cpu(&self, pid: u32, store: &mut MetricStore) -> Result<()> {
        let path = self.process_file(pid, "stat");
        let mut reader = fsutil::open_file_reader(&path)?;
        let ticks = CpuTicks::from_reader(&mut reader)
            .map_err(|source| CollectError::Parse { path, source })?;

        store.save(CPU, USER, ticks.user)?;
        store.save(CPU, SYSTEM, ticks.system)?;
        store.save(CPU, TOTAL_USER, ticks.children_user)?;
        store.save(CPU, TOTAL_SYSTEM, ticks.children_system)?;
        Ok(())
    }

    fn process_file(&self, pid: u32, name: &str) -> PathBuf {
        self.root.join(pid.to_string()).join(name)
    }
}

impl Source for StructuredSource {
    fn collect(&self, pid: u32, store: &mut MetricStore) -> Result<()> {
        self.collect_memory(pid, store)?;
        self.collect_cpu(pid, store)
    }
}

/// Reads a process through an external [`StatusCommand`].
///
/// Children's CPU time is not observable this way, so `total_user` and `total_system` are
/// never saved.
#[derive(Debug, Clone, Default)]
pub struct CommandFallbackSource<C> {
    command: C,
}

impl<C: StatusCommand> CommandFallbackSource<C> {
    pub fn new(command: C) -> Self {
        Self { command }
    }
}

impl<C: StatusCommand> Source for CommandFallbackSource<C> {
    fn collect(&self, pid: u32, store: &mut MetricStore) -> Result<()> {
        let command_error = |source| CollectError::Command { pid, source };
        let output = self.command.query(pid).map_err(command_error)?;
        let report = StatusReport::parse(&output).map_err(command_error)?;

        store.save(MEMORY, RSS, report.rss_bytes)?;
        store.save(MEMORY, VSZ, report.vsz_bytes)?;

        // Unparsable times only skip the counters derived from them.
        if let Err(err) = &report.total_time {
            log::warn!("Unable to parse CPU time for pid {pid}: {err}");
        }
        match &report.user_time {
            Ok(user) => store.save(CPU, USER, user.ticks())?,
            Err(err) => log::warn!("Unable to parse user time for pid {pid}: {err}"),
        }
        if let Some(system) = report.system_ticks() {
            store.save(CPU, SYSTEM, system)?;
        }
        Ok(())
    }
}
