use std::path::{Path, PathBuf};

use crate::config::SamplerConfig;
use crate::metrics::{MetricStore, RateWindow, StoreError};

use super::capability::{SourceKind, detect_source};
use super::command::{PsCommand, StatusCommand};
use super::source::{CommandFallbackSource, Source, StructuredSource};
use super::{Result, new_process_store};

/// Samples memory and CPU usage of processes into a [`MetricStore`].
///
/// The sampler owns its store; counters keep their baseline across [`collect`] calls, so a
/// sampler should be reused for every pass over the same pid.
///
/// [`collect`]: ProcessSampler::collect
#[derive(Debug)]
pub struct ProcessSampler<C = PsCommand> {
    proc_root: PathBuf,
    structured: StructuredSource,
    fallback: CommandFallbackSource<C>,
    store: MetricStore,
}

impl ProcessSampler<PsCommand> {
    /// Creates a sampler that falls back to `ps` when `proc_root` is missing.
    pub fn new(proc_root: impl Into<PathBuf>, store: MetricStore) -> Self {
        Self::with_command(proc_root, store, PsCommand::default())
    }

    /// Creates a sampler and its process store from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the process metrics cannot be declared.
    pub fn from_config(config: &SamplerConfig) -> std::result::Result<Self, StoreError> {
        let store = new_process_store(RateWindow::Cycle {
            ticks: config.cycle_ticks(),
            period: config.cycle(),
        })?;
        Ok(Self::with_command(
            &config.proc_root,
            store,
            PsCommand::new(&config.status_command),
        ))
    }
}

impl<C: StatusCommand> ProcessSampler<C> {
    pub fn with_command(proc_root: impl Into<PathBuf>, store: MetricStore, command: C) -> Self {
        let proc_root = proc_root.into();
        Self {
            structured: StructuredSource::new(proc_root.clone()),
            fallback: CommandFallbackSource::new(command),
            proc_root,
            store,
        }
    }

    /// Takes one sample of `pid`.
    ///
    /// Reads memory then CPU from the process-information root if it exists, otherwise
    /// queries the status command. Runs on the calling thread and may block on file or
    /// process I/O; there is no timeout and no retry.
    ///
    /// # Errors
    ///
    /// Returns the first hard failure uninterpreted. Metrics not reached keep their
    /// previous values.
    pub fn collect(&mut self, pid: u32) -> Result<()> {
        let kind = detect_source(&self.proc_root)?;
        log::debug!("Sampling pid {pid} from {kind:?}");

        let source: &dyn Source = match kind {
            SourceKind::Structured => &self.structured,
            SourceKind::CommandFallback => &self.fallback,
        };
        source.collect(pid, &mut self.store)
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MetricStore {
        &mut self.store
    }

    pub fn into_store(self) -> MetricStore {
        self.store
    }
}
