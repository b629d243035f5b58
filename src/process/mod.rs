//! Process resource sampling.
//!
//! A [`ProcessSampler`] measures memory and CPU consumption of a single pid and saves the
//! readings into a [`MetricStore`]. Two sources are supported:
//!
//! - [`StructuredSource`]: `<root>/<pid>/status` for memory and `<root>/<pid>/stat` for CPU
//!   ticks, used whenever the process-information root exists.
//! - [`CommandFallbackSource`]: `ps` output with memory in kibibytes and CPU times as
//!   `MM:SS.CC`, used otherwise.
//!
//! # Metrics
//!
//! | family   | metric         | kind    | unit                          |
//! |----------|----------------|---------|-------------------------------|
//! | `memory` | `rss`          | gauge   | bytes                         |
//! | `memory` | `vsz`          | gauge   | bytes                         |
//! | `cpu`    | `user`         | counter | % of the sampling window      |
//! | `cpu`    | `system`       | counter | % of the sampling window      |
//! | `cpu`    | `total_user`   | counter | % of the window, children     |
//! | `cpu`    | `total_system` | counter | % of the window, children     |
//!
//! # Example
//!
//! ```no_run
//! use proc_sampler::metrics::RateWindow;
//! use proc_sampler::process::{self, ProcessSampler};
//!
//! let store = process::new_process_store(RateWindow::Fixed(1500))?;
//! let mut sampler = ProcessSampler::new("/proc", store);
//! sampler.collect(std::process::id())?;
//! println!("rss: {}", sampler.store().display(process::MEMORY, process::RSS)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod capability;
mod command;
mod duration;
mod error;
mod parser;
mod sampler;
mod source;
mod stat;
mod status;

pub use capability::{SourceKind, detect_source};
pub use command::{PsCommand, StatusCommand, StatusReport};
pub use duration::CpuDuration;
pub use error::{CollectError, CommandError, DurationParseError, Result, StatParseError};
pub use parser::LabeledStat;
pub use sampler::ProcessSampler;
pub use source::{CommandFallbackSource, Source, StructuredSource};
pub use stat::CpuTicks;
pub use status::{MemoryField, MemoryStatus};

use crate::metrics::{
    DISPLAY_IN_MB, DISPLAY_PERCENT, MetricStore, RateWindow, StoreError, TICK_PERCENTAGE,
};

pub const MEMORY: &str = "memory";
pub const CPU: &str = "cpu";

pub const RSS: &str = "rss";
pub const VSZ: &str = "vsz";
pub const USER: &str = "user";
pub const SYSTEM: &str = "system";
pub const TOTAL_USER: &str = "total_user";
pub const TOTAL_SYSTEM: &str = "total_system";

/// Ticks per second on both sources: `USER_HZ` for stat files, centiseconds for `ps`.
pub const TICKS_PER_SEC: u64 = 100;

/// Declares every process metric on `store`. Safe to call on an already declared store.
///
/// # Errors
///
/// Returns [`StoreError::ConflictingDeclaration`] if `store` already holds one of the keys
/// with different parameters.
pub fn declare_process_metrics(store: &mut MetricStore) -> std::result::Result<(), StoreError> {
    store.declare_gauge(MEMORY, RSS, None, DISPLAY_IN_MB)?;
    store.declare_gauge(MEMORY, VSZ, None, DISPLAY_IN_MB)?;
    for metric in [USER, SYSTEM, TOTAL_USER, TOTAL_SYSTEM] {
        store.declare_counter(CPU, metric, TICK_PERCENTAGE, DISPLAY_PERCENT)?;
    }
    Ok(())
}

/// Creates a store with every process metric declared.
///
/// # Errors
///
/// Never fails for a fresh store; the error is propagated from
/// [`declare_process_metrics`].
pub fn new_process_store(window: RateWindow) -> std::result::Result<MetricStore, StoreError> {
    let mut store = MetricStore::with_window(window);
    declare_process_metrics(&mut store)?;
    Ok(store)
}
