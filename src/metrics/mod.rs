//! A small typed metric store distinguishing gauges from counters.
//!
//! Metrics are grouped into families (e.g. `memory`, `cpu`) and addressed by
//! `(family, metric)`. Every metric is declared once with its [`MetricKind`] and transforms;
//! afterwards raw readings are [`saved`](MetricStore::save) and consumers
//! [`get`](MetricStore::get) the transformed value.
//!
//! # Main types
//!
//! - [`MetricStore`]: the registry, owning [`Family`] and [`Metric`] entries.
//! - [`Aggregator`] / [`Display`]: named transforms applied on read.
//! - [`RateWindow`]: the denominator used when a counter delta becomes a rate.
//! - [`Snapshot`]: serialisable view of all metrics.

mod error;
mod snapshot;
mod store;
mod transform;

pub use error::{Result, StoreError};
pub use snapshot::{Reading, Snapshot};
pub use store::{Family, Metric, MetricKind, MetricStore, RateWindow};
pub use transform::{
    Aggregator, DISPLAY_IN_MB, DISPLAY_PERCENT, DISPLAY_RAW, Display, TICK_PERCENTAGE,
};
