use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::transform::{Aggregator, Display};
use super::{Result, StoreError};

/// How a metric's raw readings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Absolute instantaneous value, every save replaces the previous one.
    Gauge,
    /// Accumulating value, only the delta between consecutive saves is meaningful.
    Counter,
}

/// The denominator handed to aggregators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateWindow {
    /// Sum of the current deltas of every counter in the same family.
    SiblingTotal,
    /// A fixed number of ticks, regardless of when the samples were taken.
    Fixed(i64),
    /// `ticks` per sampling cycle of length `period`, multiplied by the number of cycles
    /// between the two samples of a counter. A missed pass widens the window instead of
    /// inflating the rate.
    Cycle { ticks: i64, period: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: i64,
    at: Instant,
}

/// A single declared metric and its sampling state.
#[derive(Debug)]
pub struct Metric {
    kind: MetricKind,
    aggregator: Option<Aggregator>,
    display: Display,
    latest: Option<Sample>,
    /// Only populated for counters.
    previous: Option<Sample>,
    filled: Option<i64>,
}

impl Metric {
    fn new(kind: MetricKind, aggregator: Option<Aggregator>, display: Display) -> Self {
        Self {
            kind,
            aggregator,
            display,
            latest: None,
            previous: None,
            filled: None,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn aggregator(&self) -> Option<Aggregator> {
        self.aggregator
    }

    pub fn display(&self) -> Display {
        self.display
    }

    /// Latest raw value as saved, before any transform.
    pub fn raw_value(&self) -> i64 {
        self.latest.map_or(0, |s| s.value)
    }

    fn same_declaration(
        &self,
        kind: MetricKind,
        aggregator: Option<Aggregator>,
        display: Display,
    ) -> bool {
        self.kind == kind && self.aggregator == aggregator && self.display == display
    }

    fn save(&mut self, value: i64, at: Instant) {
        let sample = Sample { value, at };
        match self.kind {
            MetricKind::Gauge => self.latest = Some(sample),
            MetricKind::Counter => {
                // A preloaded value is not a baseline.
                self.previous = if self.filled.is_some() {
                    None
                } else {
                    self.latest
                };
                self.latest = Some(sample);
            }
        }
        self.filled = None;
    }

    /// Difference between the two most recent counter samples, `None` without a baseline.
    fn delta(&self) -> Option<i64> {
        match (self.previous, self.latest) {
            (Some(prev), Some(cur)) => Some(cur.value.saturating_sub(prev.value)),
            _ => None,
        }
    }

    /// Whole sampling cycles between the two most recent samples, at least one.
    fn elapsed_cycles(&self, period: Duration) -> i64 {
        let (Some(prev), Some(cur)) = (self.previous, self.latest) else {
            return 1;
        };
        if period.is_zero() {
            return 1;
        }
        let elapsed = cur.at.saturating_duration_since(prev.at);
        let cycles = (elapsed.as_secs_f64() / period.as_secs_f64()).round();
        (cycles as i64).max(1)
    }

    pub(super) fn project(&self, window: i64) -> i64 {
        if let Some(value) = self.filled {
            return value;
        }
        match self.kind {
            MetricKind::Gauge => {
                let raw = self.raw_value();
                self.aggregator.map_or(raw, |agg| agg.apply(raw, window))
            }
            MetricKind::Counter => match (self.delta(), self.aggregator) {
                (Some(delta), Some(agg)) => agg.apply(delta, window),
                (Some(delta), None) => delta,
                (None, _) => 0,
            },
        }
    }
}

/// A named group of metrics sharing one sampling window, e.g. `cpu`.
#[derive(Debug, Default)]
pub struct Family {
    metrics: HashMap<String, Metric>,
}

impl Family {
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub(super) fn metrics(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Ticks consumed across all counters of this family in the latest interval.
    fn total_delta(&self) -> i64 {
        self.metrics
            .values()
            .filter(|m| m.kind == MetricKind::Counter && m.filled.is_none())
            .filter_map(Metric::delta)
            .filter(|d| *d > 0)
            .fold(0, i64::saturating_add)
    }
}

/// Typed registry mapping `(family, metric)` to the latest reading.
///
/// Metrics must be declared before they are saved or read. The store has no internal
/// locking; callers sharing one store across tasks serialise access themselves.
///
/// # Examples
///
/// ```
/// use proc_sampler::metrics::{MetricStore, DISPLAY_PERCENT, TICK_PERCENTAGE};
///
/// let mut store = MetricStore::new();
/// store.declare_counter("cpu", "user", TICK_PERCENTAGE, DISPLAY_PERCENT).unwrap();
/// store.declare_counter("cpu", "system", TICK_PERCENTAGE, DISPLAY_PERCENT).unwrap();
///
/// store.save("cpu", "user", 100).unwrap();
/// store.save("cpu", "system", 100).unwrap();
/// store.save("cpu", "user", 400).unwrap();
/// store.save("cpu", "system", 200).unwrap();
///
/// assert_eq!(store.get("cpu", "user").unwrap(), 75);
/// assert_eq!(store.display("cpu", "system").unwrap(), "25%");
/// ```
#[derive(Debug)]
pub struct MetricStore {
    families: HashMap<String, Family>,
    window: RateWindow,
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricStore {
    /// Creates an empty store computing rates against [`RateWindow::SiblingTotal`].
    pub fn new() -> Self {
        Self::with_window(RateWindow::SiblingTotal)
    }

    pub fn with_window(window: RateWindow) -> Self {
        Self {
            families: HashMap::new(),
            window,
        }
    }

    pub fn window(&self) -> RateWindow {
        self.window
    }

    /// Declares an absolute-value metric.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConflictingDeclaration`] if the key exists with a different
    /// kind or transforms. Re-declaring with identical parameters is a no-op.
    pub fn declare_gauge(
        &mut self,
        family: &str,
        metric: &str,
        aggregator: Option<Aggregator>,
        display: Display,
    ) -> Result<()> {
        self.declare(family, metric, MetricKind::Gauge, aggregator, display)
    }

    /// Declares a rate-based metric. Counters always need an aggregator.
    ///
    /// # Errors
    ///
    /// Same as [`MetricStore::declare_gauge`].
    pub fn declare_counter(
        &mut self,
        family: &str,
        metric: &str,
        aggregator: Aggregator,
        display: Display,
    ) -> Result<()> {
        self.declare(family, metric, MetricKind::Counter, Some(aggregator), display)
    }

    fn declare(
        &mut self,
        family: &str,
        metric: &str,
        kind: MetricKind,
        aggregator: Option<Aggregator>,
        display: Display,
    ) -> Result<()> {
        let entry = self.families.entry(family.to_owned()).or_default();
        match entry.metrics.get(metric) {
            Some(existing) if existing.same_declaration(kind, aggregator, display) => Ok(()),
            Some(_) => Err(StoreError::ConflictingDeclaration {
                family: family.to_owned(),
                metric: metric.to_owned(),
            }),
            None => {
                entry
                    .metrics
                    .insert(metric.to_owned(), Metric::new(kind, aggregator, display));
                Ok(())
            }
        }
    }

    /// Records a raw reading.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Undeclared`] if the metric was never declared.
    pub fn save(&mut self, family: &str, metric: &str, raw_value: i64) -> Result<()> {
        self.save_at(family, metric, raw_value, Instant::now())
    }

    /// Like [`MetricStore::save`], with an explicit sample time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Undeclared`] if the metric was never declared.
    pub fn save_at(
        &mut self,
        family: &str,
        metric: &str,
        raw_value: i64,
        at: Instant,
    ) -> Result<()> {
        self.metric_mut(family, metric)?.save(raw_value, at);
        Ok(())
    }

    /// Returns the aggregated value of a metric: bytes for memory gauges, an integer
    /// percentage for tick counters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Undeclared`] if the metric was never declared.
    pub fn get(&self, family: &str, metric: &str) -> Result<i64> {
        let (fam, m) = self.lookup(family, metric)?;
        Ok(m.project(self.window_for(fam, m)))
    }

    /// Returns [`MetricStore::get`] rendered through the metric's display transform.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Undeclared`] if the metric was never declared.
    pub fn display(&self, family: &str, metric: &str) -> Result<String> {
        let (fam, m) = self.lookup(family, metric)?;
        Ok(m.display.render(m.project(self.window_for(fam, m))))
    }

    /// Preloads display-ready values, bypassing delta tracking. Meant for fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Undeclared`] on the first unknown key; earlier entries stay
    /// applied.
    pub fn fill(&mut self, values: &[(&str, &str, i64)]) -> Result<()> {
        for (family, metric, value) in values {
            self.metric_mut(family, metric)?.filled = Some(*value);
        }
        Ok(())
    }

    /// When the counter was last saved. Always `None` for gauges.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Undeclared`] if the metric was never declared.
    pub fn last_sampled(&self, family: &str, metric: &str) -> Result<Option<Instant>> {
        let (_, m) = self.lookup(family, metric)?;
        Ok(match m.kind {
            MetricKind::Counter => m.latest.map(|s| s.at),
            MetricKind::Gauge => None,
        })
    }

    pub fn family(&self, name: &str) -> Option<&Family> {
        self.families.get(name)
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &Family)> {
        self.families.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(super) fn window_for(&self, family: &Family, metric: &Metric) -> i64 {
        match self.window {
            RateWindow::Fixed(ticks) => ticks,
            RateWindow::Cycle { ticks, period } => {
                ticks.saturating_mul(metric.elapsed_cycles(period))
            }
            RateWindow::SiblingTotal => family.total_delta(),
        }
    }

    fn lookup(&self, family: &str, metric: &str) -> Result<(&Family, &Metric)> {
        self.families
            .get(family)
            .and_then(|fam| fam.metrics.get(metric).map(|m| (fam, m)))
            .ok_or_else(|| undeclared(family, metric))
    }

    fn metric_mut(&mut self, family: &str, metric: &str) -> Result<&mut Metric> {
        self.families
            .get_mut(family)
            .and_then(|fam| fam.metrics.get_mut(metric))
            .ok_or_else(|| undeclared(family, metric))
    }
}

fn undeclared(family: &str, metric: &str) -> StoreError {
    StoreError::Undeclared {
        family: family.to_owned(),
        metric: metric.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DISPLAY_IN_MB, DISPLAY_PERCENT, TICK_PERCENTAGE};

    fn cpu_store(window: RateWindow) -> MetricStore {
        let mut store = MetricStore::with_window(window);
        store
            .declare_counter("cpu", "user", TICK_PERCENTAGE, DISPLAY_PERCENT)
            .unwrap();
        store
            .declare_counter("cpu", "system", TICK_PERCENTAGE, DISPLAY_PERCENT)
            .unwrap();
        store
    }

    #[test]
    fn test_gauge_reads_zero_before_save() {
        let mut store = MetricStore::new();
        store
            .declare_gauge("memory", "rss", None, DISPLAY_IN_MB)
            .unwrap();
        assert_eq!(store.get("memory", "rss").unwrap(), 0);
        assert_eq!(store.display("memory", "rss").unwrap(), "0.00m");
    }

    #[test]
    fn test_gauge_save_replaces_value() {
        let mut store = MetricStore::new();
        store
            .declare_gauge("memory", "rss", None, DISPLAY_IN_MB)
            .unwrap();
        store.save("memory", "rss", 2048).unwrap();
        store.save("memory", "rss", 1024 * 1024).unwrap();
        assert_eq!(store.get("memory", "rss").unwrap(), 1024 * 1024);
        assert_eq!(store.display("memory", "rss").unwrap(), "1.00m");
    }

    #[test]
    fn test_counter_first_save_reads_zero() {
        let mut store = cpu_store(RateWindow::SiblingTotal);
        store.save("cpu", "user", 987_654).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 0);
        assert_eq!(store.get("cpu", "system").unwrap(), 0);
        assert!(store.last_sampled("cpu", "user").unwrap().is_some());
        assert!(store.last_sampled("cpu", "system").unwrap().is_none());
    }

    #[test]
    fn test_counter_share_of_sibling_total() {
        let mut store = cpu_store(RateWindow::SiblingTotal);
        store.save("cpu", "user", 1000).unwrap();
        store.save("cpu", "system", 300).unwrap();
        store.save("cpu", "user", 1500).unwrap();
        store.save("cpu", "system", 1300).unwrap();

        let user = store.get("cpu", "user").unwrap();
        let system = store.get("cpu", "system").unwrap();
        assert_eq!(user, 33);
        assert_eq!(system, 67);
        assert!(user + system <= 101);
    }

    #[test]
    fn test_counter_against_fixed_window() {
        let mut store = cpu_store(RateWindow::Fixed(1500));
        store.save("cpu", "user", 10).unwrap();
        store.save("cpu", "system", 10).unwrap();
        store.save("cpu", "user", 510).unwrap();
        store.save("cpu", "system", 10).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 33);
        assert_eq!(store.get("cpu", "system").unwrap(), 0);
        assert_eq!(store.display("cpu", "user").unwrap(), "33%");
    }

    #[test]
    fn test_cycle_window_spans_missed_passes() {
        let period = Duration::from_secs(15);
        let mut store = cpu_store(RateWindow::Cycle {
            ticks: 1500,
            period,
        });
        let start = Instant::now();
        store.save_at("cpu", "user", 1000, start).unwrap();
        store.save_at("cpu", "system", 500, start).unwrap();

        // Two cycles later, one pass was lost in between.
        let later = start + period * 2;
        store.save_at("cpu", "user", 4000, later).unwrap();
        store.save_at("cpu", "system", 3500, later).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 100);
        assert_eq!(store.get("cpu", "system").unwrap(), 100);

        let next = later + period;
        store.save_at("cpu", "user", 4500, next).unwrap();
        store.save_at("cpu", "system", 3500, next).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 33);
        assert_eq!(store.get("cpu", "system").unwrap(), 0);
    }

    #[test]
    fn test_cycle_window_back_to_back_samples() {
        let mut store = cpu_store(RateWindow::Cycle {
            ticks: 1500,
            period: Duration::from_secs(15),
        });
        let start = Instant::now();
        store.save_at("cpu", "user", 0, start).unwrap();
        store
            .save_at("cpu", "user", 750, start + Duration::from_millis(5))
            .unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 50);
    }

    #[test]
    fn test_fixed_window_caps_at_hundred() {
        let mut store = cpu_store(RateWindow::Fixed(1500));
        store.save("cpu", "user", 0).unwrap();
        store.save("cpu", "user", 4500).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 100);
    }

    #[test]
    fn test_extreme_counter_values_do_not_overflow() {
        let mut store = cpu_store(RateWindow::SiblingTotal);
        store.save("cpu", "user", i64::MIN).unwrap();
        store.save("cpu", "system", 0).unwrap();
        store.save("cpu", "user", i64::MAX).unwrap();
        store.save("cpu", "system", i64::MAX).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 100);
        assert_eq!(store.get("cpu", "system").unwrap(), 100);

        let mut store = cpu_store(RateWindow::Cycle {
            ticks: i64::MAX,
            period: Duration::from_secs(1),
        });
        let start = Instant::now();
        store.save_at("cpu", "user", 0, start).unwrap();
        store
            .save_at("cpu", "user", 10, start + Duration::from_secs(3))
            .unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 0);
    }

    #[test]
    fn test_enumerate_declarations() {
        let store = cpu_store(RateWindow::Fixed(1500));
        assert_eq!(store.window(), RateWindow::Fixed(1500));

        let cpu = store.family("cpu").unwrap();
        let mut names: Vec<&str> = cpu.metric_names().collect();
        names.sort_unstable();
        assert_eq!(names, ["system", "user"]);

        let user = cpu.metric("user").unwrap();
        assert_eq!(user.kind(), MetricKind::Counter);
        assert_eq!(user.aggregator(), Some(TICK_PERCENTAGE));
        assert_eq!(user.display(), DISPLAY_PERCENT);
        assert!(cpu.metric("idle").is_none());
        assert!(store.family("memory").is_none());
        assert_eq!(store.families().count(), 1);
    }

    #[test]
    fn test_counter_reset_reads_zero() {
        let mut store = cpu_store(RateWindow::Fixed(100));
        store.save("cpu", "user", 500).unwrap();
        store.save("cpu", "user", 20).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 0);
    }

    #[test]
    fn test_get_does_not_mutate() {
        let mut store = cpu_store(RateWindow::Fixed(100));
        store.save("cpu", "user", 0).unwrap();
        store.save("cpu", "user", 40).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 40);
        assert_eq!(store.get("cpu", "user").unwrap(), 40);
    }

    #[test]
    fn test_redeclare_identical_keeps_values() {
        let mut store = MetricStore::new();
        store
            .declare_gauge("memory", "vsz", None, DISPLAY_IN_MB)
            .unwrap();
        store.save("memory", "vsz", 4096).unwrap();
        store
            .declare_gauge("memory", "vsz", None, DISPLAY_IN_MB)
            .unwrap();
        assert_eq!(store.get("memory", "vsz").unwrap(), 4096);
    }

    #[test]
    fn test_conflicting_redeclaration_fails() {
        let mut store = MetricStore::new();
        store
            .declare_gauge("memory", "vsz", None, DISPLAY_IN_MB)
            .unwrap();
        let err = store
            .declare_counter("memory", "vsz", TICK_PERCENTAGE, DISPLAY_IN_MB)
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::ConflictingDeclaration {
                family: "memory".into(),
                metric: "vsz".into()
            }
        );
        assert!(
            store
                .declare_gauge("memory", "vsz", None, DISPLAY_PERCENT)
                .is_err()
        );
    }

    #[test]
    fn test_undeclared_metric_fails() {
        let mut store = cpu_store(RateWindow::SiblingTotal);
        assert!(matches!(
            store.get("cpu", "idle"),
            Err(StoreError::Undeclared { .. })
        ));
        assert!(matches!(
            store.get("disk", "user"),
            Err(StoreError::Undeclared { .. })
        ));
        assert!(store.save("memory", "rss", 1).is_err());
        assert!(store.display("memory", "rss").is_err());
    }

    #[test]
    fn test_fill_preloads_values() {
        let mut store = cpu_store(RateWindow::SiblingTotal);
        store
            .declare_gauge("memory", "rss", None, DISPLAY_IN_MB)
            .unwrap();
        store
            .fill(&[("memory", "rss", 1024), ("cpu", "user", 12)])
            .unwrap();
        assert_eq!(store.get("memory", "rss").unwrap(), 1024);
        assert_eq!(store.get("cpu", "user").unwrap(), 12);

        // The next real sample starts a fresh baseline.
        store.save("cpu", "user", 9000).unwrap();
        assert_eq!(store.get("cpu", "user").unwrap(), 0);
    }

    #[test]
    fn test_fill_rejects_unknown_key() {
        let mut store = cpu_store(RateWindow::SiblingTotal);
        let err = store.fill(&[("cpu", "steal", 1)]).unwrap_err();
        assert!(matches!(err, StoreError::Undeclared { .. }));
    }
}
