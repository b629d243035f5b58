//! Named value transforms applied when a metric is read.
//!
//! An [`Aggregator`] turns a `(delta, window)` pair into a displayable magnitude and a
//! [`Display`] renders the aggregated value for humans. Both are plain function pointers
//! tagged with a name, which makes them cheap to copy and lets the store compare
//! declarations by name.

use std::fmt;

/// Converts a raw reading into an aggregated value.
///
/// For counters the first argument is the delta between the two most recent samples,
/// for gauges it is the raw value itself. The second argument is the rate window of the
/// store (see [`RateWindow`](super::RateWindow)).
#[derive(Clone, Copy)]
pub struct Aggregator {
    name: &'static str,
    func: fn(i64, i64) -> i64,
}

impl Aggregator {
    pub const fn new(name: &'static str, func: fn(i64, i64) -> i64) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, value: i64, window: i64) -> i64 {
        (self.func)(value, window)
    }
}

impl PartialEq for Aggregator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Aggregator {}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Aggregator").field(&self.name).finish()
    }
}

/// Renders an aggregated value in reporting units.
#[derive(Clone, Copy)]
pub struct Display {
    name: &'static str,
    func: fn(i64) -> String,
}

impl Display {
    pub const fn new(name: &'static str, func: fn(i64) -> String) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn render(&self, value: i64) -> String {
        (self.func)(value)
    }
}

impl PartialEq for Display {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Display {}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Display").field(&self.name).finish()
    }
}

/// Share of the window consumed by `delta`, as a rounded integer percentage in `0..=100`.
pub const TICK_PERCENTAGE: Aggregator = Aggregator::new("tick_percentage", tick_percentage);

/// Raw value, no unit suffix.
pub const DISPLAY_RAW: Display = Display::new("raw", display_raw);

/// Bytes rendered as megabytes with two decimals, e.g. `1.50m`.
pub const DISPLAY_IN_MB: Display = Display::new("megabytes", display_in_mb);

/// Integer percentage, e.g. `33%`.
pub const DISPLAY_PERCENT: Display = Display::new("percent", display_percent);

fn tick_percentage(delta: i64, window: i64) -> i64 {
    if delta <= 0 || window <= 0 {
        return 0;
    }
    let percent = (100.0 * delta as f64 / window as f64).round() as i64;
    percent.min(100)
}

fn display_raw(value: i64) -> String {
    value.to_string()
}

fn display_in_mb(value: i64) -> String {
    format!("{:.2}m", value as f64 / (1024.0 * 1024.0))
}

fn display_percent(value: i64) -> String {
    format!("{value}%")
}
