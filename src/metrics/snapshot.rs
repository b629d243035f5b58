use std::collections::BTreeMap;

use super::{MetricKind, MetricStore};

/// A single metric as seen by consumers of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Reading {
    pub kind: MetricKind,
    pub value: i64,
    pub display: String,
}

/// Point-in-time, deterministically ordered view of every declared metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    families: BTreeMap<String, BTreeMap<String, Reading>>,
}

impl Snapshot {
    pub fn reading(&self, family: &str, metric: &str) -> Option<&Reading> {
        self.families.get(family)?.get(metric)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl MetricStore {
    /// Projects every declared metric through its transforms.
    pub fn snapshot(&self) -> Snapshot {
        let families = self
            .families()
            .map(|(name, family)| {
                let readings = family
                    .metrics()
                    .map(|(metric, m)| {
                        let value = m.project(self.window_for(family, m));
                        let reading = Reading {
                            kind: m.kind(),
                            value,
                            display: m.display().render(value),
                        };
                        (metric.to_owned(), reading)
                    })
                    .collect();
                (name.to_owned(), readings)
            })
            .collect();

        Snapshot { families }
    }
}
