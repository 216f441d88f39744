use std::collections::BTreeMap;

use sensorgraph_parser::{ChannelKey, SensorGroup, SensorReading};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelAverage {
    pub mean: f64,
    pub count: u64,
}

/// Per-group, per-channel means over a whole dataset. Channels that were never observed
/// have no entry at all; there is no zero default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    groups: BTreeMap<SensorGroup, BTreeMap<ChannelKey, ChannelAverage>>,
}

impl AggregateTable {
    pub fn get(&self, key: ChannelKey) -> Option<&ChannelAverage> {
        self.groups.get(&key.group())?.get(&key)
    }

    pub fn mean(&self, key: ChannelKey) -> Option<f64> {
        self.get(key).map(|average| average.mean)
    }

    pub fn group(&self, group: SensorGroup) -> Option<&BTreeMap<ChannelKey, ChannelAverage>> {
        self.groups.get(&group)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&SensorGroup, &BTreeMap<ChannelKey, ChannelAverage>)> {
        self.groups.iter()
    }

    /// Number of channels with an average.
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    sum: i128,
    count: u64,
}

/// Arithmetic mean of every channel present in `readings`, keyed by sensor group.
///
/// Sums are exact integers, so the result does not depend on input order.
pub fn compute_averages(readings: &[SensorReading]) -> AggregateTable {
    let mut accumulators: BTreeMap<(SensorGroup, ChannelKey), Accumulator> = BTreeMap::new();

    for reading in readings {
        for (&key, &value) in &reading.channels {
            let entry = accumulators.entry((key.group(), key)).or_default();
            entry.sum += i128::from(value);
            entry.count += 1;
        }
    }

    let mut groups: BTreeMap<SensorGroup, BTreeMap<ChannelKey, ChannelAverage>> = BTreeMap::new();
    for ((group, key), accumulator) in accumulators {
        let mean = accumulator.sum as f64 / accumulator.count as f64;
        groups.entry(group).or_default().insert(
            key,
            ChannelAverage {
                mean,
                count: accumulator.count,
            },
        );
    }

    AggregateTable { groups }
}
