use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sensorgraph_parser::{ChannelKey, ParticleSize, SensorIndex, SensorReading};
use serde::Serialize;

use crate::aggregation::AggregateTable;

pub const SERIES_COUNT: usize = ParticleSize::ALL.len() + 1;
pub const PARTICLE_UNIT: &str = "pcs/l";
pub const PRESSURE_UNIT: &str = "Pa.";
pub const PRESSURE_TITLE: &str = "Differential Pressure";
pub const PRESSURE_LEGEND: &str = "DP Sensor";

const TIME_LABEL_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesMetric {
    Particle(ParticleSize),
    Pressure,
}

impl SeriesMetric {
    /// Series order on the dashboard: particle sizes ascending, then pressure.
    pub fn all() -> [SeriesMetric; SERIES_COUNT] {
        let mut metrics = [SeriesMetric::Pressure; SERIES_COUNT];
        for (slot, size) in metrics.iter_mut().zip(ParticleSize::ALL) {
            *slot = SeriesMetric::Particle(size);
        }
        metrics
    }

    pub fn title(&self) -> String {
        match self {
            SeriesMetric::Particle(size) => format!("> {} µm Particles", size.micrometres()),
            SeriesMetric::Pressure => PRESSURE_TITLE.to_string(),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SeriesMetric::Particle(_) => PARTICLE_UNIT,
            SeriesMetric::Pressure => PRESSURE_UNIT,
        }
    }

    fn primary_channel(&self) -> ChannelKey {
        match self {
            SeriesMetric::Particle(size) => ChannelKey::particle(*size, SensorIndex::One),
            SeriesMetric::Pressure => ChannelKey::Pressure,
        }
    }

    fn secondary_channel(&self) -> Option<ChannelKey> {
        match self {
            SeriesMetric::Particle(size) => Some(ChannelKey::particle(*size, SensorIndex::Two)),
            SeriesMetric::Pressure => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLine {
    pub legend: String,
    pub channel: ChannelKey,
    /// One slot per label; `None` where the reading lacked this channel.
    pub points: Vec<Option<i64>>,
    /// Full-dataset mean, `None` when the channel was never observed.
    pub average: Option<f64>,
}

impl SeriesLine {
    /// Integer average for display, with "no average" shown as zero.
    pub fn display_average(&self) -> i64 {
        self.average.map(|mean| mean.trunc() as i64).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: SeriesMetric,
    pub title: String,
    pub unit: String,
    pub labels: Vec<String>,
    pub primary: SeriesLine,
    /// Sensor 2 line; always `None` for the pressure series.
    pub secondary: Option<SeriesLine>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &SeriesLine> {
        std::iter::once(&self.primary).chain(self.secondary.as_ref())
    }
}

pub fn format_time_label(timestamp: DateTime<Utc>, timezone: Tz) -> String {
    timestamp
        .with_timezone(&timezone)
        .format(TIME_LABEL_FORMAT)
        .to_string()
}

/// Builds the seven dashboard series from the first `window_size` readings in input
/// order, skipping untimed ones inside that prefix. Averages come from `averages`, never from the window.
pub fn build_series(
    readings: &[SensorReading],
    averages: &AggregateTable,
    window_size: usize,
    timezone: Tz,
) -> Vec<ChartSeries> {
    let window: Vec<(&SensorReading, DateTime<Utc>)> = readings
        .iter()
        .take(window_size)
        .filter_map(|reading| reading.created_at.map(|ts| (reading, ts)))
        .collect();

    let labels: Vec<String> = window
        .iter()
        .map(|(_, ts)| format_time_label(*ts, timezone))
        .collect();

    SeriesMetric::all()
        .into_iter()
        .map(|metric| {
            let line = |channel: ChannelKey, legend: &str| SeriesLine {
                legend: legend.to_string(),
                channel,
                points: window.iter().map(|(reading, _)| reading.value(channel)).collect(),
                average: averages.mean(channel),
            };

            let (primary, secondary) = match metric.secondary_channel() {
                Some(second) => (
                    line(metric.primary_channel(), "Sensor 1"),
                    Some(line(second, "Sensor 2")),
                ),
                None => (line(metric.primary_channel(), PRESSURE_LEGEND), None),
            };

            ChartSeries {
                metric,
                title: metric.title(),
                unit: metric.unit().to_string(),
                labels: labels.clone(),
                primary,
                secondary,
            }
        })
        .collect()
}
