use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Particle-size bins reported by each optical sensor, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParticleSize {
    Pm0p3,
    Pm0p5,
    Pm1p0,
    Pm2p5,
    Pm5p0,
    Pm10p0,
}

impl ParticleSize {
    pub const ALL: [ParticleSize; 6] = [
        ParticleSize::Pm0p3,
        ParticleSize::Pm0p5,
        ParticleSize::Pm1p0,
        ParticleSize::Pm2p5,
        ParticleSize::Pm5p0,
        ParticleSize::Pm10p0,
    ];

    /// Field prefix used by the upstream JSON records, e.g. `pm0p3`.
    pub fn field_prefix(&self) -> &'static str {
        match self {
            ParticleSize::Pm0p3 => "pm0p3",
            ParticleSize::Pm0p5 => "pm0p5",
            ParticleSize::Pm1p0 => "pm1p0",
            ParticleSize::Pm2p5 => "pm2p5",
            ParticleSize::Pm5p0 => "pm5p0",
            ParticleSize::Pm10p0 => "pm10p0",
        }
    }

    pub fn micrometres(&self) -> &'static str {
        match self {
            ParticleSize::Pm0p3 => "0.3",
            ParticleSize::Pm0p5 => "0.5",
            ParticleSize::Pm1p0 => "1.0",
            ParticleSize::Pm2p5 => "2.5",
            ParticleSize::Pm5p0 => "5.0",
            ParticleSize::Pm10p0 => "10.0",
        }
    }
}

impl fmt::Display for ParticleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_prefix())
    }
}

impl TryFrom<&str> for ParticleSize {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ParticleSize::ALL
            .into_iter()
            .find(|size| size.field_prefix() == value)
            .ok_or_else(|| format!("unknown particle size '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SensorIndex {
    One,
    Two,
}

impl SensorIndex {
    pub const ALL: [SensorIndex; 2] = [SensorIndex::One, SensorIndex::Two];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorIndex::One => "1",
            SensorIndex::Two => "2",
        }
    }
}

impl fmt::Display for SensorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SensorIndex {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "1" => Ok(SensorIndex::One),
            "2" => Ok(SensorIndex::Two),
            other => Err(format!("unknown sensor index '{other}'")),
        }
    }
}

/// One measured quantity: a particle bin on a given sensor, or the differential pressure.
/// Serializes as its upstream field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ChannelKey {
    Particle {
        size: ParticleSize,
        sensor: SensorIndex,
    },
    Pressure,
}

pub const PRESSURE_FIELD: &str = "rawPressure";

impl ChannelKey {
    /// Every channel in export column order: sensor 1 bins, sensor 2 bins, then pressure.
    pub const ALL: [ChannelKey; 13] = [
        ChannelKey::particle(ParticleSize::Pm0p3, SensorIndex::One),
        ChannelKey::particle(ParticleSize::Pm0p5, SensorIndex::One),
        ChannelKey::particle(ParticleSize::Pm1p0, SensorIndex::One),
        ChannelKey::particle(ParticleSize::Pm2p5, SensorIndex::One),
        ChannelKey::particle(ParticleSize::Pm5p0, SensorIndex::One),
        ChannelKey::particle(ParticleSize::Pm10p0, SensorIndex::One),
        ChannelKey::particle(ParticleSize::Pm0p3, SensorIndex::Two),
        ChannelKey::particle(ParticleSize::Pm0p5, SensorIndex::Two),
        ChannelKey::particle(ParticleSize::Pm1p0, SensorIndex::Two),
        ChannelKey::particle(ParticleSize::Pm2p5, SensorIndex::Two),
        ChannelKey::particle(ParticleSize::Pm5p0, SensorIndex::Two),
        ChannelKey::particle(ParticleSize::Pm10p0, SensorIndex::Two),
        ChannelKey::Pressure,
    ];

    pub const fn particle(size: ParticleSize, sensor: SensorIndex) -> Self {
        ChannelKey::Particle { size, sensor }
    }

    /// JSON field name of the channel (`pm0p3_1`, ..., `rawPressure`).
    pub fn field_name(&self) -> String {
        match self {
            ChannelKey::Particle { size, sensor } => format!("{}_{}", size.field_prefix(), sensor),
            ChannelKey::Pressure => PRESSURE_FIELD.to_string(),
        }
    }

    pub fn group(&self) -> SensorGroup {
        match self {
            ChannelKey::Particle { sensor, .. } => SensorGroup::Sensor(*sensor),
            ChannelKey::Pressure => SensorGroup::Pressure,
        }
    }

    /// Position of the channel inside [`ChannelKey::ALL`].
    pub fn column_index(&self) -> usize {
        match self {
            ChannelKey::Particle { size, sensor } => {
                let offset = match sensor {
                    SensorIndex::One => 0,
                    SensorIndex::Two => ParticleSize::ALL.len(),
                };
                offset + *size as usize
            }
            ChannelKey::Pressure => ChannelKey::ALL.len() - 1,
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field_name())
    }
}

impl TryFrom<&str> for ChannelKey {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == PRESSURE_FIELD {
            return Ok(ChannelKey::Pressure);
        }
        let (prefix, sensor) = value
            .split_once('_')
            .ok_or_else(|| format!("channel '{value}' has no sensor suffix"))?;
        Ok(ChannelKey::Particle {
            size: ParticleSize::try_from(prefix)?,
            sensor: SensorIndex::try_from(sensor)?,
        })
    }
}

impl From<ChannelKey> for String {
    fn from(key: ChannelKey) -> Self {
        key.field_name()
    }
}

impl TryFrom<String> for ChannelKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChannelKey::try_from(value.as_str())
    }
}

/// Aggregation bucket a channel belongs to: sensor 1, sensor 2 or pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SensorGroup {
    Sensor(SensorIndex),
    Pressure,
}

impl SensorGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorGroup::Sensor(index) => index.as_str(),
            SensorGroup::Pressure => "pressure",
        }
    }
}

impl fmt::Display for SensorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized record. Channels that were missing or non-numeric upstream are simply
/// absent from `channels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub channels: BTreeMap<ChannelKey, i64>,
}

impl SensorReading {
    pub fn new(created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: None,
            created_at,
            channels: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, key: ChannelKey, value: i64) -> Self {
        self.channels.insert(key, value);
        self
    }

    pub fn value(&self, key: ChannelKey) -> Option<i64> {
        self.channels.get(&key).copied()
    }

    pub fn has_timestamp(&self) -> bool {
        self.created_at.is_some()
    }
}
