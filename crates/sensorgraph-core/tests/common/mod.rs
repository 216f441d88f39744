#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sensorgraph_parser::{
    normalize_batch, ChannelKey, ParticleSize, SensorIndex, SensorReading, TimestampPolicy,
};
use serde_json::Value;

pub fn fixture(name: &str) -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    let text = std::fs::read_to_string(path).expect("read fixture");
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

pub fn fixture_readings(name: &str) -> Vec<SensorReading> {
    normalize_batch(&fixture(name), TimestampPolicy::KeepForAggregation)
        .expect("fixture is an array")
        .readings
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 9, 45, 0).unwrap()
}

pub fn pm0p3(sensor: SensorIndex) -> ChannelKey {
    ChannelKey::particle(ParticleSize::Pm0p3, sensor)
}

/// `count` readings, newest first, five minutes apart, every channel set to `value + i`.
pub fn full_readings(count: usize, value: i64) -> Vec<SensorReading> {
    (0..count)
        .map(|i| {
            let created_at = base_time() - Duration::minutes(5 * i as i64);
            ChannelKey::ALL
                .into_iter()
                .fold(SensorReading::new(Some(created_at)), |reading, key| {
                    reading.with_channel(key, value + i as i64)
                })
        })
        .collect()
}
