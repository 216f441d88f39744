use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::errors::NormalizeError;
use crate::model::{ChannelKey, ParticleSize, SensorGroup, SensorIndex, SensorReading};
use crate::{coerce_integer, normalize_batch, normalize_record, parse_timestamp, TimestampPolicy};

fn fixture(path: &str) -> Value {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    let text = fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err));
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

#[test]
fn channel_keys_round_trip_field_names() {
    for key in ChannelKey::ALL {
        let name = key.field_name();
        assert_eq!(ChannelKey::try_from(name.as_str()), Ok(key));
    }
    assert_eq!(ChannelKey::Pressure.field_name(), "rawPressure");
    assert_eq!(
        ChannelKey::particle(ParticleSize::Pm10p0, SensorIndex::Two).field_name(),
        "pm10p0_2"
    );
    assert!(ChannelKey::try_from("pm0p3").is_err());
    assert!(ChannelKey::try_from("pm0p3_3").is_err());
}

#[test]
fn column_index_matches_export_order() {
    for (position, key) in ChannelKey::ALL.iter().enumerate() {
        assert_eq!(key.column_index(), position, "{key}");
    }
}

#[test]
fn groups_follow_sensor_suffix() {
    let key = ChannelKey::particle(ParticleSize::Pm2p5, SensorIndex::Two);
    assert_eq!(key.group(), SensorGroup::Sensor(SensorIndex::Two));
    assert_eq!(key.group().to_string(), "2");
    assert_eq!(ChannelKey::Pressure.group().to_string(), "pressure");
}

#[test]
fn integer_coercion_mirrors_leading_integer_parsing() {
    assert_eq!(coerce_integer(&json!(17)), Some(17));
    assert_eq!(coerce_integer(&json!(17.9)), Some(17));
    assert_eq!(coerce_integer(&json!(-3.9)), Some(-3));
    assert_eq!(coerce_integer(&json!("  42px")), Some(42));
    assert_eq!(coerce_integer(&json!("-8")), Some(-8));
    assert_eq!(coerce_integer(&json!("12.75")), Some(12));
    assert_eq!(coerce_integer(&json!("n/a")), None);
    assert_eq!(coerce_integer(&json!("")), None);
    assert_eq!(coerce_integer(&json!("-")), None);
    assert_eq!(coerce_integer(&Value::Null), None);
    assert_eq!(coerce_integer(&json!(true)), None);
    assert_eq!(coerce_integer(&json!([1])), None);
}

#[test]
fn timestamps_accept_rfc3339_and_epoch_millis() {
    let expected = Utc.with_ymd_and_hms(2024, 10, 1, 9, 45, 0).unwrap();
    assert_eq!(parse_timestamp(&json!("2024-10-01T09:45:00.000Z")), Some(expected));
    assert_eq!(parse_timestamp(&json!("2024-10-01T15:15:00+05:30")), Some(expected));
    assert_eq!(parse_timestamp(&json!(1727775900000i64)), Some(expected));
    assert_eq!(parse_timestamp(&json!("1727775900000")), Some(expected));
    assert_eq!(parse_timestamp(&json!("yesterday")), None);
    assert_eq!(parse_timestamp(&Value::Null), None);
}

#[test]
fn normalizes_mixed_fixture() {
    let body = fixture("mixed_records.json");
    let batch = normalize_batch(&body, TimestampPolicy::KeepForAggregation).expect("array body");

    assert_eq!(batch.readings.len(), 3);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(batch.rejected[0].index, 2);

    let first = &batch.readings[0];
    assert_eq!(first.id.as_deref(), Some("66fbd1a2c4e1"));
    assert_eq!(first.channels.len(), 13);
    assert_eq!(
        first.value(ChannelKey::particle(ParticleSize::Pm0p5, SensorIndex::Two)),
        Some(402)
    );
    assert_eq!(first.value(ChannelKey::Pressure), Some(14));

    let second = &batch.readings[1];
    assert!(!second.has_timestamp());
    assert_eq!(second.channels.len(), 1);
    assert_eq!(second.value(ChannelKey::Pressure), Some(12));

    let third = &batch.readings[2];
    assert_eq!(third.id.as_deref(), Some("7"));
    assert!(third.has_timestamp());
    assert_eq!(third.channels.len(), 1);
    assert_eq!(
        third.value(ChannelKey::particle(ParticleSize::Pm0p3, SensorIndex::Two)),
        Some(-3)
    );
}

#[test]
fn drop_reading_policy_discards_untimed_records() {
    let body = fixture("mixed_records.json");
    let batch = normalize_batch(&body, TimestampPolicy::DropReading).expect("array body");

    assert_eq!(batch.readings.len(), 2);
    let rejected: Vec<usize> = batch.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![1, 2]);
    assert!(batch.readings.iter().all(|reading| reading.has_timestamp()));
}

#[test]
fn non_array_body_is_an_error() {
    let err = normalize_batch(&json!({"data": []}), TimestampPolicy::default()).unwrap_err();
    assert!(matches!(err, NormalizeError::NotAnArray { found: "object" }));
}

#[test]
fn non_object_record_is_an_error() {
    let err = normalize_record(&json!("pm0p3_1"), TimestampPolicy::default()).unwrap_err();
    assert!(matches!(err, NormalizeError::NotAnObject { found: "string" }));
}

#[test]
fn empty_array_yields_empty_batch() {
    let batch = normalize_batch(&json!([]), TimestampPolicy::default()).expect("array body");
    assert!(batch.readings.is_empty());
    assert!(batch.rejected.is_empty());
}

#[test]
fn readings_serialize_with_field_name_keys() {
    let reading = SensorReading::new(None)
        .with_channel(ChannelKey::particle(ParticleSize::Pm2p5, SensorIndex::Two), 9)
        .with_channel(ChannelKey::Pressure, 14);

    let value = serde_json::to_value(&reading).expect("serializable");
    assert_eq!(value["channels"]["pm2p5_2"], 9);
    assert_eq!(value["channels"]["rawPressure"], 14);

    let back: SensorReading = serde_json::from_value(value).expect("deserializable");
    assert_eq!(back, reading);
}
