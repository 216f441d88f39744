use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{json_kind, NormalizeError};
use crate::model::{ChannelKey, SensorReading};

pub const CREATED_AT_FIELD: &str = "createdAt";

/// What to do with a record whose `createdAt` cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Keep the reading for averages and exports; it just never gets a chart label.
    #[default]
    KeepForAggregation,
    /// Drop the reading entirely.
    DropReading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub readings: Vec<SensorReading>,
    pub rejected: Vec<RejectedRecord>,
}

/// Normalizes a full response body. Individual malformed records are skipped and reported
/// in [`NormalizedBatch::rejected`]; only a body that is not an array is an error.
pub fn normalize_batch(body: &Value, policy: TimestampPolicy) -> Result<NormalizedBatch, NormalizeError> {
    let Value::Array(records) = body else {
        return Err(NormalizeError::NotAnArray {
            found: json_kind(body),
        });
    };

    let mut batch = NormalizedBatch {
        readings: Vec::with_capacity(records.len()),
        rejected: Vec::new(),
    };

    for (index, record) in records.iter().enumerate() {
        match normalize_record(record, policy) {
            Ok(Some(reading)) => batch.readings.push(reading),
            Ok(None) => {
                debug!(index, "dropping reading with unparseable {CREATED_AT_FIELD}");
                batch.rejected.push(RejectedRecord {
                    index,
                    reason: format!("unparseable {CREATED_AT_FIELD}"),
                });
            }
            Err(err) => {
                warn!(index, error = %err, "skipping malformed reading");
                batch.rejected.push(RejectedRecord {
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(batch)
}

/// Converts one raw record into a [`SensorReading`].
///
/// Returns `Ok(None)` only when `policy` is [`TimestampPolicy::DropReading`] and the record
/// has no usable timestamp.
pub fn normalize_record(
    record: &Value,
    policy: TimestampPolicy,
) -> Result<Option<SensorReading>, NormalizeError> {
    let Value::Object(fields) = record else {
        return Err(NormalizeError::NotAnObject {
            found: json_kind(record),
        });
    };

    let created_at = fields.get(CREATED_AT_FIELD).and_then(parse_timestamp);
    if created_at.is_none() && policy == TimestampPolicy::DropReading {
        return Ok(None);
    }

    let mut reading = SensorReading::new(created_at);
    reading.id = record_id(fields);

    for key in ChannelKey::ALL {
        let field = key.field_name();
        let Some(raw) = fields.get(&field) else {
            continue;
        };
        match coerce_integer(raw) {
            Some(value) => {
                reading.channels.insert(key, value);
            }
            None => debug!(channel = %field, found = json_kind(raw), "channel is not numeric"),
        }
    }

    Ok(Some(reading))
}

/// Accepts RFC 3339 strings and epoch milliseconds (as a JSON integer or numeric string).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
                return Some(parsed.with_timezone(&Utc));
            }
            trimmed
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
        }
        Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Leading-integer coercion: integers pass through, finite floats truncate toward zero and
/// strings yield their leading run of digits (`" 42px"` is 42). Everything else is absent.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Some(int);
            }
            let float = number.as_f64()?;
            if float.is_finite() && float.abs() < i64::MAX as f64 {
                Some(float.trunc() as i64)
            } else {
                None
            }
        }
        Value::String(text) => leading_integer(text),
        _ => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn record_id(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("_id").or_else(|| fields.get("id"))? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
