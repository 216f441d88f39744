pub mod errors;
pub mod model;
mod normalize;

pub use errors::NormalizeError;
pub use model::{ChannelKey, ParticleSize, SensorGroup, SensorIndex, SensorReading, PRESSURE_FIELD};
pub use normalize::{
    coerce_integer, normalize_batch, normalize_record, parse_timestamp, NormalizedBatch,
    RejectedRecord, TimestampPolicy, CREATED_AT_FIELD,
};

#[cfg(test)]
mod tests;
