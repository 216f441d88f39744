use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("expected a JSON array of readings, found {found}")]
    NotAnArray { found: &'static str },

    #[error("reading is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
