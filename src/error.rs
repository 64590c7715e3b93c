use thiserror::Error;

/// Why a single log line could not be turned into a record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("line is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("field `{field}` must be {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("cannot parse timestamp {raw:?}: {reason}")]
    Timestamp { raw: String, reason: String },
}
