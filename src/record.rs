use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

/// One paccountant log line after normalization.
///
/// `Cmdline` and `When` are lifted into typed fields; every other key the
/// daemon wrote (`Pwd`, `Exe`, `Uid`, `IO`, ...) is kept as-is in `fields` and
/// flattened back next to them on output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    #[serde(rename = "Cmdline", skip_serializing_if = "Option::is_none")]
    pub cmdline: Option<Vec<String>>,

    #[serde(rename = "When", skip_serializing_if = "Option::is_none")]
    pub when: Option<NaiveDateTime>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}
