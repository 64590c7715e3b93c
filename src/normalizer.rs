use crate::error::RecordError;
use crate::record::Record;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const CMDLINE_KEY: &str = "Cmdline";
const WHEN_KEY: &str = "When";

/// paccountant always appends this many characters after the fractional
/// seconds of `When`; they are dropped unread.
const WHEN_SUFFIX_CHARS: usize = 4;
const WHEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%f";
const MAX_FRACTION_DIGITS: usize = 6;

/// Decode one log line and normalize its `Cmdline` and `When` fields.
///
/// Returns `Ok(None)` when the line decodes to a falsy value (`null`, `false`,
/// `0`, `""`, `[]`, `{}`); such lines carry no record.
pub fn parse_record(line: &str) -> Result<Option<Record>, RecordError> {
    let doc: Value = serde_json::from_str(line)?;
    if is_falsy(&doc) {
        return Ok(None);
    }

    let mut fields = match doc {
        Value::Object(map) => map,
        other => return Err(RecordError::NotAnObject(kind_of(&other))),
    };

    let cmdline = fields.remove(CMDLINE_KEY).map(split_cmdline).transpose()?;
    let when = fields.remove(WHEN_KEY).map(parse_when).transpose()?;

    Ok(Some(Record {
        cmdline,
        when,
        fields,
    }))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `/proc/<pid>/cmdline` is null-separated with a trailing null, so the last
/// segment is always dropped.
fn split_cmdline(value: Value) -> Result<Vec<String>, RecordError> {
    let Value::String(raw) = value else {
        return Err(RecordError::FieldType {
            field: CMDLINE_KEY,
            expected: "a string",
        });
    };

    let mut args: Vec<String> = raw.split('\0').map(str::to_owned).collect();
    args.pop();
    Ok(args)
}

fn parse_when(value: Value) -> Result<NaiveDateTime, RecordError> {
    let Value::String(raw) = value else {
        return Err(RecordError::FieldType {
            field: WHEN_KEY,
            expected: "a string",
        });
    };

    let stripped = strip_last_chars(&raw, WHEN_SUFFIX_CHARS);
    parse_timestamp(stripped).map_err(|reason| RecordError::Timestamp {
        raw: raw.clone(),
        reason,
    })
}

fn strip_last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return s;
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[..idx],
        None => "",
    }
}

/// `%Y-%m-%dT%H:%M:%S.%f`: a 4-digit year, 1 or 2 digits for the other fields
/// and 1 to 6 fractional digits. No signs, no padding spaces.
static WHEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})T([0-9]{1,2}):([0-9]{1,2}):([0-9]{1,2})\.([0-9]{1,6})$",
    )
    .expect("valid When pattern")
});

/// Parse a stripped `When` value; the fraction is read as a decimal fraction
/// of a second, so `.5` is 500ms.
fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    let caps = WHEN_RE
        .captures(s)
        .ok_or_else(|| format!("does not match {}", WHEN_FORMAT))?;
    let field = |i: usize| digits(&caps[i]);

    let fraction = &caps[7];
    let micros = digits(fraction) * 10u32.pow((MAX_FRACTION_DIGITS - fraction.len()) as u32);

    let date = NaiveDate::from_ymd_opt(field(1) as i32, field(2), field(3))
        .ok_or_else(|| "date out of range".to_string())?;
    // Leap seconds are not accepted: second 60 is out of range.
    if field(6) > 59 {
        return Err("second must be in 0..59".to_string());
    }
    date.and_hms_micro_opt(field(4), field(5), field(6), micros)
        .ok_or_else(|| "time out of range".to_string())
}

/// Value of an all-ASCII-digit string of at most 6 digits.
fn digits(s: &str) -> u32 {
    s.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}
