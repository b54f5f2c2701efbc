//! Event normalization.
//!
//! Every inbound payload is stamped with an arrival timestamp if the
//! source omitted one, before it reaches the aggregator. Creation and
//! finalization timestamps are therefore always present and comparable.

use chrono::Local;
use serde_json::Value;

/// Current local wall-clock time as a time-of-day string.
///
/// Also used to stamp outbound client events.
pub fn local_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Stamp `payload` with the current local time if it carries no
/// `timestamp` field. No other field is altered.
pub fn normalize_timestamp(payload: &mut Value) {
    let Some(object) = payload.as_object_mut() else {
        return;
    };
    if !object.contains_key("timestamp") {
        object.insert("timestamp".into(), Value::String(local_timestamp()));
    }
}
