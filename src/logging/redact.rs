use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const TS_ZERO: &str = "1970-01-01T00:00:00Z";

/// Nil UUID used in place of random event ids after redaction.
pub const EVENT_ID_ZERO: &str = "00000000-0000-0000-0000-000000000000";

pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| TS_ZERO.to_string())
}

/// Apply redactions to an event envelope for comparison and safe logging.
/// Zeroes the timestamp and event id and removes volatile timing fields
/// from the payload.
pub fn redact_event(mut v: Value) -> Value {
    if let Some(obj) = v.as_object_mut() {
        if obj.contains_key("timestamp") {
            obj.insert("timestamp".into(), Value::String(TS_ZERO.to_string()));
        }
        if obj.contains_key("event_id") {
            obj.insert("event_id".into(), Value::String(EVENT_ID_ZERO.to_string()));
        }
        if let Some(payload) = obj.get_mut("payload").and_then(Value::as_object_mut) {
            payload.remove("duration_ms");
            payload.remove("lock_wait_ms");
            // checkpoint ids are random per attempt
            if payload.contains_key("checkpoint_id") {
                payload.insert("checkpoint_id".into(), Value::String("***".into()));
            }
        }
    }
    v
}
