use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Liveness information from the tracker's room_status endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    pub last_activity: Option<DateTime<Utc>>,
    pub last_port: Option<u16>,
    pub timeout_seconds: Option<u32>,
}

// ============================================================================
// DECODING
// ============================================================================

/// Decodes a room_status payload. Returns `None` only when the body is not a JSON
/// object; unusable fields are left empty and the rest still decode.
pub fn decode_status(body: &[u8]) -> Option<RoomStatus> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;

    Some(RoomStatus {
        last_activity: string_field(object, "last_activity").and_then(parse_last_activity),
        last_port: integer_field(object, "last_port").and_then(|port| u16::try_from(port).ok()),
        timeout_seconds: integer_field(object, "timeout").and_then(|secs| u32::try_from(secs).ok()),
    })
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key)?.as_str()
}

fn integer_field(object: &Map<String, Value>, key: &str) -> Option<i64> {
    object.get(key)?.as_i64()
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a timestamp, taking values without an offset as UTC.
/// Accepts RFC 3339, RFC 2822 / HTTP dates, and naive ISO date-times.
pub fn parse_last_activity(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

// ============================================================================
// TESTS
// ============================================================================
