use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request fields checked for presence, in reporting order. Must match the
/// order of the checks in [`CreateEventRequest::validate`].
pub const REQUIRED_FIELDS: [&str; 4] = ["status", "schedule", "content", "person_in_charge"];

/// Decoded body of an event-creation request.
///
/// Every field is optional at the type level so that presence can be checked
/// explicitly. A key sent as `null` is still present and decodes to
/// `Some(Value::Null)`. Values are not type-checked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub schedule: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub person_in_charge: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub create_time: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub update_time: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A request that passed the presence check.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub status: Value,
    pub schedule: Value,
    pub content: Value,
    pub person_in_charge: Value,
    pub create_time: Option<Value>,
    pub update_time: Option<Value>,
}

impl CreateEventRequest {
    /// Returns the validated fields, or the first missing required key.
    pub fn validate(self) -> Result<EventFields, &'static str> {
        Ok(EventFields {
            status: self.status.ok_or("status")?,
            schedule: self.schedule.ok_or("schedule")?,
            content: self.content.ok_or("content")?,
            person_in_charge: self.person_in_charge.ok_or("person_in_charge")?,
            create_time: self.create_time,
            update_time: self.update_time,
        })
    }
}

/// The record written to the event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub status: Value,
    pub schedule: Value,
    pub content: Value,
    pub person_in_charge: Value,
    pub create_time: Value,
    pub update_time: Value,
}

impl EventRecord {
    /// Builds a record with a fresh id. Missing timestamps default to `now`.
    pub fn new(fields: EventFields, now: DateTime<Utc>) -> Self {
        let stamp = Value::String(format_timestamp(now));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: fields.status,
            schedule: fields.schedule,
            content: fields.content,
            person_in_charge: fields.person_in_charge,
            create_time: fields.create_time.unwrap_or_else(|| stamp.clone()),
            update_time: fields.update_time.unwrap_or(stamp),
        }
    }
}

/// Formats `now` as naive ISO-8601 followed by a literal `Z`.
///
/// Fractional seconds are written as microseconds and dropped entirely when
/// they are zero: `2024-01-01T08:30:00.123456Z`, `2024-01-01T08:30:00Z`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    let naive = now.naive_utc();
    let micros = naive.nanosecond() / 1_000 % 1_000_000;
    if micros == 0 {
        format!("{}Z", naive.format("%Y-%m-%dT%H:%M:%S"))
    } else {
        format!("{}.{:06}Z", naive.format("%Y-%m-%dT%H:%M:%S"), micros)
    }
}
