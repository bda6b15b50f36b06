//! Serde helpers for filter dates
//!
//! Study files carry dates as RFC 3339 timestamps (`2024-01-01T00:00:00.000Z`)
//! while decoded seeds carry unix seconds. Both are accepted; dates are always
//! written back as RFC 3339 UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Seconds(i64),
    Text(String),
}

pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(seconds) => match DateTime::<Utc>::from_timestamp(*seconds, 0) {
            Some(date) => serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_i64(*seconds),
        },
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDate> = Option::deserialize(deserializer)?;

    match raw {
        None => Ok(None),
        Some(RawDate::Seconds(seconds)) => Ok(Some(seconds)),
        Some(RawDate::Text(text)) => {
            if let Ok(seconds) = text.parse::<i64>() {
                return Ok(Some(seconds));
            }
            DateTime::parse_from_rfc3339(&text)
                .map(|date| Some(date.timestamp()))
                .map_err(|e| de::Error::custom(format!("Invalid date value \"{}\": {}", text, e)))
        }
    }
}

/// Render unix seconds for diagnostics
pub fn format_timestamp(seconds: i64) -> String {
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(date) => date.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => seconds.to_string(),
    }
}
