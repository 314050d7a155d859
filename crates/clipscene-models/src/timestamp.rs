//! Timestamp parsing and formatting.
//!
//! Clip boundaries are wall-clock offsets into the source video with
//! whole-second resolution. Accepted input formats are `HH:MM:SS`, `MM:SS`
//! and `SS`; the canonical output format is always `HH:MM:SS`.

use std::fmt;
use std::str::FromStr;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Maximum reasonable video offset (24 hours in seconds).
pub const MAX_OFFSET_SECS: u32 = 86_400;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS, MM:SS, or SS")]
    InvalidFormat(String),

    #[error("Timestamp exceeds maximum allowed offset ({} hours)", MAX_OFFSET_SECS / 3600)]
    ExceedsMaximum,
}

/// Offset into a video, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Create a timestamp from a number of seconds.
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Total seconds.
    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Seconds as a float, for comparisons against probed durations.
    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.0)
    }

    /// Seconds from `self` to `end`, or `None` when `end` is not after `self`.
    pub fn until(&self, end: Timestamp) -> Option<u32> {
        end.0.checked_sub(self.0).filter(|d| *d > 0)
    }

    /// Parse a timestamp string.
    ///
    /// ```
    /// use clipscene_models::Timestamp;
    /// assert_eq!(Timestamp::parse("01:30:00").unwrap().as_secs(), 5400);
    /// assert_eq!(Timestamp::parse("05:30").unwrap().as_secs(), 330);
    /// assert_eq!(Timestamp::parse("90").unwrap().as_secs(), 90);
    /// ```
    pub fn parse(ts: &str) -> Result<Self, TimestampError> {
        let ts = ts.trim();
        if ts.is_empty() {
            return Err(TimestampError::Empty);
        }

        let parts: Vec<&str> = ts.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [s] => ("0", "0", *s),
            [m, s] => ("0", *m, *s),
            [h, m, s] => (*h, *m, *s),
            _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
        };

        let hours = parse_component("hours", hours)?;
        let minutes = parse_component("minutes", minutes)?;
        let seconds = parse_component("seconds", seconds)?;

        let total = hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .ok_or(TimestampError::ExceedsMaximum)?;

        if total > u64::from(MAX_OFFSET_SECS) {
            return Err(TimestampError::ExceedsMaximum);
        }

        Ok(Self(total as u32))
    }
}

fn parse_component(name: &'static str, value: &str) -> Result<u64, TimestampError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidValue(name, value.to_string()));
    }
    value
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, value.to_string()))
}

/// Format seconds as `HH:MM:SS`.
pub fn format_seconds(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Duration between two timestamps formatted as `HH:MM:SS`.
///
/// Non-positive ranges format as `00:00:00`.
pub fn format_duration(start: Timestamp, end: Timestamp) -> String {
    format_seconds(start.until(end).unwrap_or(0))
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_seconds(self.0))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for Timestamp {
    fn schema_name() -> String {
        "Timestamp".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        gen.subschema_for::<String>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hh_mm_ss() {
        assert_eq!(Timestamp::parse("00:00:00").unwrap().as_secs(), 0);
        assert_eq!(Timestamp::parse("00:01:00").unwrap().as_secs(), 60);
        assert_eq!(Timestamp::parse("01:30:45").unwrap().as_secs(), 5445);
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(Timestamp::parse("05:30").unwrap().as_secs(), 330);
        assert_eq!(Timestamp::parse(" 90 ").unwrap().as_secs(), 90);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Timestamp::parse(""), Err(TimestampError::Empty));
        assert!(matches!(
            Timestamp::parse("abc"),
            Err(TimestampError::InvalidValue("seconds", _))
        ));
        assert!(matches!(
            Timestamp::parse("00:00:30.5"),
            Err(TimestampError::InvalidValue("seconds", _))
        ));
        assert!(matches!(
            Timestamp::parse("-1:00"),
            Err(TimestampError::InvalidValue("minutes", _))
        ));
        assert!(matches!(
            Timestamp::parse("1:2:3:4"),
            Err(TimestampError::InvalidFormat(_))
        ));
        assert_eq!(Timestamp::parse("25:00:00"), Err(TimestampError::ExceedsMaximum));
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Timestamp::parse("90").unwrap().to_string(), "00:01:30");
        assert_eq!(Timestamp::from_secs(3661).to_string(), "01:01:01");
    }

    #[test]
    fn test_until() {
        let start = Timestamp::from_secs(10);
        assert_eq!(start.until(Timestamp::from_secs(20)), Some(10));
        assert_eq!(start.until(Timestamp::from_secs(10)), None);
        assert_eq!(start.until(Timestamp::from_secs(5)), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(
            format_duration(Timestamp::from_secs(60), Timestamp::from_secs(125)),
            "00:01:05"
        );
        assert_eq!(
            format_duration(Timestamp::from_secs(60), Timestamp::from_secs(50)),
            "00:00:00"
        );
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let ts: Timestamp = serde_json::from_str("\"1:05\"").unwrap();
        assert_eq!(ts.as_secs(), 65);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"00:01:05\"");
        assert!(serde_json::from_str::<Timestamp>("\"later\"").is_err());
    }
}
