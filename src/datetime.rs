//! Flexible ISO-8601 timestamp decoding.
//!
//! Upstream services emit timestamps both with and without fractional
//! seconds. Parsing tries the millisecond format first, then whole seconds;
//! both require an explicit UTC offset and normalize to UTC. The serde
//! adapters let target types opt in per field.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Millisecond-precision format with explicit offset (`+00:00` or `Z`).
const FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.3f%#z";

/// Whole-seconds format with explicit offset (`+00:00` or `Z`).
const FORMAT_WHOLE: &str = "%Y-%m-%dT%H:%M:%S%#z";

/// Errors that can occur while parsing a timestamp.
#[derive(Debug, Error)]
pub enum DateError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Parse a timestamp in either supported format, normalized to UTC.
///
/// Format strings are fixed, so parsing is independent of host locale and
/// timezone settings.
pub fn parse_flexible(s: &str) -> Result<DateTime<Utc>, DateError> {
    DateTime::parse_from_str(s, FORMAT_FRACTIONAL)
        .or_else(|_| DateTime::parse_from_str(s, FORMAT_WHOLE))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DateError::InvalidDate(s.to_string()))
}

/// Serde adapter for `DateTime<Utc>` fields using the flexible formats.
///
/// ```
/// use chrono::{DateTime, Utc};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Workout {
///     #[serde(with = "typed_fetch::datetime::flexible")]
///     started_at: DateTime<Utc>,
/// }
/// ```
pub mod flexible {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_flexible(&s).map_err(de::Error::custom)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, false))
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields using the flexible
/// formats. Combine with `#[serde(default)]` to also tolerate missing fields.
pub mod flexible_option {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let maybe: Option<String> = Option::deserialize(deserializer)?;
        maybe
            .map(|s| super::parse_flexible(&s).map_err(de::Error::custom))
            .transpose()
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339_opts(SecondsFormat::Millis, false)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_parse_fractional_format() {
        let parsed = parse_flexible("2024-05-28T10:15:30.123+00:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 28, 10, 15, 30).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_whole_seconds_fallback() {
        let parsed = parse_flexible("2024-05-28T10:15:30+00:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 28, 10, 15, 30).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_zulu_offset() {
        let fractional = parse_flexible("2024-05-28T10:15:30.123Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 28, 10, 15, 30).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(fractional, expected);

        let whole = parse_flexible("2024-05-28T10:15:30Z").unwrap();
        assert_eq!(
            whole,
            Utc.with_ymd_and_hms(2024, 5, 28, 10, 15, 30).unwrap()
        );
    }

    #[test]
    fn test_parse_normalizes_offset_to_utc() {
        let parsed = parse_flexible("2024-05-28T12:15:30+02:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 28, 10, 15, 30).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        assert!(matches!(
            parse_flexible("28/05/2024"),
            Err(DateError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_flexible("2024-05-28"),
            Err(DateError::InvalidDate(_))
        ));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super::flexible")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_flexible_adapter_accepts_both_formats() {
        let a: Stamped = serde_json::from_str(r#"{"at": "2024-05-28T10:15:30.123+00:00"}"#).unwrap();
        let b: Stamped = serde_json::from_str(r#"{"at": "2024-05-28T10:15:30+00:00"}"#).unwrap();
        assert_eq!(a.at - b.at, chrono::Duration::milliseconds(123));
    }

    #[test]
    fn test_flexible_adapter_rejects_invalid_date() {
        let result: Result<Stamped, _> = serde_json::from_str(r#"{"at": "28/05/2024"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_flexible_adapter_serializes_fractional_format() {
        let stamped = Stamped {
            at: Utc.with_ymd_and_hms(2024, 5, 28, 10, 15, 30).unwrap(),
        };
        let json = serde_json::to_string(&stamped).unwrap();
        assert_eq!(json, r#"{"at":"2024-05-28T10:15:30.000+00:00"}"#);
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct MaybeStamped {
        #[serde(default, with = "super::flexible_option")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_flexible_option_adapter() {
        let some: MaybeStamped =
            serde_json::from_str(r#"{"at": "2024-05-28T10:15:30+00:00"}"#).unwrap();
        assert!(some.at.is_some());

        let none: MaybeStamped = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(none.at.is_none());

        let missing: MaybeStamped = serde_json::from_str("{}").unwrap();
        assert!(missing.at.is_none());
    }
}
