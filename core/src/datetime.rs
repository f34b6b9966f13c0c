//! Conversions between date-time field values and `chrono` instants.
//!
//! The API renders date-time fields as UTC strings with millisecond
//! precision, e.g. `2022-03-24T11:12:13.000Z`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{ApiError, Result};

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Parse a date-time field value. Non-string values fail with `NotDateTime`.
pub fn to_date_time(field: &Value) -> Result<DateTime<Utc>> {
    let raw = field.as_str().ok_or(ApiError::NotDateTime)?;
    parse_date_time(raw)
}

pub(crate) fn parse_date_time(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)?;
    Ok(naive.and_utc())
}

/// Render an instant as a field value, truncated to milliseconds.
pub fn from_date_time(t: DateTime<Utc>) -> Value {
    Value::String(t.format(DATE_TIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_api_timestamp() {
        let t = to_date_time(&json!("2022-03-24T11:12:13.000Z")).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2022, 3, 24, 11, 12, 13).unwrap());
    }

    #[test]
    fn keeps_milliseconds() {
        let t = to_date_time(&json!("2020-04-10T11:30:57.123Z")).unwrap();
        assert_eq!(t.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn non_string_is_not_date_time() {
        assert!(matches!(to_date_time(&json!(1)), Err(ApiError::NotDateTime)));
        assert!(matches!(to_date_time(&Value::Null), Err(ApiError::NotDateTime)));
    }

    #[test]
    fn malformed_string_fails_to_parse() {
        assert!(matches!(to_date_time(&json!("yesterday")), Err(ApiError::DateTimeParse(_))));
    }

    #[test]
    fn formats_with_millisecond_precision() {
        let t = Utc.with_ymd_and_hms(2022, 3, 24, 11, 12, 13).unwrap() + Duration::milliseconds(7);
        assert_eq!(from_date_time(t), json!("2022-03-24T11:12:13.007Z"));
    }

    #[test]
    fn round_trips_millisecond_instants() {
        let base = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        for millis in [0, 1, 999, 86_400_000 + 123] {
            let t = base + Duration::milliseconds(millis);
            assert_eq!(to_date_time(&from_date_time(t)).unwrap(), t);
        }
    }
}
