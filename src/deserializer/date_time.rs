use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::RegexSet;

use super::Deserializer;
use crate::error::DeserializationError;
use crate::value::{DateTimeValue, Value};

// Unanchored on purpose: a string only has to contain one of the shapes to be
// considered; parsing below is strict.
static DATE_TIME_SHAPES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}[+-][0-9]{2}:[0-9]{2}",
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}",
        r"[0-9]{2}:[0-9]{2}:[0-9]{2}",
    ])
    .expect("date/time patterns")
});

const ISO_8601_WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%:z";
const PLAIN_DATE: &str = "%Y-%m-%d";
const TIME_OF_DAY: &str = "%H:%M:%S";

/// Reads ISO-8601-with-offset, `YYYY-MM-DD` and `HH:MM:SS` strings, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeDeserializer;

impl DateTimeDeserializer {
    pub fn parse(s: &str) -> Option<DateTimeValue> {
        DateTime::parse_from_str(s, ISO_8601_WITH_OFFSET)
            .map(DateTimeValue::Zoned)
            .or_else(|_| NaiveDate::parse_from_str(s, PLAIN_DATE).map(DateTimeValue::Date))
            .or_else(|_| NaiveTime::parse_from_str(s, TIME_OF_DAY).map(DateTimeValue::Time))
            .ok()
    }
}

impl Deserializer for DateTimeDeserializer {
    fn can_deserialize(&self, value: &Value) -> bool {
        match value {
            Value::DateTime(_) => true,
            Value::String(s) => DATE_TIME_SHAPES.is_match(s),
            _ => false,
        }
    }

    fn deserialize(&self, value: &Value) -> Result<Value, DeserializationError> {
        match value {
            Value::DateTime(_) => Ok(value.clone()),
            Value::String(s) => Self::parse(s)
                .map(Value::DateTime)
                .ok_or_else(|| DeserializationError::UnparseableDate(s.clone())),
            other => Err(DeserializationError::Unsupported {
                deserializer: "DateTimeDeserializer",
                found: other.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn recognises_date_time_shapes() {
        let d = DateTimeDeserializer;
        let now = DateTimeValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(d.can_deserialize(&Value::DateTime(now)));
        assert!(d.can_deserialize(&Value::from("2021-04-20")));
        assert!(d.can_deserialize(&Value::from("12:00:00")));
        assert!(d.can_deserialize(&Value::from("2005-08-15T15:52:01+00:00")));

        assert!(!d.can_deserialize(&Value::from("A random string")));
        assert!(!d.can_deserialize(&Value::Int(42)));
        assert!(!d.can_deserialize(&Value::Bool(true)));
        assert!(!d.can_deserialize(&Value::Float(5.1)));
    }

    #[test]
    fn only_ascii_digits_form_a_shape() {
        let d = DateTimeDeserializer;
        let arabic_indic = "\u{662}\u{660}\u{662}\u{661}-\u{660}\u{664}-\u{662}\u{660}";
        assert!(!d.can_deserialize(&Value::from(arabic_indic)));
        assert!(!d.can_deserialize(&Value::from("\u{ff11}\u{ff12}:00:00")));
    }

    #[test]
    fn parses_in_priority_order() {
        let d = DateTimeDeserializer;

        let zoned = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2005, 8, 15, 15, 52, 1).unwrap();
        assert_eq!(
            d.deserialize(&Value::from("2005-08-15T15:52:01+00:00")).unwrap(),
            Value::DateTime(DateTimeValue::Zoned(zoned))
        );
        assert_eq!(
            d.deserialize(&Value::from("2021-04-20")).unwrap(),
            Value::DateTime(DateTimeValue::Date(NaiveDate::from_ymd_opt(2021, 4, 20).unwrap()))
        );
        assert_eq!(
            d.deserialize(&Value::from("12:00:00")).unwrap(),
            Value::DateTime(DateTimeValue::Time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
        );
    }

    #[test]
    fn existing_date_times_pass_through() {
        let d = DateTimeDeserializer;
        let value = Value::DateTime(DateTimeValue::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap()));
        assert_eq!(d.deserialize(&value).unwrap(), value);
    }

    #[test]
    fn unknown_formats_fail() {
        let d = DateTimeDeserializer;
        assert!(matches!(
            d.deserialize(&Value::from("this is wack")),
            Err(DeserializationError::UnparseableDate(s)) if s == "this is wack"
        ));
        // contains a date, but is not one
        assert!(d.can_deserialize(&Value::from("due 2021-04-20")));
        assert!(d.deserialize(&Value::from("due 2021-04-20")).is_err());
    }
}
