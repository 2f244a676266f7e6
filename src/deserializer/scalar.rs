//! Primitive coercion.
//!
//! The four scalar coercers share one type; behaviour is selected by a
//! [`ScalarKind`] through a single dispatch table. [`JuggleCoercer`] is the
//! lenient mode of the same table: it accepts anything and casts.
use once_cell::sync::Lazy;
use regex::Regex;

use super::Deserializer;
use crate::definition::PrimitiveKind;
use crate::error::DeserializationError;
use crate::value::{Numeric, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Boolean,
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveCoercer {
    kind: ScalarKind,
}

/// Plain casts: `can_deserialize` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JuggleCoercer {
    kind: ScalarKind,
}

static LEADING_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?").expect("leading numeric pattern")
});

// significant digits used when rendering floats as strings
const FLOAT_PRECISION: i32 = 14;

impl ScalarKind {
    pub const ALL: [ScalarKind; 4] = [
        ScalarKind::Boolean,
        ScalarKind::Float,
        ScalarKind::Integer,
        ScalarKind::String,
    ];

    pub fn primitive(self) -> PrimitiveKind {
        match self {
            ScalarKind::Boolean => PrimitiveKind::Boolean,
            ScalarKind::Integer => PrimitiveKind::Integer,
            ScalarKind::Float => PrimitiveKind::Float,
            ScalarKind::String => PrimitiveKind::String,
        }
    }

    fn deserializer_name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "BooleanDeserializer",
            ScalarKind::Integer => "IntegerDeserializer",
            ScalarKind::Float => "FloatDeserializer",
            ScalarKind::String => "StringDeserializer",
        }
    }
}

impl PrimitiveCoercer {
    pub const fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }

    pub const fn boolean() -> Self { Self::new(ScalarKind::Boolean) }
    pub const fn integer() -> Self { Self::new(ScalarKind::Integer) }
    pub const fn float() -> Self { Self::new(ScalarKind::Float) }
    pub const fn string() -> Self { Self::new(ScalarKind::String) }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    fn coerce(&self, value: &Value) -> Option<Value> {
        match self.kind {
            ScalarKind::Boolean => to_boolean(value).map(Value::Bool),
            ScalarKind::Integer => value.numeric().map(|n| Value::Int(n.as_i64())),
            ScalarKind::Float => value.numeric().map(|n| Value::Float(n.as_f64())),
            ScalarKind::String => to_string(value).map(Value::String),
        }
    }
}

impl Deserializer for PrimitiveCoercer {
    fn can_deserialize(&self, value: &Value) -> bool {
        match self.kind {
            ScalarKind::Boolean => to_boolean(value).is_some(),
            ScalarKind::Integer | ScalarKind::Float => value.is_numeric(),
            ScalarKind::String => value.is_scalar(),
        }
    }

    fn deserialize(&self, value: &Value) -> Result<Value, DeserializationError> {
        let coerced = self.coerce(value).ok_or(DeserializationError::Unsupported {
            deserializer: self.kind.deserializer_name(),
            found: value.kind_name(),
        })?;
        tracing::trace!(kind = ?self.kind, from = value.kind_name(), "coerced scalar");
        Ok(coerced)
    }
}

impl JuggleCoercer {
    pub const TYPE_NAME: &'static str = "JuggleDeserializer";

    pub const fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    fn cast(&self, value: &Value) -> Option<Value> {
        match self.kind {
            ScalarKind::Boolean => Some(Value::Bool(truthy(value))),
            ScalarKind::Integer => cast_numeric(value).map(|n| Value::Int(n.as_i64())),
            ScalarKind::Float => cast_numeric(value).map(|n| Value::Float(n.as_f64())),
            ScalarKind::String => match value {
                Value::Null => Some(Value::String(String::new())),
                Value::DateTime(dt) => Some(Value::String(dt.to_string())),
                other => to_string(other).map(Value::String),
            },
        }
    }
}

impl Deserializer for JuggleCoercer {
    fn can_deserialize(&self, _value: &Value) -> bool {
        true
    }

    fn deserialize(&self, value: &Value) -> Result<Value, DeserializationError> {
        let cast = self.cast(value).ok_or(DeserializationError::Unsupported {
            deserializer: Self::TYPE_NAME,
            found: value.kind_name(),
        })?;
        tracing::trace!(kind = ?self.kind, from = value.kind_name(), "juggled scalar");
        Ok(cast)
    }
}

/// `None` when the value is not boolean-representative.
fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(1) => Some(true),
        Value::Int(0) => Some(false),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(float_to_string(*f)),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::List(xs) => !xs.is_empty(),
        Value::Map(m) => !m.is_empty(),
        Value::DateTime(_) | Value::Model(_) | Value::Resource(_) => true,
    }
}

fn cast_numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Null => Some(Numeric::Int(0)),
        Value::Bool(b) => Some(Numeric::Int(i64::from(*b))),
        Value::Int(i) => Some(Numeric::Int(*i)),
        Value::Float(f) => Some(Numeric::Float(*f)),
        Value::String(s) => Some(leading_numeric(s)),
        Value::List(xs) => Some(Numeric::Int(i64::from(!xs.is_empty()))),
        Value::Map(m) => Some(Numeric::Int(i64::from(!m.is_empty()))),
        Value::DateTime(_) | Value::Model(_) | Value::Resource(_) => None,
    }
}

/// Numeric reading of the longest numeric prefix; zero when there is none.
fn leading_numeric(s: &str) -> Numeric {
    let Some(prefix) = LEADING_NUMERIC.find(s) else {
        return Numeric::Int(0);
    };
    let prefix = prefix.as_str().trim();
    match prefix.parse::<i64>() {
        Ok(i) => Numeric::Int(i),
        Err(_) => Numeric::Float(prefix.parse::<f64>().unwrap_or(0.0)),
    }
}

/// `FLOAT_PRECISION` significant digits, trailing zeros trimmed, and the
/// `1.0E+20` form outside `1e-4 ..= 1e14`.
fn float_to_string(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let scientific = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, f);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return f.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -4 || exponent >= FLOAT_PRECISION {
        let mantissa = trim_fraction(mantissa);
        let mantissa = if mantissa.contains('.') { mantissa.to_string() } else { format!("{mantissa}.0") };
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}E{sign}{}", exponent.abs());
    }
    let decimals = (FLOAT_PRECISION - 1 - exponent).max(0) as usize;
    trim_fraction(&format!("{f:.decimals$}")).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn boolean_accepts_only_representatives() {
        let d = PrimitiveCoercer::boolean();
        for ok in [json!(true), json!(false), json!(1), json!(0), json!("1"), json!("0"),
                   json!("true"), json!("FALSE"), json!("Yes"), json!("no")] {
            assert!(d.can_deserialize(&v(ok.clone())), "{ok}");
        }
        for bad in [json!("any random string"), json!(999), json!(42), json!(5.6),
                    json!(-20), json!(1.0), json!([]), json!({}), json!(null)] {
            assert!(!d.can_deserialize(&v(bad.clone())), "{bad}");
        }
    }

    #[test]
    fn boolean_maps_truthy_strings() {
        let d = PrimitiveCoercer::boolean();
        for t in [json!(true), json!(1), json!("1"), json!("true"), json!("YES")] {
            assert_eq!(d.deserialize(&v(t)).unwrap(), Value::Bool(true));
        }
        for f in [json!(false), json!(0), json!("0"), json!("false"), json!("no")] {
            assert_eq!(d.deserialize(&v(f)).unwrap(), Value::Bool(false));
        }
        assert!(matches!(
            d.deserialize(&v(json!("maybe"))),
            Err(DeserializationError::Unsupported { deserializer: "BooleanDeserializer", .. })
        ));
    }

    #[test]
    fn integer_truncates_numeric_values() {
        let d = PrimitiveCoercer::integer();
        for ok in [json!(999), json!(42), json!(5.6), json!(-20), json!("5.1"), json!("42")] {
            assert!(d.can_deserialize(&v(ok)));
        }
        for bad in [json!(true), json!(false), json!("any random string"), json!([]), json!({})] {
            assert!(!d.can_deserialize(&v(bad)));
        }
        assert_eq!(d.deserialize(&v(json!(999))).unwrap(), Value::Int(999));
        assert_eq!(d.deserialize(&v(json!(5.6))).unwrap(), Value::Int(5));
        assert_eq!(d.deserialize(&v(json!(-5.6))).unwrap(), Value::Int(-5));
        assert_eq!(d.deserialize(&v(json!("5.1"))).unwrap(), Value::Int(5));
        assert_eq!(d.deserialize(&v(json!("42"))).unwrap(), Value::Int(42));
        assert!(d.deserialize(&v(json!("nope"))).is_err());
    }

    #[test]
    fn float_parses_numeric_values() {
        let d = PrimitiveCoercer::float();
        assert!(!d.can_deserialize(&Value::Bool(true)));
        assert_eq!(d.deserialize(&v(json!(999))).unwrap(), Value::Float(999.0));
        assert_eq!(d.deserialize(&v(json!(5.6))).unwrap(), Value::Float(5.6));
        assert_eq!(d.deserialize(&v(json!(-20))).unwrap(), Value::Float(-20.0));
        assert_eq!(d.deserialize(&v(json!("5.1"))).unwrap(), Value::Float(5.1));
        assert_eq!(d.deserialize(&v(json!("42"))).unwrap(), Value::Float(42.0));
    }

    #[test]
    fn string_renders_any_scalar() {
        let d = PrimitiveCoercer::string();
        assert!(!d.can_deserialize(&v(json!([]))));
        assert!(!d.can_deserialize(&v(json!({}))));
        assert!(!d.can_deserialize(&Value::Null));
        let cases = [
            (json!(999), "999"),
            (json!(5.6), "5.6"),
            (json!(-20), "-20"),
            (json!("5.1"), "5.1"),
            (json!(true), "1"),
            (json!(false), ""),
            (json!("any random string"), "any random string"),
        ];
        for (input, expected) in cases {
            assert_eq!(d.deserialize(&v(input)).unwrap(), Value::from(expected));
        }
    }

    #[test]
    fn coercers_report_their_kind() {
        for kind in ScalarKind::ALL {
            assert_eq!(PrimitiveCoercer::new(kind).kind(), kind);
            assert_eq!(JuggleCoercer::new(kind).kind(), kind);
        }
        assert_eq!(PrimitiveCoercer::float().kind().primitive(), PrimitiveKind::Float);
    }

    #[test]
    fn floats_render_with_fourteen_significant_digits() {
        let cases = [
            (1e20, "1.0E+20"),
            (-1e20, "-1.0E+20"),
            (0.1 + 0.2, "0.3"),
            (5.6, "5.6"),
            (5.0, "5"),
            (-20.5, "-20.5"),
            (0.0001, "0.0001"),
            (0.00001, "1.0E-5"),
            (1.5e-7, "1.5E-7"),
            (12345678901234.0, "12345678901234"),
            (123456789012344.0, "1.2345678901234E+14"),
            (0.0, "0"),
            (f64::INFINITY, "INF"),
            (f64::NEG_INFINITY, "-INF"),
            (f64::NAN, "NAN"),
        ];
        for (input, expected) in cases {
            assert_eq!(float_to_string(input), expected, "{input:e}");
        }
        let d = PrimitiveCoercer::string();
        assert_eq!(d.deserialize(&Value::Float(1e20)).unwrap(), Value::from("1.0E+20"));
    }

    #[test]
    fn juggle_accepts_everything() {
        for kind in ScalarKind::ALL {
            let d = JuggleCoercer::new(kind);
            for input in [json!(null), json!("abc"), json!([]), json!({"a": 1}), json!(5.6)] {
                assert!(d.can_deserialize(&v(input)));
            }
        }
    }

    #[test]
    fn juggle_boolean_is_truthiness() {
        let d = JuggleCoercer::new(ScalarKind::Boolean);
        for t in [json!("no"), json!("false"), json!("abc"), json!(-1), json!(0.5), json!([0]), json!({"a": 1}), json!(true)] {
            assert_eq!(d.deserialize(&v(t.clone())).unwrap(), Value::Bool(true), "{t}");
        }
        for f in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!("0"), json!([]), json!({})] {
            assert_eq!(d.deserialize(&v(f.clone())).unwrap(), Value::Bool(false), "{f}");
        }
    }

    #[test]
    fn juggle_integer_reads_leading_digits() {
        let d = JuggleCoercer::new(ScalarKind::Integer);
        let cases = [
            (json!("abc"), 0),
            (json!("12abc"), 12),
            (json!(" -7 apples"), -7),
            (json!("5.9kg"), 5),
            (json!("1e3"), 1000),
            (json!(null), 0),
            (json!(true), 1),
            (json!(false), 0),
            (json!(-5.6), -5),
            (json!([]), 0),
            (json!([1, 2]), 1),
            (json!({"a": 1}), 1),
        ];
        for (input, expected) in cases {
            assert_eq!(d.deserialize(&v(input.clone())).unwrap(), Value::Int(expected), "{input}");
        }
    }

    #[test]
    fn juggle_float_reads_leading_digits() {
        let d = JuggleCoercer::new(ScalarKind::Float);
        assert_eq!(d.deserialize(&v(json!("abc"))).unwrap(), Value::Float(0.0));
        assert_eq!(d.deserialize(&v(json!("2.5 units"))).unwrap(), Value::Float(2.5));
        assert_eq!(d.deserialize(&v(json!(".5"))).unwrap(), Value::Float(0.5));
        assert_eq!(d.deserialize(&v(json!(true))).unwrap(), Value::Float(1.0));
        assert_eq!(d.deserialize(&v(json!(42))).unwrap(), Value::Float(42.0));
        // non-ASCII digits are not digits
        assert_eq!(d.deserialize(&v(json!("\u{664}\u{662}"))).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn juggle_string_casts_scalars_only() {
        let d = JuggleCoercer::new(ScalarKind::String);
        assert_eq!(d.deserialize(&Value::Null).unwrap(), Value::from(""));
        assert_eq!(d.deserialize(&v(json!(true))).unwrap(), Value::from("1"));
        assert_eq!(d.deserialize(&v(json!(0.1 + 0.2))).unwrap(), Value::from("0.3"));
        assert_eq!(d.deserialize(&v(json!(42))).unwrap(), Value::from("42"));
        let date = crate::value::DateTimeValue::Date(chrono::NaiveDate::from_ymd_opt(2021, 4, 20).unwrap());
        assert_eq!(d.deserialize(&Value::DateTime(date)).unwrap(), Value::from("2021-04-20"));
        assert!(matches!(
            d.deserialize(&v(json!([1]))),
            Err(DeserializationError::Unsupported { deserializer: "JuggleDeserializer", found: "list" })
        ));
    }

    #[test]
    fn juggle_numbers_reject_date_times() {
        let date = crate::value::DateTimeValue::Date(chrono::NaiveDate::from_ymd_opt(2021, 4, 20).unwrap());
        for kind in [ScalarKind::Integer, ScalarKind::Float] {
            assert!(JuggleCoercer::new(kind).deserialize(&Value::DateTime(date)).is_err());
        }
        assert_eq!(
            JuggleCoercer::new(ScalarKind::Boolean).deserialize(&Value::DateTime(date)).unwrap(),
            Value::Bool(true)
        );
    }
}
