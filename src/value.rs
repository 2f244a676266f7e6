//! The dynamic value hydration works on.
//!
//! A superset of a decoded JSON value: besides the JSON kinds it can carry
//! date/time values, hydrated models, and opaque host resources, so that the
//! output of one deserializer can be fed to another.
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::model::Model;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    DateTime(DateTimeValue),
    Model(Box<Model>),
    Resource(Resource),
}

/// The three shapes a date/time string can be read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    /// ISO-8601 with a UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// `YYYY-MM-DD`
    Date(NaiveDate),
    /// `HH:MM:SS`
    Time(NaiveTime),
}

/// Opaque handle owned by the host (a file, a socket, ...). Compared by identity.
#[derive(Clone)]
pub struct Resource {
    label: String,
    handle: Arc<dyn Any + Send + Sync>,
}

/// Numeric reading of a value, see [`Value::numeric`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

// Numeric strings: optional surrounding whitespace, sign, decimal
// mantissa, optional exponent. No hex, no inf/nan.
static NUMERIC_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?\s*$").expect("numeric pattern")
});

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::DateTime(_) => "date-time",
            Value::Model(_) => "model",
            Value::Resource(_) => "resource",
        }
    }

    /// bool, int, float or string. Null is not a scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_))
    }

    /// List or map.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric().is_some()
    }

    /// Numbers and numeric strings. Booleans are not numeric.
    pub fn numeric(&self) -> Option<Numeric> {
        match self {
            Value::Int(i) => Some(Numeric::Int(*i)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            Value::String(s) if NUMERIC_STRING.is_match(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(i) => Some(Numeric::Int(i)),
                    Err(_) => s.parse::<f64>().ok().map(Numeric::Float),
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Elements of a list, or values of a map in key order.
    pub fn elements(&self) -> Option<Box<dyn Iterator<Item = &Value> + '_>> {
        match self {
            Value::List(xs) => Some(Box::new(xs.iter())),
            Value::Map(m) => Some(Box::new(m.values())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Truncates toward zero; out-of-range floats saturate.
    pub fn as_i64(self) -> i64 {
        match self {
            Numeric::Int(i) => i,
            Numeric::Float(f) => f.trunc() as i64,
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeValue::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
            DateTimeValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateTimeValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

impl Resource {
    pub fn new(label: impl Into<String>, handle: Arc<dyn Any + Send + Sync>) -> Self {
        Self { label: label.into(), handle }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("label", &self.label).finish_non_exhaustive()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

// ------------------------------ Conversions ------------------------------- //

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 beyond i64::MAX overflows to float
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(xs) => Value::List(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self { Value::Float(f) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<DateTimeValue> for Value {
    fn from(dt: DateTimeValue) -> Self { Value::DateTime(dt) }
}

impl From<Model> for Value {
    fn from(m: Model) -> Self { Value::Model(Box::new(m)) }
}

impl From<Resource> for Value {
    fn from(r: Resource) -> Self { Value::Resource(r) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(xs: Vec<T>) -> Self {
        Value::List(xs.into_iter().map(Into::into).collect())
    }
}

// ------------------------------- Serialize -------------------------------- //

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Resource(_) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
            Value::Map(m) => serialize_entries(serializer, m.iter()),
            Value::DateTime(dt) => serializer.collect_str(dt),
            Value::Model(model) => serialize_entries(serializer, model.properties().iter()),
        }
    }
}

fn serialize_entries<'a, S, I>(serializer: S, entries: I) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    I: ExactSizeIterator<Item = (&'a String, &'a Value)>,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (k, v) in entries {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

// ------------------------------- Tests ------------------------------------ //
