use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};
use uuid::Uuid;

/// A single scalar cell value as read from a row or stored in a cursor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compares two values with SQL NULL semantics.
    ///
    /// Returns `None` when either side is `Null`, the same outcome a SQL
    /// comparison yields as `UNKNOWN`. Otherwise defers to [`total_cmp`](Self::total_cmp).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        Some(self.total_cmp(other))
    }

    /// Total order over all values, used both to sort rows and to evaluate
    /// seek predicates in memory.
    ///
    /// Numbers compare by exact numeric value across `Int`, `Uint` and
    /// `Float`; an integer sorts before a float of equal value. Dates and
    /// timestamps compare chronologically (a date is midnight UTC), a date
    /// sorting before the equal timestamp. Otherwise values of different
    /// kinds are ranked by kind: booleans, numbers, strings, uuids,
    /// dates and timestamps, then `Null`.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (
                Value::Int(_) | Value::Uint(_) | Value::Float(_),
                Value::Int(_) | Value::Uint(_) | Value::Float(_),
            ) => compare_numbers(self, other),
            (Value::Date(_) | Value::Timestamp(_), Value::Date(_) | Value::Timestamp(_)) => self
                .instant()
                .cmp(&other.instant())
                .then_with(|| self.kind_rank().cmp(&other.kind_rank())),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Null, Value::Null) => Ordering::Equal,
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Boolean(_) => 0,
            Value::Int(_) | Value::Uint(_) => 1,
            Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Uuid(_) => 4,
            Value::Date(_) => 5,
            Value::Timestamp(_) => 6,
            Value::Null => 7,
        }
    }

    fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN).and_utc()),
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn equal(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Infers a typed value from raw text, as found in CSV cells or CLI input.
    ///
    /// Empty text is `Null`. Integers, floats, booleans, RFC 3339 timestamps
    /// and ISO dates are recognized in that order; anything else stays a string.
    pub fn infer(raw: &str) -> Value {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(v) = raw.parse::<i64>() {
            return Value::Int(v);
        }
        if let Ok(v) = raw.parse::<u64>() {
            return Value::Uint(v);
        }
        if let Ok(v) = raw.parse::<f64>()
            && v.is_finite()
        {
            return Value::Float(v);
        }
        match raw.to_ascii_lowercase().as_str() {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            _ => {}
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Value::Timestamp(ts.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Value::Date(date);
        }
        Value::String(raw.to_string())
    }

    /// Plain JSON view of the value, without the enum tagging used by serde.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Uint(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Value::from(*v),
            Value::String(v) => serde_json::Value::from(v.as_str()),
            Value::Boolean(v) => serde_json::Value::from(*v),
            Value::Uuid(v) => serde_json::Value::from(v.to_string()),
            Value::Date(v) => serde_json::Value::from(v.to_string()),
            Value::Timestamp(v) => serde_json::Value::from(v.to_rfc3339()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<Value>,
}

impl FieldValue {
    pub fn new(name: &str, value: Value) -> Self {
        FieldValue {
            name: name.to_string(),
            value: Some(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace("'", "''")),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

// Exact comparison across the numeric variants; no value is rounded.
fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (as_integer(a), as_integer(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(x), None) => compare_integer_float(x, as_float(b)),
        (None, Some(y)) => compare_integer_float(y, as_float(a)).reverse(),
        (None, None) => as_float(a).total_cmp(&as_float(b)),
    }
}

fn as_integer(v: &Value) -> Option<i128> {
    match v {
        Value::Int(i) => Some(i128::from(*i)),
        Value::Uint(u) => Some(i128::from(*u)),
        _ => None,
    }
}

fn as_float(v: &Value) -> f64 {
    match v {
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

// Integers sort before a float of the same numeric value.
fn compare_integer_float(i: i128, f: f64) -> Ordering {
    // 2^127, exactly representable as f64 and above every i128
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        Ordering::Equal => Ordering::Less,
        other => other,
    }
}
