//! Typed parameter bindings and result rows.
//!
//! Every bound parameter carries its type with it: the enum variant is the
//! type tag, so a value can never be bound under the wrong type.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, ToSqlOutput, Value};
use duckdb::ToSql;
use std::fmt;

/// Type tag of a [`SqlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Null,
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
}

/// A SQL value used both for parameter bindings and for result cells.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            SqlValue::Null => ParamType::Null,
            SqlValue::Integer(_) => ParamType::Integer,
            SqlValue::Float(_) => ParamType::Float,
            SqlValue::Text(_) => ParamType::Text,
            SqlValue::Boolean(_) => ParamType::Boolean,
            SqlValue::Timestamp(_) => ParamType::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Integer(n) => write!(f, "{n}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Boolean(b) => write!(f, "{b}"),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Integer(n)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Boolean(b)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(ts: NaiveDateTime) -> Self {
        SqlValue::Timestamp(ts)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(n) => Value::BigInt(*n),
            SqlValue::Float(x) => Value::Double(*x),
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Boolean(b) => Value::Boolean(*b),
            SqlValue::Timestamp(ts) => {
                Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
            }
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn timestamp_from(unit: TimeUnit, raw: i64) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Second => DateTime::from_timestamp(raw, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(raw),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(raw),
        TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(raw)),
    };
    dt.map(|d| d.naive_utc())
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Boolean(b) => SqlValue::Boolean(b),
            Value::TinyInt(n) => SqlValue::Integer(n.into()),
            Value::SmallInt(n) => SqlValue::Integer(n.into()),
            Value::Int(n) => SqlValue::Integer(n.into()),
            Value::BigInt(n) => SqlValue::Integer(n),
            Value::UTinyInt(n) => SqlValue::Integer(n.into()),
            Value::USmallInt(n) => SqlValue::Integer(n.into()),
            Value::UInt(n) => SqlValue::Integer(n.into()),
            Value::UBigInt(n) => i64::try_from(n)
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(n.to_string())),
            Value::HugeInt(n) => i64::try_from(n)
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(n.to_string())),
            Value::Float(x) => SqlValue::Float(x.into()),
            Value::Double(x) => SqlValue::Float(x),
            Value::Decimal(d) => {
                let s = d.to_string();
                s.parse::<f64>()
                    .map(SqlValue::Float)
                    .unwrap_or(SqlValue::Text(s))
            }
            Value::Text(s) => SqlValue::Text(s),
            Value::Timestamp(unit, raw) => timestamp_from(unit, raw)
                .map(SqlValue::Timestamp)
                .unwrap_or(SqlValue::Null),
            Value::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days.into())))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(SqlValue::Timestamp)
                .unwrap_or(SqlValue::Null),
            other => SqlValue::Text(format!("{other:?}")),
        }
    }
}

/// One result row, cells in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<SqlValue>);

impl Row {
    pub fn get(&self, idx: usize) -> Option<&SqlValue> {
        self.0.get(idx)
    }

    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        self.get(idx).and_then(SqlValue::as_i64)
    }

    pub fn get_str(&self, idx: usize) -> Option<&str> {
        self.get(idx).and_then(SqlValue::as_str)
    }

    pub fn get_timestamp(&self, idx: usize) -> Option<NaiveDateTime> {
        self.get(idx).and_then(SqlValue::as_timestamp)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
