use crate::model::HostType;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A literal value carried by a constant node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Char(char),
    DateTime(NaiveDateTime),
}

impl Literal {
    /// The host type this literal was written as.
    pub fn host_type(&self) -> HostType {
        match self {
            Literal::Bool(_) => HostType::Bool,
            Literal::Int32(_) => HostType::Int32,
            Literal::Int64(_) => HostType::Int64,
            Literal::Double(_) => HostType::Double,
            Literal::Decimal(_) => HostType::Decimal,
            Literal::String(_) => HostType::String,
            Literal::Char(_) => HostType::Char,
            Literal::DateTime(_) => HostType::DateTime,
        }
    }

    /// The value as the store expects it inside a typed attribute value:
    /// numbers and strings as text, booleans as booleans.
    pub fn to_attribute_value(&self) -> serde_json::Value {
        match self {
            Literal::Bool(b) => serde_json::Value::Bool(*b),
            Literal::Int32(n) => serde_json::Value::String(n.to_string()),
            Literal::Int64(n) => serde_json::Value::String(n.to_string()),
            Literal::Double(n) => serde_json::Value::String(n.to_string()),
            Literal::Decimal(d) => serde_json::Value::String(d.to_string()),
            Literal::String(s) => serde_json::Value::String(s.clone()),
            Literal::Char(c) => serde_json::Value::String(c.to_string()),
            Literal::DateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int32(n) => write!(f, "{}", n),
            Literal::Int64(n) => write!(f, "{}L", n),
            Literal::Double(n) => write!(f, "{:?}", n),
            Literal::Decimal(d) => write!(f, "{}m", d),
            Literal::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Literal::Char(c) => write!(f, "'{}'", c),
            Literal::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int32(n)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int64(n)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Double(n)
    }
}

impl From<Decimal> for Literal {
    fn from(d: Decimal) -> Self {
        Literal::Decimal(d)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<char> for Literal {
    fn from(c: char) -> Self {
        Literal::Char(c)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(dt: NaiveDateTime) -> Self {
        Literal::DateTime(dt)
    }
}
