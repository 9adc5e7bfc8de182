use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A number some issuers encode as a CBOR integer and others as a float.
///
/// Both representations are kept exactly; truncation to an integer only
/// happens in [`Numeric::truncate`].
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Integer value for display, rounding toward zero. Non finite floats
    /// become 0.
    pub fn truncate(self) -> i64 {
        match self {
            Numeric::Int(i) => i,
            Numeric::Float(f) if f.is_finite() => f.trunc() as i64,
            Numeric::Float(_) => 0,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Numeric::Float(_))
    }
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Int(0)
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Numeric::Int(a), Numeric::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl From<i64> for Numeric {
    fn from(i: i64) -> Self {
        Numeric::Int(i)
    }
}

impl From<f64> for Numeric {
    fn from(f: f64) -> Self {
        Numeric::Float(f)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(x) => write!(f, "{}", x),
        }
    }
}

impl Serialize for Numeric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Numeric::Int(i) => serializer.serialize_i64(i),
            Numeric::Float(f) => serializer.serialize_f64(f),
        }
    }
}

struct NumericVisitor;

impl<'de> Visitor<'de> for NumericVisitor {
    type Value = Numeric;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a float")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Numeric, E> {
        Ok(Numeric::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Numeric, E> {
        if v > i64::MAX as u64 {
            return Err(E::invalid_value(de::Unexpected::Unsigned(v), &self));
        }
        Ok(Numeric::Int(v as i64))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Numeric, E> {
        if v < i64::MIN as i128 || v > i64::MAX as i128 {
            return Err(E::custom(format!("integer {} out of range", v)));
        }
        Ok(Numeric::Int(v as i64))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Numeric, E> {
        if v > i64::MAX as u128 {
            return Err(E::custom(format!("integer {} out of range", v)));
        }
        Ok(Numeric::Int(v as i64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Numeric, E> {
        Ok(Numeric::Float(v))
    }
}

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumericVisitor)
    }
}
