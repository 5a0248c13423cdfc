//! Leaf values and their byte encoding.
//!
//! Primitives travel on the wire as an opaque byte payload tagged with a
//! [`ValueType`]. Numerics are little-endian, strings are UTF-8, booleans are
//! a single byte and null is empty.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Long,
    Double,
    String,
    Bytes,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Long => "long",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Bytes => "bytes",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    #[error("{ty} payload must be {expected} bytes, got {actual}")]
    InvalidLength {
        ty: ValueType,
        expected: usize,
        actual: usize,
    },
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

/// The payload of a primitive element.
///
/// Equality is over the encoded payload: doubles compare by bit pattern, so
/// `NaN` equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone)]
pub enum PrimitiveValue {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl PartialEq for PrimitiveValue {
    fn eq(&self, other: &Self) -> bool {
        use PrimitiveValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PrimitiveValue {}

impl PrimitiveValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            PrimitiveValue::Null => ValueType::Null,
            PrimitiveValue::Boolean(_) => ValueType::Boolean,
            PrimitiveValue::Integer(_) => ValueType::Integer,
            PrimitiveValue::Long(_) => ValueType::Long,
            PrimitiveValue::Double(_) => ValueType::Double,
            PrimitiveValue::String(_) => ValueType::String,
            PrimitiveValue::Bytes(_) => ValueType::Bytes,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PrimitiveValue::Null => Vec::new(),
            PrimitiveValue::Boolean(b) => vec![u8::from(*b)],
            PrimitiveValue::Integer(i) => i.to_le_bytes().to_vec(),
            PrimitiveValue::Long(l) => l.to_le_bytes().to_vec(),
            PrimitiveValue::Double(d) => d.to_le_bytes().to_vec(),
            PrimitiveValue::String(s) => s.as_bytes().to_vec(),
            PrimitiveValue::Bytes(b) => b.clone(),
        }
    }

    pub fn from_bytes(ty: ValueType, bytes: &[u8]) -> Result<Self, PrimitiveError> {
        let fixed = |expected: usize| {
            if bytes.len() == expected {
                Ok(())
            } else {
                Err(PrimitiveError::InvalidLength {
                    ty,
                    expected,
                    actual: bytes.len(),
                })
            }
        };
        Ok(match ty {
            ValueType::Null => {
                fixed(0)?;
                PrimitiveValue::Null
            }
            ValueType::Boolean => {
                fixed(1)?;
                PrimitiveValue::Boolean(bytes[0] != 0)
            }
            ValueType::Integer => {
                fixed(4)?;
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                PrimitiveValue::Integer(i32::from_le_bytes(buf))
            }
            ValueType::Long => {
                fixed(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                PrimitiveValue::Long(i64::from_le_bytes(buf))
            }
            ValueType::Double => {
                fixed(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                PrimitiveValue::Double(f64::from_le_bytes(buf))
            }
            ValueType::String => PrimitiveValue::String(
                String::from_utf8(bytes.to_vec()).map_err(|_| PrimitiveError::InvalidUtf8)?,
            ),
            ValueType::Bytes => PrimitiveValue::Bytes(bytes.to_vec()),
        })
    }

    /// JSON view of this value. Bytes render as an array of numbers and
    /// non-finite doubles as `null`.
    pub fn to_json(&self) -> Value {
        match self {
            PrimitiveValue::Null => Value::Null,
            PrimitiveValue::Boolean(b) => Value::Bool(*b),
            PrimitiveValue::Integer(i) => Value::from(*i),
            PrimitiveValue::Long(l) => Value::from(*l),
            PrimitiveValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PrimitiveValue::String(s) => Value::String(s.clone()),
            PrimitiveValue::Bytes(b) => Value::Array(b.iter().map(|x| Value::from(*x)).collect()),
        }
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::String(v.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(v: String) -> Self {
        PrimitiveValue::String(v)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        PrimitiveValue::Boolean(v)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        PrimitiveValue::Integer(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::Long(v)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        PrimitiveValue::Double(v)
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(v: Vec<u8>) -> Self {
        PrimitiveValue::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn byte_layouts() {
        assert_eq!(PrimitiveValue::Null.to_bytes(), Vec::<u8>::new());
        assert_eq!(PrimitiveValue::Boolean(true).to_bytes(), vec![1]);
        assert_eq!(PrimitiveValue::Integer(258).to_bytes(), vec![2, 1, 0, 0]);
        assert_eq!(PrimitiveValue::from("hé").to_bytes(), "hé".as_bytes().to_vec());
    }

    #[test]
    fn decode_matches_type() {
        let v = PrimitiveValue::from_bytes(ValueType::Long, &(-7i64).to_le_bytes()).unwrap();
        assert_eq!(v, PrimitiveValue::Long(-7));
        let v = PrimitiveValue::from_bytes(ValueType::Double, &1.5f64.to_le_bytes()).unwrap();
        assert_eq!(v, PrimitiveValue::Double(1.5));
    }

    #[test]
    fn doubles_compare_by_bits() {
        assert_eq!(PrimitiveValue::Double(f64::NAN), PrimitiveValue::Double(f64::NAN));
        assert_ne!(PrimitiveValue::Double(0.0), PrimitiveValue::Double(-0.0));
        assert_ne!(PrimitiveValue::Double(1.0), PrimitiveValue::Long(1));

        let nan = PrimitiveValue::Double(f64::NAN);
        let decoded = PrimitiveValue::from_bytes(ValueType::Double, &nan.to_bytes()).unwrap();
        assert_eq!(decoded, nan);
        let negative_zero = PrimitiveValue::Double(-0.0);
        let decoded =
            PrimitiveValue::from_bytes(ValueType::Double, &negative_zero.to_bytes()).unwrap();
        assert_eq!(decoded, negative_zero);
        assert_ne!(decoded, PrimitiveValue::Double(0.0));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(
            PrimitiveValue::from_bytes(ValueType::Integer, &[1, 2]),
            Err(PrimitiveError::InvalidLength {
                ty: ValueType::Integer,
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(
            PrimitiveValue::from_bytes(ValueType::String, &[0xff, 0xfe]),
            Err(PrimitiveError::InvalidUtf8)
        );
    }

    #[test]
    fn json_view() {
        assert_eq!(PrimitiveValue::from("x").to_json(), json!("x"));
        assert_eq!(PrimitiveValue::Integer(3).to_json(), json!(3));
        assert_eq!(PrimitiveValue::Double(f64::NAN).to_json(), json!(null));
        assert_eq!(PrimitiveValue::Bytes(vec![0xde, 0xad]).to_json(), json!([0xde, 0xad]));
    }
}
