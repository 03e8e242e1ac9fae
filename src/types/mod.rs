//! Column value types and their byte encodings.

mod tuple;

use std::{cmp::Ordering, fmt};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use tuple::{KeyComparator, TupleType};

/// Declared type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// One byte, `0` or `1`.
    Boolean,
    /// Big-endian two's complement, 4 bytes.
    Int32,
    /// Big-endian two's complement, 8 bytes.
    Int64,
    /// Big-endian IEEE 754 bits, 8 bytes.
    Double,
    /// UTF-8 text.
    Utf8,
    /// Arbitrary bytes.
    Blob,
}

/// A typed scalar.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 text.
    Utf8(String),
    /// Raw bytes.
    Blob(Bytes),
}

/// Errors raised while encoding or decoding values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// Value does not match the declared type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Declared type.
        expected: DataType,
        /// Type of the supplied value.
        actual: DataType,
    },
    /// Encoded value has the wrong width for a fixed-size type.
    #[error("invalid length for {data_type}: {len} bytes")]
    InvalidLength {
        /// Declared type.
        data_type: DataType,
        /// Actual length.
        len: usize,
    },
    /// Text column holds invalid UTF-8.
    #[error("invalid utf-8 in text value")]
    InvalidUtf8,
    /// Boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),
    /// Composite key bytes are truncated or carry trailing data.
    #[error("malformed composite key: {0}")]
    MalformedKey(String),
    /// Wrong number of components for a composite key.
    #[error("expected {expected} key components, got {actual}")]
    ComponentCount {
        /// Allowed number of components (maximum for prefixes).
        expected: usize,
        /// Supplied number.
        actual: usize,
    },
    /// Component too large for its 32-bit length prefix.
    #[error("key component of {0} bytes is too large")]
    ComponentTooLarge(usize),
}

impl Value {
    /// Type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Double(_) => DataType::Double,
            Value::Utf8(_) => DataType::Utf8,
            Value::Blob(_) => DataType::Blob,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Utf8(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Utf8(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Blob(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Double => "double",
            DataType::Utf8 => "utf8",
            DataType::Blob => "blob",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Utf8(v) => write!(f, "{v:?}"),
            Value::Blob(v) => {
                f.write_str("0x")?;
                for byte in v.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl DataType {
    /// Encode `value`, checking it matches this type.
    pub fn encode(&self, value: &Value) -> Result<Bytes, ValueError> {
        let encoded = match (self, value) {
            (DataType::Boolean, Value::Boolean(v)) => Bytes::copy_from_slice(&[u8::from(*v)]),
            (DataType::Int32, Value::Int32(v)) => Bytes::copy_from_slice(&v.to_be_bytes()),
            (DataType::Int64, Value::Int64(v)) => Bytes::copy_from_slice(&v.to_be_bytes()),
            (DataType::Double, Value::Double(v)) => {
                Bytes::copy_from_slice(&v.to_bits().to_be_bytes())
            }
            (DataType::Utf8, Value::Utf8(v)) => Bytes::copy_from_slice(v.as_bytes()),
            (DataType::Blob, Value::Blob(v)) => v.clone(),
            (expected, value) => {
                return Err(ValueError::TypeMismatch {
                    expected: *expected,
                    actual: value.data_type(),
                })
            }
        };
        Ok(encoded)
    }

    /// Decode bytes previously produced by [`DataType::encode`].
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, ValueError> {
        match self {
            DataType::Boolean => match bytes {
                [0] => Ok(Value::Boolean(false)),
                [1] => Ok(Value::Boolean(true)),
                [other] => Err(ValueError::InvalidBoolean(*other)),
                _ => Err(self.invalid_length(bytes)),
            },
            DataType::Int32 => {
                let raw: [u8; 4] = bytes.try_into().map_err(|_| self.invalid_length(bytes))?;
                Ok(Value::Int32(i32::from_be_bytes(raw)))
            }
            DataType::Int64 => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| self.invalid_length(bytes))?;
                Ok(Value::Int64(i64::from_be_bytes(raw)))
            }
            DataType::Double => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| self.invalid_length(bytes))?;
                Ok(Value::Double(f64::from_bits(u64::from_be_bytes(raw))))
            }
            DataType::Utf8 => std::str::from_utf8(bytes)
                .map(|s| Value::Utf8(s.to_owned()))
                .map_err(|_| ValueError::InvalidUtf8),
            DataType::Blob => Ok(Value::Blob(Bytes::copy_from_slice(bytes))),
        }
    }

    /// Compare two encoded values of this type.
    ///
    /// Values that fail to decode sort after every decodable value and among
    /// themselves by raw bytes, so the result is always a total order.
    pub fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering {
        match self {
            DataType::Utf8 | DataType::Blob | DataType::Boolean => lhs.cmp(rhs),
            DataType::Int32 | DataType::Int64 | DataType::Double => {
                match (self.decode(lhs), self.decode(rhs)) {
                    (Ok(Value::Int32(l)), Ok(Value::Int32(r))) => l.cmp(&r),
                    (Ok(Value::Int64(l)), Ok(Value::Int64(r))) => l.cmp(&r),
                    (Ok(Value::Double(l)), Ok(Value::Double(r))) => l.total_cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    _ => lhs.cmp(rhs),
                }
            }
        }
    }

    fn invalid_length(&self, bytes: &[u8]) -> ValueError {
        ValueError::InvalidLength {
            data_type: *self,
            len: bytes.len(),
        }
    }
}
