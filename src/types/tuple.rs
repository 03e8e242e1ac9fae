//! Composite (tuple) keys and prefixes.
//!
//! A tuple is encoded as a sequence of components, each written as a 4-byte
//! big-endian length followed by the component's own encoding. The same
//! encoding serves full keys and prefixes; a prefix simply has fewer
//! components. Ordering is component-wise under each component's declared
//! type, and a strict prefix sorts before every key that extends it.

use std::{cmp::Ordering, fmt::Debug};

use bytes::{BufMut, Bytes, BytesMut};

use super::{DataType, Value, ValueError};

const LENGTH_PREFIX: usize = 4;

/// Ordering over serialized keys, supplied to ordered containers at
/// construction.
pub trait KeyComparator: Debug + Send + Sync {
    /// Compare two serialized keys.
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering;
}

/// Composite key type over an ordered list of component types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleType {
    types: Vec<DataType>,
}

impl TupleType {
    /// Build a tuple type from its component types.
    pub fn new(types: Vec<DataType>) -> Self {
        Self { types }
    }

    /// Component types in key order.
    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    /// Number of components in a full key.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the tuple has no components.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Serialize a full key; exactly [`TupleType::len`] components.
    pub fn serialize(&self, values: &[Value]) -> Result<Bytes, ValueError> {
        if values.len() != self.types.len() {
            return Err(ValueError::ComponentCount {
                expected: self.types.len(),
                actual: values.len(),
            });
        }
        self.serialize_components(values)
    }

    /// Serialize a prefix of at most [`TupleType::len`] components.
    pub fn serialize_prefix(&self, values: &[Value]) -> Result<Bytes, ValueError> {
        if values.len() > self.types.len() {
            return Err(ValueError::ComponentCount {
                expected: self.types.len(),
                actual: values.len(),
            });
        }
        self.serialize_components(values)
    }

    fn serialize_components(&self, values: &[Value]) -> Result<Bytes, ValueError> {
        let mut buf = BytesMut::new();
        for (data_type, value) in self.types.iter().zip(values) {
            let encoded = data_type.encode(value)?;
            let len = u32::try_from(encoded.len())
                .map_err(|_| ValueError::ComponentTooLarge(encoded.len()))?;
            buf.reserve(LENGTH_PREFIX + encoded.len());
            buf.put_u32(len);
            buf.put_slice(&encoded);
        }
        Ok(buf.freeze())
    }

    /// Decode a key or prefix into its component values.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Vec<Value>, ValueError> {
        let mut values = Vec::new();
        for component in Components::new(bytes) {
            let component = component?;
            let Some(data_type) = self.types.get(values.len()) else {
                return Err(ValueError::ComponentCount {
                    expected: self.types.len(),
                    actual: values.len() + 1,
                });
            };
            values.push(data_type.decode(component)?);
        }
        Ok(values)
    }

    /// Whether `prefix` is a component-wise prefix of `key` (or equal to it).
    pub fn is_prefix_of(&self, prefix: &[u8], key: &[u8]) -> bool {
        let mut keys = Components::new(key);
        for (idx, component) in Components::new(prefix).enumerate() {
            let (Ok(component), Some(Ok(other))) = (component, keys.next()) else {
                return false;
            };
            let Some(data_type) = self.types.get(idx) else {
                return false;
            };
            if data_type.compare(component, other) != Ordering::Equal {
                return false;
            }
        }
        true
    }

    /// Serialized prefixes of `key` with `1..len` components, shortest first.
    ///
    /// The full key itself is not included.
    pub fn strict_prefixes(&self, key: &[u8]) -> Vec<Bytes> {
        let mut prefixes = Vec::new();
        let mut end = 0;
        for component in Components::new(key) {
            let Ok(component) = component else {
                break;
            };
            end += LENGTH_PREFIX + component.len();
            if end < key.len() {
                prefixes.push(Bytes::copy_from_slice(&key[..end]));
            }
        }
        prefixes
    }
}

impl KeyComparator for TupleType {
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering {
        let mut left = Components::new(lhs);
        let mut right = Components::new(rhs);
        let mut idx = 0;
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(Ok(l)), Some(Ok(r))) => {
                    let ord = match self.types.get(idx) {
                        Some(data_type) => data_type.compare(l, r),
                        None => l.cmp(r),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                // A malformed tail sorts after any well-formed component at
                // the same position; two malformed tails compare by bytes
                // from that component boundary.
                (Some(Ok(_)), Some(Err(_))) => return Ordering::Less,
                (Some(Err(_)), Some(Ok(_))) => return Ordering::Greater,
                (Some(Err(_)), Some(Err(_))) => return left.rest().cmp(right.rest()),
            }
            idx += 1;
        }
    }
}

/// Iterator over the raw components of an encoded tuple.
struct Components<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Components<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            failed: false,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.offset.min(self.bytes.len())..]
    }
}

impl<'a> Iterator for Components<'a> {
    type Item = Result<&'a [u8], ValueError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let remaining = &self.bytes[self.offset..];
        let Some((len_bytes, body)) = remaining.split_first_chunk::<LENGTH_PREFIX>() else {
            self.failed = true;
            return Some(Err(ValueError::MalformedKey(format!(
                "truncated length at offset {}",
                self.offset
            ))));
        };
        let len = u32::from_be_bytes(*len_bytes) as usize;
        if body.len() < len {
            self.failed = true;
            return Some(Err(ValueError::MalformedKey(format!(
                "component at offset {} needs {len} bytes, {} left",
                self.offset,
                body.len()
            ))));
        }
        self.offset += LENGTH_PREFIX + len;
        Some(Ok(&body[..len]))
    }
}
