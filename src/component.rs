use std::fmt;

/// Type tags written ahead of each encoded component.
const TAG_UNDEFINED: u8 = 0x00;
const TAG_NULL: u8 = 0x01;
const TAG_FALSE: u8 = 0x02;
const TAG_TRUE: u8 = 0x03;
const TAG_NUMBER: u8 = 0x05;
const TAG_STRING: u8 = 0x08;

/// NaN bit pattern the partitioning scheme hashes for every NaN.
pub const CANONICAL_NAN_BITS: u64 = 0xFFF8_0000_0000_0000;

/// One scalar of a (possibly hierarchical) partition key.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionKeyComponent {
    /// The property is absent from the document.
    Undefined,
    /// The property is present and JSON `null`.
    Null,
    Bool(bool),
    /// Every JSON number is a double. All NaNs hash as [`CANONICAL_NAN_BITS`];
    /// `-0.0` keeps its sign bit.
    Number(f64),
    /// Hashed as raw UTF-8 plus a version-specific terminator.
    String(String),
}

/// Byte appended after string content. This is the only difference between
/// the V1 and V2 encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTerminator {
    V1,
    V2,
}

impl StringTerminator {
    #[inline]
    pub const fn as_byte(self) -> u8 {
        match self {
            StringTerminator::V1 => 0x00,
            StringTerminator::V2 => 0xFF,
        }
    }
}

impl PartitionKeyComponent {
    /// Append the canonical encoding of this component to `buf`.
    pub fn encode(&self, terminator: StringTerminator, buf: &mut Vec<u8>) {
        match self {
            Self::Undefined => buf.push(TAG_UNDEFINED),
            Self::Null => buf.push(TAG_NULL),
            Self::Bool(false) => buf.push(TAG_FALSE),
            Self::Bool(true) => buf.push(TAG_TRUE),
            Self::Number(n) => {
                buf.push(TAG_NUMBER);
                buf.extend_from_slice(&number_bits(*n).to_le_bytes());
            }
            Self::String(s) => {
                buf.push(TAG_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.push(terminator.as_byte());
            }
        }
    }

    /// Encoding of this component alone, in a fresh buffer.
    pub fn encoded(&self, terminator: StringTerminator) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(terminator, &mut buf);
        buf
    }

    #[inline]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Undefined | Self::Null | Self::Bool(_) => 1,
            Self::Number(_) => 9,
            Self::String(s) => s.len() + 2,
        }
    }
}

#[inline]
fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        CANONICAL_NAN_BITS
    } else {
        n.to_bits()
    }
}

impl fmt::Display for PartitionKeyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("{}"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for PartitionKeyComponent {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for PartitionKeyComponent {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for PartitionKeyComponent {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Integers are hashed as doubles; values beyond 2^53 lose precision.
impl From<i64> for PartitionKeyComponent {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for PartitionKeyComponent {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for PartitionKeyComponent {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<PartitionKeyComponent>> From<Option<T>> for PartitionKeyComponent {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::PartitionKeyComponent;
    use crate::epk::EpkError;
    use serde::ser::{Error as _, SerializeMap};
    use serde::{Serialize, Serializer};
    use serde_json::Value;

    /// Largest integer a double represents exactly.
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    impl Serialize for PartitionKeyComponent {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Undefined => serializer.serialize_map(Some(0))?.end(),
                Self::Null => serializer.serialize_unit(),
                Self::Bool(b) => serializer.serialize_bool(*b),
                Self::Number(n) if !n.is_finite() => Err(S::Error::custom(format!(
                    "non-finite partition key number {n} has no JSON form"
                ))),
                // -0.0 hashes differently from 0, keep it a float.
                Self::Number(n)
                    if n.fract() == 0.0
                        && n.abs() <= MAX_SAFE_INTEGER
                        && !(*n == 0.0 && n.is_sign_negative()) =>
                {
                    serializer.serialize_i64(*n as i64)
                }
                Self::Number(n) => serializer.serialize_f64(*n),
                Self::String(s) => serializer.serialize_str(s),
            }
        }
    }

    impl TryFrom<&Value> for PartitionKeyComponent {
        type Error = EpkError;

        fn try_from(value: &Value) -> Result<Self, Self::Error> {
            match value {
                Value::Null => Ok(Self::Null),
                Value::Bool(b) => Ok(Self::Bool(*b)),
                Value::Number(n) => n
                    .as_f64()
                    .map(Self::Number)
                    .ok_or_else(|| EpkError::UnsupportedValue(n.to_string())),
                Value::String(s) => Ok(Self::String(s.clone())),
                Value::Object(map) if map.is_empty() => Ok(Self::Undefined),
                other => Err(EpkError::UnsupportedValue(other.to_string())),
            }
        }
    }
}
