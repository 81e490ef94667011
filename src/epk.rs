#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::component::{PartitionKeyComponent, StringTerminator};
use crate::definition::PartitionKind;
use crate::murmur::{murmurhash3_128, murmurhash3_32};
use crate::util::hash128_bytes;

/// Hex characters contributed by one hashed unit (one V1 component, one V2
/// hash).
pub const EPK_HEX_LEN: usize = 32;

/// V1 renders each 32-bit hash inside a 128-bit-wide, zero-filled slot.
const V1_ZERO_PREFIX: &str = "000000000000000000000000";

/// Hex string locating a partition key on the partition-range ring.
///
/// Ordering is plain string ordering, which is what range boundaries are
/// compared with.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectivePartitionKey(String);

impl EffectivePartitionKey {
    /// Lowest boundary of the key space (inclusive). The space has no
    /// upper boundary: computed keys may start with `FF`.
    pub const MIN: &'static str = "";

    pub fn min() -> Self {
        Self(Self::MIN.to_owned())
    }

    /// Wrap an existing boundary string, e.g. one returned by the routing layer.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, EpkError> {
        let hex = hex.into();
        if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
            return Err(EpkError::InvalidHex(hex));
        }
        Ok(Self(hex))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EffectivePartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EffectivePartitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EffectivePartitionKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EffectivePartitionKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for EffectivePartitionKey {
    type Error = EpkError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::from_hex(hex)
    }
}

impl From<EffectivePartitionKey> for String {
    fn from(epk: EffectivePartitionKey) -> Self {
        epk.0
    }
}

#[derive(Debug, Error)]
pub enum EpkError {
    #[error("unsupported partition key value: {0}")]
    UnsupportedValue(String),
    #[error("partition key has {actual} components but the definition has {expected} paths")]
    ComponentCountMismatch { expected: usize, actual: usize },
    #[error("{kind} partition keys do not support version {version}")]
    UnsupportedVersion { kind: PartitionKind, version: u8 },
    #[error("partition key definition has no paths")]
    EmptyPaths,
    #[error("invalid effective partition key {0:?}: expected uppercase hex")]
    InvalidHex(String),
    #[error("feed range min {min:?} is greater than max {max:?}")]
    InvalidRange { min: String, max: String },
    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] Box<bincode::ErrorKind>),
}

/// Legacy scheme: one 32-bit hash per component, each rendered as 24 zero
/// digits followed by the big-endian hash.
pub fn compute_v1(components: &[PartitionKeyComponent]) -> EffectivePartitionKey {
    let mut out = String::with_capacity(components.len() * EPK_HEX_LEN);
    let mut buf = Vec::new();
    for component in components {
        buf.clear();
        component.encode(StringTerminator::V1, &mut buf);
        let hash = murmurhash3_32(&buf, 0);
        out.push_str(V1_ZERO_PREFIX);
        out.push_str(&hex::encode_upper(hash.to_be_bytes()));
    }
    trace!(components = components.len(), epk = %out, "computed v1 epk");
    EffectivePartitionKey(out)
}

/// Single 128-bit hash over all components encoded back to back.
pub fn compute_v2_hash(components: &[PartitionKeyComponent]) -> EffectivePartitionKey {
    let len = components.iter().map(|c| c.encoded_len()).sum();
    let mut buf = Vec::with_capacity(len);
    for component in components {
        component.encode(StringTerminator::V2, &mut buf);
    }
    let (low, high) = murmurhash3_128(&buf, 0, 0);
    let out = hash128_to_hex(low, high);
    trace!(components = components.len(), epk = %out, "computed v2 epk");
    EffectivePartitionKey(out)
}

/// One 128-bit hash per component, concatenated. Each level of a
/// hierarchical key routes on its own.
pub fn compute_v2_multi_hash(components: &[PartitionKeyComponent]) -> EffectivePartitionKey {
    let mut out = String::with_capacity(components.len() * EPK_HEX_LEN);
    let mut buf = Vec::new();
    for component in components {
        buf.clear();
        component.encode(StringTerminator::V2, &mut buf);
        let (low, high) = murmurhash3_128(&buf, 0, 0);
        out.push_str(&hex::encode_upper(hash128_bytes(low, high)));
    }
    trace!(components = components.len(), epk = %out, "computed v2 multi-hash epk");
    EffectivePartitionKey(out)
}

/// 32 uppercase hex digits: `low` LE then `high` LE, whole buffer reversed.
pub fn hash128_to_hex(low: u64, high: u64) -> String {
    hex::encode_upper(hash128_bytes(low, high))
}
