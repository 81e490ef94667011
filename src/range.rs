#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::epk::{EffectivePartitionKey, EpkError};

/// Half-open interval `[min_inclusive, max_exclusive)` of effective
/// partition keys, compared as strings. A missing max is unbounded.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "RawFeedRange")
)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedRange {
    min_inclusive: String,
    max_exclusive: Option<String>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeedRange {
    min_inclusive: String,
    #[serde(default)]
    max_exclusive: Option<String>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFeedRange> for FeedRange {
    type Error = EpkError;

    fn try_from(raw: RawFeedRange) -> Result<Self, Self::Error> {
        match raw.max_exclusive {
            Some(max) => FeedRange::new(raw.min_inclusive, max),
            None => Ok(FeedRange::from_min(raw.min_inclusive)),
        }
    }
}

impl FeedRange {
    pub fn new(
        min_inclusive: impl Into<String>,
        max_exclusive: impl Into<String>,
    ) -> Result<Self, EpkError> {
        let min = min_inclusive.into();
        let max = max_exclusive.into();
        if min > max {
            return Err(EpkError::InvalidRange { min, max });
        }
        Ok(Self {
            min_inclusive: min,
            max_exclusive: Some(max),
        })
    }

    /// Everything from `min_inclusive` upwards.
    pub fn from_min(min_inclusive: impl Into<String>) -> Self {
        Self {
            min_inclusive: min_inclusive.into(),
            max_exclusive: None,
        }
    }

    /// The whole key space.
    pub fn full() -> Self {
        Self::from_min(EffectivePartitionKey::MIN)
    }

    /// Every EPK that extends `epk`, the shape used for hierarchical key
    /// prefixes. The bound is the next string after all of `epk`'s
    /// extensions; an all-`F` prefix has none and stays unbounded.
    pub fn for_prefix(epk: &EffectivePartitionKey) -> Self {
        Self {
            min_inclusive: epk.as_str().to_owned(),
            max_exclusive: prefix_successor(epk.as_str()),
        }
    }

    #[inline]
    pub fn min_inclusive(&self) -> &str {
        &self.min_inclusive
    }

    #[inline]
    pub fn max_exclusive(&self) -> Option<&str> {
        self.max_exclusive.as_deref()
    }

    #[inline]
    pub fn contains(&self, epk: &EffectivePartitionKey) -> bool {
        self.min_inclusive.as_str() <= epk.as_str() && self.below_max(epk.as_str())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_exclusive.as_deref() == Some(self.min_inclusive.as_str())
    }

    pub fn overlaps(&self, other: &FeedRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.below_max(&other.min_inclusive)
            && other.below_max(&self.min_inclusive)
    }

    #[inline]
    fn below_max(&self, key: &str) -> bool {
        self.max_exclusive.as_deref().is_none_or(|max| key < max)
    }

    #[cfg(feature = "serde")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, EpkError> {
        Ok(bincode::serialize(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EpkError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Smallest uppercase-hex string above every extension of `prefix`: drop
/// trailing `F`s and bump the last remaining digit.
fn prefix_successor(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_end_matches('F');
    let last = trimmed.chars().last()?;
    let bumped = match last {
        '9' => 'A',
        c => char::from(c as u8 + 1),
    };
    let mut out = trimmed[..trimmed.len() - 1].to_owned();
    out.push(bumped);
    Some(out)
}
