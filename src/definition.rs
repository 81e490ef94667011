#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::epk::{
    EffectivePartitionKey, EpkError, compute_v1, compute_v2_hash, compute_v2_multi_hash,
};
use crate::partition_key::PartitionKey;
use crate::range::FeedRange;

/// How a container spreads its partition key paths over the key space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// A single path, hashed as one unit.
    #[default]
    Hash,
    /// Hierarchical paths, each level hashed on its own.
    MultiHash,
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PartitionKind::Hash => "Hash",
            PartitionKind::MultiHash => "MultiHash",
        })
    }
}

/// Generation of the hashing scheme. Serialized as the bare number.
///
/// Containers whose definition omits the version are legacy V1 containers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PartitionKeyVersion {
    #[default]
    V1,
    V2,
}

impl TryFrom<u8> for PartitionKeyVersion {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(format!("unknown partition key version {other}")),
        }
    }
}

impl From<PartitionKeyVersion> for u8 {
    fn from(v: PartitionKeyVersion) -> Self {
        match v {
            PartitionKeyVersion::V1 => 1,
            PartitionKeyVersion::V2 => 2,
        }
    }
}

/// Container-level partitioning settings; selects the EPK algorithm.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: PartitionKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: PartitionKeyVersion,
}

/// New containers: `/id`, hash partitioned, V2.
impl Default for PartitionKeyDefinition {
    fn default() -> Self {
        Self::hash("/id")
    }
}

impl PartitionKeyDefinition {
    /// Single-path V2 hash partitioning.
    pub fn hash(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            kind: PartitionKind::Hash,
            version: PartitionKeyVersion::V2,
        }
    }

    /// Hierarchical partitioning over `paths`, outermost level first.
    pub fn multi_hash<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            kind: PartitionKind::MultiHash,
            version: PartitionKeyVersion::V2,
        }
    }

    pub fn with_version(mut self, version: PartitionKeyVersion) -> Self {
        self.version = version;
        self
    }

    pub fn validate(&self) -> Result<(), EpkError> {
        if self.paths.is_empty() {
            debug!("rejecting partition key definition without paths");
            return Err(EpkError::EmptyPaths);
        }
        if self.kind == PartitionKind::MultiHash && self.version != PartitionKeyVersion::V2 {
            debug!(version = ?self.version, "rejecting v1 multi-hash definition");
            return Err(EpkError::UnsupportedVersion {
                kind: self.kind,
                version: self.version.into(),
            });
        }
        Ok(())
    }

    /// EPK of `key` under this definition.
    ///
    /// An empty key maps to the start of the key space. Multi-hash
    /// definitions accept a prefix of their paths; hash definitions need one
    /// component per path.
    pub fn effective_partition_key(
        &self,
        key: &PartitionKey,
    ) -> Result<EffectivePartitionKey, EpkError> {
        self.validate()?;
        self.compute_validated(key)
    }

    /// Count check and algorithm dispatch for an already validated
    /// definition.
    fn compute_validated(&self, key: &PartitionKey) -> Result<EffectivePartitionKey, EpkError> {
        let components = key.components();
        if components.is_empty() {
            return Ok(EffectivePartitionKey::min());
        }

        let expected = self.paths.len();
        let actual = components.len();
        let count_ok = match self.kind {
            PartitionKind::Hash => actual == expected,
            PartitionKind::MultiHash => actual <= expected,
        };
        if !count_ok {
            return Err(EpkError::ComponentCountMismatch { expected, actual });
        }

        Ok(match (self.kind, self.version) {
            (PartitionKind::Hash, PartitionKeyVersion::V1) => compute_v1(components),
            (PartitionKind::Hash, PartitionKeyVersion::V2) => compute_v2_hash(components),
            (PartitionKind::MultiHash, _) => compute_v2_multi_hash(components),
        })
    }

    /// Range of the key space owned by `key`: everything when empty,
    /// otherwise every EPK starting with the key's own.
    pub fn feed_range(&self, key: &PartitionKey) -> Result<FeedRange, EpkError> {
        if key.is_empty() {
            self.validate()?;
            return Ok(FeedRange::full());
        }
        let epk = self.effective_partition_key(key)?;
        Ok(FeedRange::for_prefix(&epk))
    }

    /// EPKs for many keys, in input order. Runs on the rayon pool with the
    /// `parallel` feature.
    pub fn compute_batch(
        &self,
        keys: &[PartitionKey],
    ) -> Result<Vec<EffectivePartitionKey>, EpkError> {
        self.validate()?;
        debug!(keys = keys.len(), kind = %self.kind, "computing effective partition keys");

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            keys.par_iter()
                .map(|k| self.compute_validated(k))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            keys.iter().map(|k| self.compute_validated(k)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epk::EPK_HEX_LEN;

    fn tenant_user_session() -> PartitionKeyDefinition {
        PartitionKeyDefinition::multi_hash(["/tenantId", "/userId", "/sessionId"])
    }

    #[test]
    fn default_is_v2_hash_on_id() {
        let def = PartitionKeyDefinition::default();
        assert_eq!(def.paths, ["/id"]);
        assert_eq!(def.kind, PartitionKind::Hash);
        assert_eq!(def.version, PartitionKeyVersion::V2);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn dispatches_on_kind_and_version() {
        let key = PartitionKey::from("a");

        let v1 = PartitionKeyDefinition::hash("/pk").with_version(PartitionKeyVersion::V1);
        assert_eq!(
            v1.effective_partition_key(&key).unwrap(),
            compute_v1(key.components())
        );

        let v2 = PartitionKeyDefinition::hash("/pk");
        assert_eq!(
            v2.effective_partition_key(&key).unwrap(),
            compute_v2_hash(key.components())
        );

        let multi = tenant_user_session();
        let full = PartitionKey::from("a").append_string("b").append_number(3.0);
        assert_eq!(
            multi.effective_partition_key(&full).unwrap(),
            compute_v2_multi_hash(full.components())
        );
    }

    #[test]
    fn multi_hash_prefix_is_prefix_of_full_epk() {
        let def = tenant_user_session();
        let prefix = PartitionKey::from("contoso").append_string("alice");
        let full = prefix.clone().append_string("s-1");

        let prefix_epk = def.effective_partition_key(&prefix).unwrap();
        let full_epk = def.effective_partition_key(&full).unwrap();
        assert_eq!(prefix_epk.len(), 2 * EPK_HEX_LEN);
        assert!(full_epk.as_str().starts_with(prefix_epk.as_str()));
        assert!(def.feed_range(&prefix).unwrap().contains(&full_epk));
    }

    #[test]
    fn feed_ranges_cover_keys_starting_with_ff() {
        let def = PartitionKeyDefinition::hash("/pk");
        let epk = def.effective_partition_key(&PartitionKey::from("k690")).unwrap();
        assert_eq!(epk, "FF6A202A829C4D25DA8E069C90FC4D4B");
        assert!(def.feed_range(&PartitionKey::new()).unwrap().contains(&epk));

        let def = tenant_user_session();
        let parent = PartitionKey::from("t");
        let child = parent.clone().append_string("s438");
        let parent_epk = def.effective_partition_key(&parent).unwrap();
        let child_epk = def.effective_partition_key(&child).unwrap();
        assert_eq!(parent_epk, "7B310042FC8EA24E4CB78FD8BFEDBAA7");
        assert_eq!(&child_epk.as_str()[EPK_HEX_LEN..EPK_HEX_LEN + 2], "FF");
        let range = def.feed_range(&parent).unwrap();
        assert_eq!(range.max_exclusive(), Some("7B310042FC8EA24E4CB78FD8BFEDBAA8"));
        assert!(range.contains(&child_epk));
    }

    #[test]
    fn too_many_components() {
        let def = PartitionKeyDefinition::hash("/pk");
        let key = PartitionKey::from("a").append_string("b");
        assert!(matches!(
            def.effective_partition_key(&key),
            Err(EpkError::ComponentCountMismatch { expected: 1, actual: 2 })
        ));

        let def = tenant_user_session();
        let key = PartitionKey::from("a")
            .append_string("b")
            .append_string("c")
            .append_string("d");
        assert!(def.effective_partition_key(&key).is_err());
    }

    #[test]
    fn empty_key_maps_to_min_and_full_range() {
        let def = tenant_user_session();
        let empty = PartitionKey::new();
        assert_eq!(
            def.effective_partition_key(&empty).unwrap(),
            EffectivePartitionKey::min()
        );
        assert_eq!(def.feed_range(&empty).unwrap(), FeedRange::full());
    }

    #[test]
    fn invalid_definitions() {
        let no_paths = PartitionKeyDefinition {
            paths: vec![],
            ..Default::default()
        };
        assert!(matches!(no_paths.validate(), Err(EpkError::EmptyPaths)));

        let v1_multi = tenant_user_session().with_version(PartitionKeyVersion::V1);
        let err = v1_multi
            .effective_partition_key(&PartitionKey::from("a"))
            .unwrap_err();
        assert!(matches!(
            err,
            EpkError::UnsupportedVersion {
                kind: PartitionKind::MultiHash,
                version: 1
            }
        ));
        assert_eq!(
            err.to_string(),
            "MultiHash partition keys do not support version 1"
        );
    }

    #[test]
    fn batch_preserves_order() {
        let def = PartitionKeyDefinition::hash("/pk");
        let keys: Vec<PartitionKey> = (0..64i64).map(PartitionKey::from).collect();
        let batch = def.compute_batch(&keys).unwrap();
        assert_eq!(batch.len(), keys.len());
        for (key, epk) in keys.iter().zip(&batch) {
            assert_eq!(&def.effective_partition_key(key).unwrap(), epk);
        }
    }

    #[test]
    fn batch_fails_on_first_bad_key() {
        let def = PartitionKeyDefinition::hash("/pk");
        let keys = vec![
            PartitionKey::from("ok"),
            PartitionKey::from("a").append_string("b"),
        ];
        assert!(def.compute_batch(&keys).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn container_json_shape() {
        let def: PartitionKeyDefinition = serde_json::from_str(
            r#"{"paths":["/tenantId","/userId"],"kind":"MultiHash","version":2}"#,
        )
        .unwrap();
        assert_eq!(def.kind, PartitionKind::MultiHash);
        assert_eq!(def.version, PartitionKeyVersion::V2);

        // omitted kind/version: legacy hash container
        let legacy: PartitionKeyDefinition =
            serde_json::from_str(r#"{"paths":["/pk"]}"#).unwrap();
        assert_eq!(legacy.kind, PartitionKind::Hash);
        assert_eq!(legacy.version, PartitionKeyVersion::V1);

        let json = serde_json::to_value(PartitionKeyDefinition::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"paths": ["/id"], "kind": "Hash", "version": 2})
        );

        assert!(
            serde_json::from_str::<PartitionKeyDefinition>(r#"{"paths":["/pk"],"version":3}"#)
                .is_err()
        );
    }
}
