//! partition_epk — effective partition keys for hash-partitioned document stores.
//!
//! - Maps a logical partition key (one or more typed components) to the
//!   uppercase hex string that partition ranges are keyed by.
//! - V1: MurmurHash3 x86_32 per component. V2: MurmurHash3 x64_128 over the
//!   whole key (`Hash`) or per level (`MultiHash`).
//! - Pure and allocation-local; safe to call from any thread.

mod component;
mod definition;
mod epk;
pub mod murmur;
mod partition_key;
mod range;
mod util;

pub use component::{CANONICAL_NAN_BITS, PartitionKeyComponent, StringTerminator};
pub use definition::{PartitionKeyDefinition, PartitionKeyVersion, PartitionKind};
pub use epk::{
    EPK_HEX_LEN, EffectivePartitionKey, EpkError, compute_v1, compute_v2_hash,
    compute_v2_multi_hash, hash128_to_hex,
};
pub use partition_key::PartitionKey;
pub use range::FeedRange;
