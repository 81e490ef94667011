//! MurmurHash3 x86_32 and x64_128 (Austin Appleby), as used by the
//! effective partition key schemes.
//!
//! Both functions are pure and wrap on every arithmetic step.

const C1_32: u32 = 0xcc9e_2d51;
const C2_32: u32 = 0x1b87_3593;

const C1_128: u64 = 0x87c3_7b91_1142_53d5;
const C2_128: u64 = 0x4cf5_ad43_2745_937f;

/// 32-bit MurmurHash3 (x86 variant).
pub fn murmurhash3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        h ^= mix_k1_32(le_u32(block));
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        h ^= mix_k1_32(le_u32(tail));
    }

    // The reference hashes lengths as a 32-bit int.
    h ^= data.len() as u32;
    fmix32(h)
}

/// 128-bit MurmurHash3 (x64 variant). Returns `(h1, h2)`, i.e. the low and
/// high 64-bit halves.
pub fn murmurhash3_128(data: &[u8], seed_low: u64, seed_high: u64) -> (u64, u64) {
    let mut h1 = seed_low;
    let mut h2 = seed_high;

    let mut blocks = data.chunks_exact(16);
    for block in &mut blocks {
        let (lo, hi) = block.split_at(8);

        // k1 must be fully folded into h1 before k2 touches h2.
        h1 ^= mix_k1_128(le_u64(lo));
        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        h2 ^= mix_k2_128(le_u64(hi));
        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    // Tail: k2 from offsets 8..15, then k1 from offsets 0..8. Only bytes that
    // exist contribute.
    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2_128(le_u64(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1_128(le_u64(&tail[..tail.len().min(8)]));
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

#[inline]
fn mix_k1_32(k: u32) -> u32 {
    k.wrapping_mul(C1_32).rotate_left(15).wrapping_mul(C2_32)
}

#[inline]
fn mix_k1_128(k: u64) -> u64 {
    k.wrapping_mul(C1_128).rotate_left(31).wrapping_mul(C2_128)
}

#[inline]
fn mix_k2_128(k: u64) -> u64 {
    k.wrapping_mul(C2_128).rotate_left(33).wrapping_mul(C1_128)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

#[inline]
fn fmix64(mut v: u64) -> u64 {
    v ^= v >> 33;
    v = v.wrapping_mul(0xff51_afd7_ed55_8ccd);
    v ^= v >> 33;
    v = v.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    v ^ (v >> 33)
}

/// Little-endian load of up to 4 bytes; missing high bytes read as zero.
#[inline]
fn le_u32(bytes: &[u8]) -> u32 {
    debug_assert!(bytes.len() <= 4);
    bytes
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Little-endian load of up to 8 bytes; missing high bytes read as zero.
#[inline]
fn le_u64(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
