/// `low` then `high` as little-endian bytes, then the whole buffer reversed.
#[inline]
pub(crate) fn hash128_bytes(low: u64, high: u64) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[..8].copy_from_slice(&low.to_le_bytes());
    buf[8..].copy_from_slice(&high.to_le_bytes());
    buf.reverse();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_half_leads_after_reversal() {
        let bytes = hash128_bytes(0x0807_0605_0403_0201, 0x100f_0e0d_0c0b_0a09);
        assert_eq!(
            bytes,
            [16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]
        );
    }
}
