//! Seven-bit truncated-sum checksums.

/// Checksum value some vendors define as "always valid".
pub const WILDCARD: u8 = 0x7F;

/// Sum `data` in 8-bit arithmetic and keep the low 7 bits.
///
/// Callers pass only the data bytes: status bytes, IDs and location bytes are
/// never part of the sum.
pub fn sum7(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) & 0x7F
}

/// Check a frame's checksum byte against its data, honouring the wildcard.
pub fn verify_sum7(data: &[u8], checksum: u8) -> bool {
    checksum == WILDCARD || checksum == sum7(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_truncates() {
        assert_eq!(sum7(&[]), 0);
        assert_eq!(sum7(&[0x40, 0x40]), 0x00);
        assert_eq!(sum7(&[0x7F, 0x7F, 0x02]), 0x00);
        assert_eq!(sum7(&[0x10, 0x20, 0x05]), 0x35);
    }

    #[test]
    fn test_wildcard_always_accepted() {
        assert!(verify_sum7(&[1, 2, 3], 6));
        assert!(!verify_sum7(&[1, 2, 3], 7));
        assert!(verify_sum7(&[1, 2, 3], WILDCARD));
    }
}
