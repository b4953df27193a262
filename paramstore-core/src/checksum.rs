//! Fletcher-16 checksum for parameter record validation
//!
//! Both running sums are reduced modulo 255 and the result is packed as
//! `(sum2 << 8) | sum1`. The same routine validates records on load and
//! seals them on write; changing it invalidates every persisted record.

/// Modulus for both running sums
const MODULUS: u16 = 255;

/// Calculate the Fletcher-16 checksum of a byte slice
///
/// # Example
///
/// ```
/// use paramstore_core::checksum::fletcher16;
///
/// assert_eq!(fletcher16(b"abcde"), 0xC8F0);
/// ```
#[inline]
#[must_use]
pub fn fletcher16(data: &[u8]) -> u16 {
    let mut digest = Fletcher16::new();
    digest.update(data);
    digest.finish()
}

/// Fletcher-16 digest for incremental calculation
///
/// Feeding the data in several `update` calls yields the same checksum as
/// a single call to [`fletcher16`] over the concatenation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fletcher16 {
    sum1: u16,
    sum2: u16,
}

impl Fletcher16 {
    /// Create a new digest with both sums cleared
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { sum1: 0, sum2: 0 }
    }

    /// Update the digest with a byte slice
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.sum1 = (self.sum1 + byte as u16) % MODULUS;
            self.sum2 = (self.sum2 + self.sum1) % MODULUS;
        }
    }

    /// Return the checksum of everything fed so far
    #[inline]
    #[must_use]
    pub const fn finish(&self) -> u16 {
        (self.sum2 << 8) | self.sum1
    }

    /// Clear both sums
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fletcher16_known_values() {
        let test_cases = [
            (b"" as &[u8], 0x0000u16),
            (b"abcde", 0xC8F0),
            (b"abcdef", 0x2057),
            (b"abcdefgh", 0x0627),
        ];

        for (data, expected) in test_cases {
            assert_eq!(
                fletcher16(data),
                expected,
                "checksum mismatch for '{}'",
                core::str::from_utf8(data).unwrap()
            );
        }
    }

    #[test]
    fn test_fletcher16_zeroed_record() {
        // "BFS" followed by four zeroed f32 parameters
        let mut record = [0u8; 19];
        record[..3].copy_from_slice(b"BFS");
        assert_eq!(fletcher16(&record), 0x64DB);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = b"Parameter storage checksum";
        let mut digest = Fletcher16::new();
        digest.update(&data[..7]);
        digest.update(&data[7..]);
        assert_eq!(digest.finish(), fletcher16(data));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut digest = Fletcher16::new();
        digest.update(b"stale");
        digest.reset();
        digest.update(b"abcde");
        assert_eq!(digest.finish(), 0xC8F0);
    }

    #[test]
    fn test_sums_stay_below_modulus() {
        let checksum = fletcher16(&[0xFFu8; 64]);
        assert!((checksum & 0xFF) < 255);
        assert!((checksum >> 8) < 255);
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..128),
            byte in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let original = fletcher16(&data);
            let mut corrupted = data.clone();
            let idx = byte.index(corrupted.len());
            corrupted[idx] ^= 1 << bit;
            prop_assert_ne!(fletcher16(&corrupted), original);
        }

        #[test]
        fn prop_split_point_irrelevant(
            data in proptest::collection::vec(any::<u8>(), 0..128),
            split in any::<prop::sample::Index>(),
        ) {
            let at = if data.is_empty() { 0 } else { split.index(data.len() + 1) };
            let mut digest = Fletcher16::new();
            digest.update(&data[..at]);
            digest.update(&data[at..]);
            prop_assert_eq!(digest.finish(), fletcher16(&data));
        }
    }
}
