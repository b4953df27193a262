//! Parameter record codec
//!
//! Record layout (offsets relative to the start of the storage region):
//! - MAGIC (3 bytes): `B F S`
//! - PARAMS (4×N bytes): IEEE-754 `f32`, little-endian, parameter `i` at `3 + 4i`
//! - CHECKSUM (2 bytes): Fletcher-16 of MAGIC + PARAMS, big-endian
//!
//! The codec only converts between bytes and values; it never touches the
//! storage device.

use heapless::Vec;

use crate::checksum::fletcher16;

/// Magic bytes marking an initialized record
pub const MAGIC_HEADER: [u8; 3] = *b"BFS";

/// Header size in bytes
pub const HEADER_LEN: usize = MAGIC_HEADER.len();

/// Size of one persisted parameter in bytes
pub const PARAM_SIZE: usize = core::mem::size_of::<f32>();

/// Checksum size in bytes
pub const CHECKSUM_LEN: usize = core::mem::size_of::<u16>();

/// Maximum number of parameters in one record
pub const MAX_PARAMS: usize = 64;

/// Largest record the codec can produce
pub const MAX_RECORD_LEN: usize = record_len(MAX_PARAMS);

/// Record bytes, sized for the largest supported record
pub type RecordBytes = Vec<u8, MAX_RECORD_LEN>;

/// Classification of a record read back from storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordStatus {
    /// Header does not match; region was never initialized
    Uninitialized,
    /// Header matches but the checksum does not
    Corrupted,
    /// Header and checksum both match
    Valid,
}

/// Compile-time bound on the parameter count
struct ParamCount<const N: usize>;

impl<const N: usize> ParamCount<N> {
    const FITS: () = assert!(
        N > 0 && N <= MAX_PARAMS,
        "parameter count must be between 1 and MAX_PARAMS"
    );
}

/// Assert at compile time that `N` parameters fit in a record
pub(crate) const fn assert_param_count<const N: usize>() {
    #[allow(clippy::let_unit_value)]
    let () = ParamCount::<N>::FITS;
}

/// Total record size for `param_count` parameters
pub const fn record_len(param_count: usize) -> usize {
    payload_len(param_count) + CHECKSUM_LEN
}

/// Size of the checksummed span (header + parameters)
pub const fn payload_len(param_count: usize) -> usize {
    HEADER_LEN + param_count * PARAM_SIZE
}

/// Byte offset of parameter `index` within the record
pub const fn param_offset(index: usize) -> usize {
    HEADER_LEN + index * PARAM_SIZE
}

/// Byte offset of the checksum within the record
pub const fn checksum_offset(param_count: usize) -> usize {
    payload_len(param_count)
}

/// Encode the header followed by all parameters (no checksum)
pub fn encode_header_and_params<const N: usize>(params: &[f32; N]) -> RecordBytes {
    assert_param_count::<N>();

    let mut bytes = RecordBytes::new();
    // Capacity is guaranteed by the parameter count bound
    let _ = bytes.extend_from_slice(&MAGIC_HEADER);
    for value in params {
        let _ = bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Encode a complete record with a freshly computed checksum
pub fn encode_record<const N: usize>(params: &[f32; N]) -> RecordBytes {
    let mut bytes = encode_header_and_params(params);
    let checksum = fletcher16(&bytes);
    let _ = bytes.extend_from_slice(&checksum.to_be_bytes());
    bytes
}

/// Decode the parameter array from record bytes
///
/// Only meaningful after the record has been classified as [`RecordStatus::Valid`].
/// Parameters missing from a short buffer decode as zero.
pub fn decode_params<const N: usize>(bytes: &[u8]) -> [f32; N] {
    let mut params = [0.0f32; N];
    let body = bytes.get(HEADER_LEN..).unwrap_or(&[]);
    for (value, chunk) in params.iter_mut().zip(body.chunks_exact(PARAM_SIZE)) {
        *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    params
}

/// Check whether the record starts with the magic header
pub fn is_header_valid(bytes: &[u8]) -> bool {
    bytes.get(..HEADER_LEN) == Some(&MAGIC_HEADER[..])
}

/// Checksum stored in the record, if the buffer is long enough
pub fn stored_checksum(bytes: &[u8], param_count: usize) -> Option<u16> {
    let offset = checksum_offset(param_count);
    match bytes.get(offset..offset + CHECKSUM_LEN) {
        Some(&[hi, lo]) => Some(u16::from_be_bytes([hi, lo])),
        _ => None,
    }
}

/// Checksum computed over the header and parameters in the record
pub fn compute_checksum(bytes: &[u8], param_count: usize) -> Option<u16> {
    bytes.get(..payload_len(param_count)).map(fletcher16)
}

/// Classify record bytes read back from storage
pub fn classify(bytes: &[u8], param_count: usize) -> RecordStatus {
    if !is_header_valid(bytes) {
        return RecordStatus::Uninitialized;
    }

    match (
        compute_checksum(bytes, param_count),
        stored_checksum(bytes, param_count),
    ) {
        (Some(computed), Some(stored)) if computed == stored => RecordStatus::Valid,
        _ => RecordStatus::Corrupted,
    }
}

/// Overwrite parameter `index` in a record image
///
/// Returns `false` (leaving the image untouched) if the field lies outside it.
pub fn write_param(bytes: &mut [u8], index: usize, value: f32) -> bool {
    let offset = param_offset(index);
    match bytes.get_mut(offset..offset + PARAM_SIZE) {
        Some(field) => {
            field.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}

/// Recompute the checksum of a record image and store it in place
///
/// Returns the new checksum, or `None` if the image is too short.
pub fn seal(bytes: &mut [u8], param_count: usize) -> Option<u16> {
    let checksum = compute_checksum(bytes, param_count)?;
    let offset = checksum_offset(param_count);
    let field = bytes.get_mut(offset..offset + CHECKSUM_LEN)?;
    field.copy_from_slice(&checksum.to_be_bytes());
    Some(checksum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_offsets() {
        assert_eq!(record_len(4), 3 + 16 + 2);
        assert_eq!(param_offset(0), 3);
        assert_eq!(param_offset(2), 11);
        assert_eq!(checksum_offset(4), 19);
        assert_eq!(MAX_RECORD_LEN, 3 + 4 * MAX_PARAMS + 2);
    }

    #[test]
    fn test_encode_header_and_params() {
        let bytes = encode_header_and_params(&[0.0, 0.0, 3.5, 0.0]);

        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[..3], b"BFS");
        // 3.5f32 = 0x40600000, little-endian
        assert_eq!(&bytes[11..15], &[0x00, 0x00, 0x60, 0x40]);
    }

    #[test]
    fn test_encode_record_checksum_big_endian() {
        let bytes = encode_record(&[0.0f32; 4]);

        assert_eq!(bytes.len(), record_len(4));
        assert_eq!(&bytes[19..], &[0x64, 0xDB]);
        assert_eq!(stored_checksum(&bytes, 4), Some(0x64DB));
        assert_eq!(classify(&bytes, 4), RecordStatus::Valid);
    }

    #[test]
    fn test_header_validation() {
        assert!(is_header_valid(b"BFS\x00"));
        assert!(!is_header_valid(b"BFT\x00"));
        assert!(!is_header_valid(b"BF"));
        assert!(!is_header_valid(&[0u8; 21]));
    }

    #[test]
    fn test_classify_blank_device() {
        assert_eq!(classify(&[0x00; 21], 4), RecordStatus::Uninitialized);
        assert_eq!(classify(&[0xFF; 21], 4), RecordStatus::Uninitialized);
    }

    #[test]
    fn test_classify_bad_checksum() {
        let mut bytes = encode_record(&[1.0, 2.0, 3.0, 4.0]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_eq!(classify(&bytes, 4), RecordStatus::Corrupted);
    }

    #[test]
    fn test_classify_truncated_record() {
        let bytes = encode_record(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(classify(&bytes[..10], 4), RecordStatus::Corrupted);
    }

    #[test]
    fn test_write_param_and_seal() {
        let mut bytes = encode_record(&[0.0f32; 4]);

        assert!(write_param(&mut bytes, 2, 3.5));
        assert_eq!(classify(&bytes, 4), RecordStatus::Corrupted);

        assert_eq!(seal(&mut bytes, 4), Some(0xE77C));
        assert_eq!(classify(&bytes, 4), RecordStatus::Valid);
        assert_eq!(decode_params::<4>(&bytes), [0.0, 0.0, 3.5, 0.0]);
    }

    #[test]
    fn test_write_param_outside_image() {
        let mut bytes = encode_record(&[0.0f32; 4]);
        let before = bytes.clone();
        assert!(!write_param(&mut bytes, 5, 1.0));
        assert_eq!(bytes, before);
    }

    #[test]
    fn test_decode_short_buffer() {
        let bytes = encode_header_and_params(&[1.5f32, 2.5]);
        assert_eq!(decode_params::<4>(&bytes), [1.5, 2.5, 0.0, 0.0]);
        assert_eq!(decode_params::<4>(b"BF"), [0.0; 4]);
    }

    proptest! {
        #[test]
        fn prop_record_roundtrip(params in proptest::array::uniform8(any::<f32>())) {
            let bytes = encode_record(&params);
            prop_assert_eq!(classify(&bytes, 8), RecordStatus::Valid);

            let decoded = decode_params::<8>(&bytes);
            for (a, b) in params.iter().zip(decoded.iter()) {
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }
        }

        #[test]
        fn prop_bit_flip_in_payload_detected(
            params in proptest::array::uniform8(any::<f32>()),
            byte in 0usize..payload_len(8),
            bit in 0u8..8,
        ) {
            let mut bytes = encode_record(&params);
            bytes[byte] ^= 1 << bit;

            let status = classify(&bytes, 8);
            if byte < HEADER_LEN {
                prop_assert_eq!(status, RecordStatus::Uninitialized);
            } else {
                prop_assert_eq!(status, RecordStatus::Corrupted);
            }
        }
    }
}
