//! Unsigned LEB128-style varints
//!
//! Format:
//! - 7 payload bits per byte, least-significant group first
//! - High bit set on every byte except the last (continuation)
//! - At least one byte, even for zero
//! - At most 10 bytes for a u64

use thiserror::Error;

/// Longest encoding of a u64 (ceil(64 / 7))
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Varint decoding failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarintError {
    /// Input ended before a byte without the continuation bit
    #[error("varint truncated after {consumed} bytes")]
    Truncated {
        /// Bytes examined before input ran out
        consumed: usize,
    },
    /// Encoding does not fit in 64 bits
    #[error("varint exceeds 64 bits")]
    Overflow,
}

/// Encodes `value` into `out`, returning the number of bytes used.
pub fn encode(mut value: u64, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    while value >= u64::from(CONTINUATION) {
        out[i] = (value as u8) | CONTINUATION;
        value >>= 7;
        i += 1;
    }
    out[i] = value as u8;
    i + 1
}

/// Returns the encoded length of `value` without encoding it.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}

/// Decodes a varint from the front of `input`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(input: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut result: u64 = 0;

    for (i, &byte) in input.iter().take(MAX_VARINT_LEN).enumerate() {
        // The 10th byte may only carry the single remaining bit
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(VarintError::Overflow);
        }

        result |= u64::from(byte & PAYLOAD_MASK) << (7 * i);

        if byte & CONTINUATION == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(VarintError::Truncated {
        consumed: input.len().min(MAX_VARINT_LEN),
    })
}

/// Encodes `value` into a freshly allocated vector.
pub fn encode_to_vec(value: u64) -> Vec<u8> {
    let mut tmp = [0u8; MAX_VARINT_LEN];
    let len = encode(value, &mut tmp);
    tmp[..len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_boundaries() {
        let cases: [(u64, usize); 7] = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16383, 2),
            (16384, 3),
            ((1 << 63) - 1, 9),
            (u64::MAX, 10),
        ];

        for (value, expected) in cases {
            assert_eq!(encode_to_vec(value).len(), expected, "value {}", value);
            assert_eq!(encoded_len(value), expected, "value {}", value);
        }
    }

    #[test]
    fn test_zero_is_single_byte() {
        assert_eq!(encode_to_vec(0), vec![0x00]);
    }

    #[test]
    fn test_known_encoding() {
        assert_eq!(encode_to_vec(300), vec![0xAC, 0x02]);
    }

    #[test]
    fn test_decode_reports_consumed() {
        let mut bytes = encode_to_vec(16383);
        bytes.push(0xFF);
        assert_eq!(decode(&bytes), Ok((16383, 2)));
    }

    #[test]
    fn test_decode_max() {
        let bytes = encode_to_vec(u64::MAX);
        assert_eq!(decode(&bytes), Ok((u64::MAX, 10)));
    }

    #[test]
    fn test_truncated_continuation() {
        assert_eq!(decode(&[0x80]), Err(VarintError::Truncated { consumed: 1 }));
        assert_eq!(decode(&[0xFF, 0xFF]), Err(VarintError::Truncated { consumed: 2 }));
    }

    #[test]
    fn test_empty_input_is_truncated() {
        assert_eq!(decode(&[]), Err(VarintError::Truncated { consumed: 0 }));
    }

    #[test]
    fn test_overflow_rejected() {
        let too_long = [0xFF; 11];
        assert_eq!(decode(&too_long), Err(VarintError::Overflow));

        // 10th byte carrying more than one bit
        let mut wide = [0xFF; 10];
        wide[9] = 0x02;
        assert_eq!(decode(&wide), Err(VarintError::Overflow));
    }
}
