//! Little-Endian Base 128 decoding of the signed and unsigned integers used by the binary format.

mod errors;

pub use errors::LEB128Error;

use std::mem::size_of;

/// The radix (i.e. base) for LEB128 encoding.
const RADIX: u8 = 128;

/// The number of bits per LEB128 encoding group.
const GROUP_BITS: usize = 7;

/// The zero-indexed position of the sign bit in the final group of a signed encoding.
const SIGN_BIT: u8 = 0x40;

/// Maximum size (in bytes) of an LEB128-encoded integer of the given bit width.
///
/// See <https://en.wikipedia.org/wiki/LEB128>
const fn max_encoded_size(bits: usize) -> usize {
    (bits / GROUP_BITS) + (bits % GROUP_BITS != 0) as usize
}

/// Decodes an unsigned integer of the given bit width.
/// Returns the value and the number of bytes consumed.
/// Encodings longer than the width permits and final groups with bits beyond the width are rejected.
fn decode_unsigned(input: &[u8], bits: usize) -> Result<(u128, usize), LEB128Error> {
    let max_size = max_encoded_size(bits);
    let mut result = 0u128;

    for (index, &byte) in input.iter().enumerate() {
        if index >= max_size {
            return Err(LEB128Error::Overlong(index + 1, max_size));
        }

        let group = (byte & !RADIX) as u128;

        result |= group << (index * GROUP_BITS);

        if byte & RADIX == 0 {
            if bits < 128 && result >> bits != 0 {
                return Err(LEB128Error::ExcessBits);
            }

            return Ok((result, index + 1));
        }
    }

    Err(LEB128Error::Unterminated)
}

/// Decodes a signed (two's complement) integer of the given bit width.
/// Returns the value and the number of bytes consumed.
fn decode_signed(input: &[u8], bits: usize) -> Result<(i128, usize), LEB128Error> {
    let max_size = max_encoded_size(bits);
    let mut result = 0i128;

    for (index, &byte) in input.iter().enumerate() {
        if index >= max_size {
            return Err(LEB128Error::Overlong(index + 1, max_size));
        }

        let group = (byte & !RADIX) as i128;

        result |= group << (index * GROUP_BITS);

        if byte & RADIX == 0 {
            if byte & SIGN_BIT != 0 {
                result |= !0 << ((index + 1) * GROUP_BITS);
            }

            if bits < 128 && (result < -(1 << (bits - 1)) || result >= 1 << (bits - 1)) {
                return Err(LEB128Error::ExcessBits);
            }

            return Ok((result, index + 1));
        }
    }

    Err(LEB128Error::Unterminated)
}

/// Decodes an unsigned 32-bit integer, returning the value and the number of bytes consumed.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub fn decode_u32(input: &[u8]) -> Result<(u32, usize), LEB128Error> {
    decode_unsigned(input, u32::BITS as usize).map(|(value, length)| (value as u32, length))
}

/// Decodes an unsigned 64-bit integer, returning the value and the number of bytes consumed.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub fn decode_u64(input: &[u8]) -> Result<(u64, usize), LEB128Error> {
    decode_unsigned(input, u64::BITS as usize).map(|(value, length)| (value as u64, length))
}

/// Decodes a signed 32-bit integer, returning the value and the number of bytes consumed.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub fn decode_s32(input: &[u8]) -> Result<(i32, usize), LEB128Error> {
    decode_signed(input, size_of::<i32>() * 8).map(|(value, length)| (value as i32, length))
}

/// Decodes a signed 64-bit integer, returning the value and the number of bytes consumed.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub fn decode_s64(input: &[u8]) -> Result<(i64, usize), LEB128Error> {
    decode_signed(input, size_of::<i64>() * 8).map(|(value, length)| (value as i64, length))
}

/// Decodes the signed 33-bit integer used by block types,
/// returning the value and the number of bytes consumed.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#control-instructions>
pub fn decode_s33(input: &[u8]) -> Result<(i64, usize), LEB128Error> {
    decode_signed(input, 33).map(|(value, length)| (value as i64, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_unsigned_large() {
        let input = vec![0xE5, 0x8E, 0x26];

        assert_eq!(decode_u32(input.as_slice()), Ok((624485, 3)));
    }

    #[test]
    fn decode_unsigned_small() {
        let input = vec![64, 0xFF];

        assert_eq!(decode_u32(input.as_slice()), Ok((64, 1)));
    }

    #[test]
    fn decode_unsigned_zero() {
        let input = vec![0x00, 0xFF];

        assert_eq!(decode_u32(input.as_slice()), Ok((0, 1)));
    }

    #[test]
    fn decode_unsigned_max() {
        let input = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F];

        assert_eq!(decode_u32(input.as_slice()), Ok((u32::MAX, 5)));
    }

    #[test]
    fn decode_unsigned_overlong() {
        let input = vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x00];

        assert_eq!(
            decode_u32(input.as_slice()),
            Err(LEB128Error::Overlong(6, 5))
        );
    }

    #[test]
    fn decode_unsigned_excess_bits() {
        let input = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x1F];

        assert_eq!(decode_u32(input.as_slice()), Err(LEB128Error::ExcessBits));
    }

    #[test]
    fn decode_unsigned_unterminated() {
        let input = vec![0x80, 0x80];

        assert_eq!(
            decode_u32(input.as_slice()),
            Err(LEB128Error::Unterminated)
        );
    }

    #[test]
    fn decode_unsigned_64_max() {
        let input = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];

        assert_eq!(decode_u64(input.as_slice()), Ok((u64::MAX, 10)));
    }

    #[test]
    fn decode_signed_negative() {
        let input = vec![0xC0, 0xBB, 0x78];

        assert_eq!(decode_s32(input.as_slice()), Ok((-123456, 3)));
    }

    #[test]
    fn decode_signed_small() {
        let input = vec![32, 0xFF];

        assert_eq!(decode_s32(input.as_slice()), Ok((32, 1)));
    }

    #[test]
    fn decode_signed_minus_one() {
        let input = vec![0x7F];

        assert_eq!(decode_s64(input.as_slice()), Ok((-1, 1)));
    }

    #[test]
    fn decode_signed_min() {
        let input = vec![0x80, 0x80, 0x80, 0x80, 0x78];

        assert_eq!(decode_s32(input.as_slice()), Ok((i32::MIN, 5)));
    }

    #[test]
    fn decode_signed_excess_bits() {
        let input = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x3F];

        assert_eq!(decode_s32(input.as_slice()), Err(LEB128Error::ExcessBits));
    }

    #[test]
    fn decode_signed_64_min() {
        let input = vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7F];

        assert_eq!(decode_s64(input.as_slice()), Ok((i64::MIN, 10)));
    }

    #[test]
    fn decode_s33_type_index() {
        let input = vec![0x84, 0x01];

        assert_eq!(decode_s33(input.as_slice()), Ok((132, 2)));
    }

    #[test]
    fn decode_s33_out_of_range() {
        let input = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x1F];

        assert_eq!(decode_s33(input.as_slice()), Err(LEB128Error::ExcessBits));
    }
}
