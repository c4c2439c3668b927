use crate::leb128::{self, LEB128Error};
use crate::parser::errors::{DecodeErrorKind, SyntaxError};
use crate::Name;
use nom::number::complete::{le_f32, le_f64};
use nom::IResult;

/// The input to every parser in this module: the bytes not yet decoded.
pub(crate) type Input<'input> = &'input [u8];

/// The result of every parser in this module.
pub(crate) type ParseResult<'input, O> = IResult<Input<'input>, O, SyntaxError<'input>>;

/// Fails the current parser with the given error kind, anchored at the given input position.
pub(crate) fn fail<O>(input: Input, kind: DecodeErrorKind) -> ParseResult<O> {
    Err(nom::Err::Error(SyntaxError { input, kind }))
}

/// Parses a single byte.
pub(crate) fn parse_byte(input: Input) -> ParseResult<u8> {
    match input.split_first() {
        Some((&byte, remaining)) => Ok((remaining, byte)),
        None => fail(input, DecodeErrorKind::UnexpectedEof),
    }
}

/// Parses a single byte and verifies that it matches the given byte,
/// failing with the given error kind otherwise.
pub(crate) fn match_byte(
    byte: u8,
    kind: DecodeErrorKind,
) -> impl Fn(Input) -> ParseResult<u8> {
    move |input| match input.split_first() {
        Some((&actual, remaining)) if actual == byte => Ok((remaining, actual)),
        Some(_) => fail(input, kind),
        None => fail(input, DecodeErrorKind::UnexpectedEof),
    }
}

/// Takes the given number of bytes from the input.
pub(crate) fn take_bytes(length: usize) -> impl Fn(Input) -> ParseResult<Input> {
    move |input| {
        if input.len() < length {
            fail(input, DecodeErrorKind::UnexpectedEof)
        } else {
            let (bytes, remaining) = input.split_at(length);
            Ok((remaining, bytes))
        }
    }
}

fn leb_failure<O>(input: Input, error: LEB128Error) -> ParseResult<O> {
    match error {
        LEB128Error::Unterminated => fail(input, DecodeErrorKind::UnexpectedEof),
        LEB128Error::Overlong(..) | LEB128Error::ExcessBits => {
            fail(input, DecodeErrorKind::BadLeb)
        }
    }
}

/// Parses an unsigned 32-bit integer in LEB128 (Little-Endian Base 128) encoding.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn parse_u32(input: Input) -> ParseResult<u32> {
    match leb128::decode_u32(input) {
        Ok((value, length)) => Ok((&input[length..], value)),
        Err(error) => leb_failure(input, error),
    }
}

/// Parses a signed 32-bit integer in LEB128 encoding.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn parse_s32(input: Input) -> ParseResult<i32> {
    match leb128::decode_s32(input) {
        Ok((value, length)) => Ok((&input[length..], value)),
        Err(error) => leb_failure(input, error),
    }
}

/// Parses a signed 64-bit integer in LEB128 encoding.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn parse_s64(input: Input) -> ParseResult<i64> {
    match leb128::decode_s64(input) {
        Ok((value, length)) => Ok((&input[length..], value)),
        Err(error) => leb_failure(input, error),
    }
}

/// Parses the signed 33-bit integer used to encode block types.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#control-instructions>
pub(crate) fn parse_s33(input: Input) -> ParseResult<i64> {
    match leb128::decode_s33(input) {
        Ok((value, length)) => Ok((&input[length..], value)),
        Err(error) => leb_failure(input, error),
    }
}

/// Parses a little-endian IEEE 754 single-precision float.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#floating-point>
pub(crate) fn parse_f32(input: Input) -> ParseResult<f32> {
    le_f32(input)
}

/// Parses a little-endian IEEE 754 double-precision float.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#floating-point>
pub(crate) fn parse_f64(input: Input) -> ParseResult<f64> {
    le_f64(input)
}

/// Parses a WebAssembly name value.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#names>
pub(crate) fn parse_name(input: Input) -> ParseResult<Name> {
    let (remaining, bytes) = parse_byte_vector(input)?;

    match std::str::from_utf8(bytes) {
        Ok(name) => Ok((remaining, Name::from(name))),
        Err(_) => fail(input, DecodeErrorKind::BadUtf8),
    }
}

/// Parses a WebAssembly byte vector.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#bytes>
pub(crate) fn parse_byte_vector(input: Input) -> ParseResult<Input> {
    let (input, length) = parse_u32(input)?;

    take_bytes(length as usize)(input)
}

/// Parses a WebAssembly encoded vector of items from the input.
/// The initial allocation is capped so a hostile length cannot reserve unbounded memory
/// before any item bytes have been seen.
///
/// See <https://webassembly.github.io/spec/core/binary/conventions.html#vectors>
pub(crate) fn parse_vector<'input, O>(
    mut parser: impl FnMut(Input<'input>) -> ParseResult<'input, O>,
) -> impl FnMut(Input<'input>) -> ParseResult<'input, Vec<O>> {
    move |input| {
        let (mut input, length) = parse_u32(input)?;
        let mut items = Vec::with_capacity(length.min(1024) as usize);

        for _ in 0..length {
            let (remaining, item) = parser(input)?;

            items.push(item);
            input = remaining;
        }

        Ok((input, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unsigned_leb128_large() {
        let input = vec![0xE5, 0x8E, 0x26];
        let (remaining, actual) = parse_u32(input.as_slice()).unwrap();

        assert_eq!(actual, 624485);
        assert!(remaining.is_empty())
    }

    #[test]
    fn parse_unsigned_leb128_with_remaining() {
        let input = vec![64, 0xFF];
        let (remaining, actual) = parse_u32(input.as_slice()).unwrap();

        assert_eq!(actual, 64);
        assert_eq!(remaining, &[0xFF])
    }

    #[test]
    fn parse_name_with_remaining() {
        let name = "Hello, World!";
        let extra = 42;
        let mut input = Vec::from(name);
        input.insert(0, name.len() as u8);
        input.push(extra);

        let (remaining, parsed_name) = parse_name(input.as_slice()).unwrap();

        assert_eq!(parsed_name, Name::from(name));
        assert_eq!(remaining, &[extra]);
    }

    #[test]
    fn parse_name_rejects_invalid_utf8() {
        let input = vec![2, 0xC3, 0x28];

        assert!(parse_name(input.as_slice()).is_err());
    }

    #[test]
    fn parse_vector_with_remaining() {
        let extra = 9;
        let input = vec![3, 1, 2, 3, extra];

        let (remaining, items) = parse_vector(parse_byte)(input.as_slice()).unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(remaining, &[extra]);
    }

    #[test]
    fn parse_vector_with_missing_items() {
        let input = vec![3, 1];

        assert!(parse_vector(parse_byte)(input.as_slice()).is_err());
    }

    #[test]
    fn match_byte_matching() {
        let extra = 3;
        let byte = 42;
        let input = vec![byte, extra];

        let (remaining, actual) =
            match_byte(byte, DecodeErrorKind::BadOpcode)(input.as_slice()).unwrap();

        assert_eq!(actual, byte);
        assert_eq!(remaining, &[extra]);
    }

    #[test]
    fn match_byte_not_matching() {
        let input = vec![3];

        let result = match_byte(42, DecodeErrorKind::BadOpcode)(input.as_slice());

        assert!(result.is_err());
    }
}
