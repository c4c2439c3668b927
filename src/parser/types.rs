use crate::parser::errors::DecodeErrorKind;
use crate::parser::values::{fail, match_byte, parse_byte, parse_u32, parse_vector, Input, ParseResult};
use crate::{FunctionType, GlobalType, Limit, MemoryType, Mutability, ResultType, TableType, ValueType};

/// The marker introducing a function type in the type section.
const FUNCTION_TYPE: u8 = 0x60;

/// The encoding of the funcref reference type,
/// the only reference type supported by this engine.
const FUNCTION_REFERENCE: u8 = 0x70;

/// Parses a WebAssembly value type from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#value-types>
pub(crate) fn parse_value_type(input: Input) -> ParseResult<ValueType> {
    let (remaining, byte) = parse_byte(input)?;

    match byte {
        0x7F => Ok((remaining, ValueType::I32)),
        0x7E => Ok((remaining, ValueType::I64)),
        0x7D => Ok((remaining, ValueType::F32)),
        0x7C => Ok((remaining, ValueType::F64)),
        FUNCTION_REFERENCE => Ok((remaining, ValueType::FunctionReference)),
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses a WebAssembly reference type from the input.
/// Only funcref is accepted.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#reference-types>
pub(crate) fn parse_reference_type(input: Input) -> ParseResult<()> {
    let (remaining, _) = match_byte(FUNCTION_REFERENCE, DecodeErrorKind::BadValueType)(input)?;

    Ok((remaining, ()))
}

/// Parses a WebAssembly result type (a vector of value types) from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#result-types>
pub(crate) fn parse_result_type(input: Input) -> ParseResult<ResultType> {
    let (remaining, kinds) = parse_vector(parse_value_type)(input)?;

    Ok((remaining, kinds.into()))
}

/// Parses a WebAssembly function type from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#function-types>
pub(crate) fn parse_function_type(input: Input) -> ParseResult<FunctionType> {
    let (input, _) = match_byte(FUNCTION_TYPE, DecodeErrorKind::BadValueType)(input)?;
    let (input, parameters) = parse_result_type(input)?;
    let (input, results) = parse_result_type(input)?;

    Ok((input, FunctionType::new(parameters, results)))
}

/// Parses a WebAssembly limit from the input.
/// A flag byte determines whether a maximum follows the minimum.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#limits>
pub(crate) fn parse_limit(input: Input) -> ParseResult<Limit> {
    let (remaining, flag) = parse_byte(input)?;

    match flag {
        0x00 => {
            let (remaining, min) = parse_u32(remaining)?;

            Ok((remaining, Limit::unbounded(min)))
        }
        0x01 => {
            let (remaining, min) = parse_u32(remaining)?;
            let (remaining, max) = parse_u32(remaining)?;

            Ok((remaining, Limit::bounded(min, max)))
        }
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses a WebAssembly memory type from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#memory-types>
pub(crate) fn parse_memory_type(input: Input) -> ParseResult<MemoryType> {
    let (remaining, limits) = parse_limit(input)?;

    Ok((remaining, MemoryType::new(limits)))
}

/// Parses a WebAssembly table type from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#table-types>
pub(crate) fn parse_table_type(input: Input) -> ParseResult<TableType> {
    let (input, _) = parse_reference_type(input)?;
    let (input, limits) = parse_limit(input)?;

    Ok((input, TableType::new(limits)))
}

/// Parses a WebAssembly global type from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#global-types>
pub(crate) fn parse_global_type(input: Input) -> ParseResult<GlobalType> {
    let (input, kind) = parse_value_type(input)?;
    let (remaining, flag) = parse_byte(input)?;

    match flag {
        0x00 => Ok((remaining, GlobalType::new(kind, Mutability::Immutable))),
        0x01 => Ok((remaining, GlobalType::new(kind, Mutability::Mutable))),
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_value_types() {
        let cases = [
            (0x7Fu8, ValueType::I32),
            (0x7E, ValueType::I64),
            (0x7D, ValueType::F32),
            (0x7C, ValueType::F64),
            (0x70, ValueType::FunctionReference),
        ];

        for (byte, expected) in cases {
            let input = vec![byte];
            let (_, actual) = parse_value_type(input.as_slice()).unwrap();

            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn parse_value_type_rejects_externref() {
        let input = vec![0x6F];

        assert!(parse_value_type(input.as_slice()).is_err());
    }

    #[test]
    fn parse_function_type_with_parameters_and_result() {
        let input = vec![0x60, 0x02, 0x7F, 0x7F, 0x01, 0x7F];
        let (_, actual) = parse_function_type(input.as_slice()).unwrap();

        assert_eq!(
            actual,
            FunctionType::new(
                vec![ValueType::I32, ValueType::I32].into(),
                vec![ValueType::I32].into(),
            )
        );
    }

    #[test]
    fn parse_bounded_limit() {
        let input = vec![0x01, 0x01, 0x10];
        let (_, actual) = parse_limit(input.as_slice()).unwrap();

        assert_eq!(actual, Limit::bounded(1, 16));
    }

    #[test]
    fn parse_unbounded_limit() {
        let input = vec![0x00, 0x02];
        let (_, actual) = parse_limit(input.as_slice()).unwrap();

        assert_eq!(actual, Limit::unbounded(2));
    }

    #[test]
    fn parse_mutable_global_type() {
        let input = vec![0x7E, 0x01];
        let (_, actual) = parse_global_type(input.as_slice()).unwrap();

        assert_eq!(actual, GlobalType::mutable(ValueType::I64));
    }
}
