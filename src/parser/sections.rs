use crate::parser::errors::{DecodeErrorKind, SyntaxError};
use crate::parser::module::{
    parse_code, parse_data, parse_element, parse_export, parse_global, parse_import, parse_memory,
    parse_start, parse_table,
};
use crate::parser::types::parse_function_type;
use crate::parser::values::{fail, parse_byte, parse_u32, parse_vector, Input, ParseResult};
use crate::{
    Data, Element, Export, Expression, FunctionType, Global, Import, Memory, ModuleSection,
    ResultType, Start, Table, TypeIndex,
};
use std::convert::TryFrom;

/// Parses a section header: the section identifier and its size-prefixed payload.
/// The payload is split off so each section parser can be required to consume it exactly.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#sections>
pub(crate) fn parse_section_header(input: Input) -> ParseResult<(ModuleSection, Input)> {
    let (remaining, id) = parse_byte(input)?;
    let section = match ModuleSection::try_from(id) {
        Ok(section) => section,
        Err(_) => return fail(input, DecodeErrorKind::BadSectionId),
    };
    let (remaining, size) = parse_u32(remaining)?;

    if size as usize > remaining.len() {
        return fail(remaining, DecodeErrorKind::OversizedSection);
    }

    let (payload, remaining) = remaining.split_at(size as usize);

    Ok((remaining, (section, payload)))
}

/// Runs a section content parser over a section payload,
/// requiring the payload to be consumed exactly.
fn decode_section<'input, O>(
    payload: Input<'input>,
    mut parser: impl FnMut(Input<'input>) -> ParseResult<'input, O>,
) -> Result<O, nom::Err<SyntaxError<'input>>> {
    let (remaining, contents) = parser(payload)?;

    if remaining.is_empty() {
        Ok(contents)
    } else {
        Err(nom::Err::Error(SyntaxError {
            input: remaining,
            kind: DecodeErrorKind::OversizedSection,
        }))
    }
}

/// Parses the contents of a WebAssembly type section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#binary-typesec>
pub(crate) fn parse_type_section(payload: Input) -> Result<Vec<FunctionType>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_function_type))
}

/// Parses the contents of a WebAssembly import section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#binary-importsec>
pub(crate) fn parse_import_section(payload: Input) -> Result<Vec<Import>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_import))
}

/// Parses the contents of a WebAssembly function section: the type index of every function.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#function-section>
pub(crate) fn parse_function_section(payload: Input) -> Result<Vec<TypeIndex>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_u32))
}

/// Parses the contents of a WebAssembly table section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#table-section>
pub(crate) fn parse_table_section(payload: Input) -> Result<Vec<Table>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_table))
}

/// Parses the contents of a WebAssembly memory section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#memory-section>
pub(crate) fn parse_memory_section(payload: Input) -> Result<Vec<Memory>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_memory))
}

/// Parses the contents of a WebAssembly global section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#global-section>
pub(crate) fn parse_global_section(payload: Input) -> Result<Vec<Global>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_global))
}

/// Parses the contents of a WebAssembly export section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#export-section>
pub(crate) fn parse_export_section(payload: Input) -> Result<Vec<Export>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_export))
}

/// Parses the contents of a WebAssembly start section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#start-section>
pub(crate) fn parse_start_section(payload: Input) -> Result<Start, nom::Err<SyntaxError>> {
    decode_section(payload, parse_start)
}

/// Parses the contents of a WebAssembly element section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#element-section>
pub(crate) fn parse_element_section(payload: Input) -> Result<Vec<Element>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_element))
}

/// Parses the contents of a WebAssembly code section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#code-section>
pub(crate) fn parse_code_section(
    payload: Input,
) -> Result<Vec<(ResultType, Expression)>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_code))
}

/// Parses the contents of a WebAssembly data section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#data-section>
pub(crate) fn parse_data_section(payload: Input) -> Result<Vec<Data>, nom::Err<SyntaxError>> {
    decode_section(payload, parse_vector(parse_data))
}

/// Parses the contents of a WebAssembly data count section.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#data-count-section>
pub(crate) fn parse_data_count_section(payload: Input) -> Result<u32, nom::Err<SyntaxError>> {
    decode_section(payload, parse_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_with_payload() {
        let input = vec![0x01, 0x02, 0xAA, 0xBB, 0xCC];
        let (remaining, (section, payload)) = parse_section_header(input.as_slice()).unwrap();

        assert_eq!(section, ModuleSection::Type);
        assert_eq!(payload, &[0xAA, 0xBB]);
        assert_eq!(remaining, &[0xCC]);
    }

    #[test]
    fn parse_header_with_invalid_id() {
        let input = vec![0x0D, 0x00];

        assert!(parse_section_header(input.as_slice()).is_err());
    }

    #[test]
    fn parse_header_with_size_past_the_end() {
        let input = vec![0x01, 0x05, 0xAA];

        assert!(parse_section_header(input.as_slice()).is_err());
    }

    #[test]
    fn decode_section_rejects_trailing_bytes() {
        let payload = vec![0x00, 0xFF];

        assert!(parse_function_section(payload.as_slice()).is_err());
    }
}
