//! Parser of the WebAssembly binary format.

mod errors;
mod instructions;
mod module;
mod sections;
mod types;
mod values;

use crate::parser::errors::SyntaxError;
use crate::parser::sections::{
    parse_code_section, parse_data_count_section, parse_data_section, parse_element_section,
    parse_export_section, parse_function_section, parse_global_section, parse_import_section,
    parse_memory_section, parse_section_header, parse_start_section, parse_table_section,
    parse_type_section,
};
use crate::{Expression, Function, Module, ModuleSection, ResultType, TypeIndex};
pub use errors::{DecodeError, DecodeErrorKind};

#[cfg(feature = "text")]
pub use errors::TextError;

/// A magic constant used to quickly identify WebAssembly binary file contents.
const PREAMBLE: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// The sole version of the binary WebAssembly format this engine decodes.
const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Parses the given bytes into a WebAssembly module.
///
/// The module must start with the magic preamble and version.
/// Sections may appear in any order,
/// but every non-custom section may appear at most once;
/// custom sections are skipped without inspecting their contents.
/// The function and code sections must declare the same number of functions.
///
/// On failure the error carries the byte offset at which decoding stopped,
/// and no partially decoded module escapes.
///
/// See <https://webassembly.github.io/spec/core/binary/index.html>
///
/// # Examples
/// ```rust
/// use wasm_vm::parse_binary;
///
/// let module = parse_binary(b"\x00\x61\x73\x6D\x01\x00\x00\x00").unwrap();
///
/// assert!(module.functions().is_empty());
/// assert!(module.imports().is_empty());
/// assert!(module.exports().is_empty());
/// assert_eq!(module.start(), None);
/// ```
pub fn parse_binary(input: &[u8]) -> Result<Module, DecodeError> {
    decode_module(input).map_err(|error| match error {
        nom::Err::Error(error) | nom::Err::Failure(error) => {
            DecodeError::new(error.kind, error.offset_in(input))
        }
        nom::Err::Incomplete(_) => DecodeError::new(DecodeErrorKind::UnexpectedEof, input.len()),
    })
}

fn decode_module(input: &[u8]) -> Result<Module, nom::Err<SyntaxError>> {
    let mut remaining = parse_preamble(input)?;
    let mut builder = Module::builder();
    let mut seen = [false; 13];
    let mut signatures: Option<Vec<TypeIndex>> = None;
    let mut codes: Option<Vec<(ResultType, Expression)>> = None;

    while !remaining.is_empty() {
        let (rest, (section, payload)) = parse_section_header(remaining)?;

        if section != ModuleSection::Custom {
            if seen[section as usize] {
                return Err(nom::Err::Error(SyntaxError {
                    input: remaining,
                    kind: DecodeErrorKind::DuplicateSection,
                }));
            }

            seen[section as usize] = true;
        }

        match section {
            ModuleSection::Custom => {}
            ModuleSection::Type => builder.set_function_types(parse_type_section(payload)?),
            ModuleSection::Import => builder.set_imports(parse_import_section(payload)?),
            ModuleSection::Function => signatures = Some(parse_function_section(payload)?),
            ModuleSection::Table => builder.set_tables(parse_table_section(payload)?),
            ModuleSection::Memory => builder.set_memories(parse_memory_section(payload)?),
            ModuleSection::Global => builder.set_globals(parse_global_section(payload)?),
            ModuleSection::Export => builder.set_exports(parse_export_section(payload)?),
            ModuleSection::Start => builder.set_start(Some(parse_start_section(payload)?)),
            ModuleSection::Element => builder.set_elements(parse_element_section(payload)?),
            ModuleSection::Code => codes = Some(parse_code_section(payload)?),
            ModuleSection::Data => builder.set_data(parse_data_section(payload)?),
            ModuleSection::DataCount => {
                builder.set_data_count(Some(parse_data_count_section(payload)?))
            }
        }

        remaining = rest;
    }

    match zip_functions(signatures, codes) {
        Some(functions) => builder.set_functions(functions),
        None => {
            return Err(nom::Err::Error(SyntaxError {
                input: remaining,
                kind: DecodeErrorKind::MismatchedFunctionParts,
            }))
        }
    }

    Ok(builder.build())
}

fn parse_preamble(input: &[u8]) -> Result<&[u8], nom::Err<SyntaxError>> {
    let failure = |offset: usize, kind| {
        nom::Err::Error(SyntaxError {
            input: &input[offset.min(input.len())..],
            kind,
        })
    };

    if input.len() < PREAMBLE.len() + VERSION.len() {
        return Err(failure(input.len(), DecodeErrorKind::UnexpectedEof));
    }

    if input[..PREAMBLE.len()] != PREAMBLE {
        return Err(failure(0, DecodeErrorKind::BadMagic));
    }

    if input[PREAMBLE.len()..PREAMBLE.len() + VERSION.len()] != VERSION {
        return Err(failure(PREAMBLE.len(), DecodeErrorKind::BadVersion));
    }

    Ok(&input[PREAMBLE.len() + VERSION.len()..])
}

/// Zips the function and code sections into function syntax types.
/// The two sections must declare matching lengths; a module may also omit both.
fn zip_functions(
    signatures: Option<Vec<TypeIndex>>,
    codes: Option<Vec<(ResultType, Expression)>>,
) -> Option<Vec<Function>> {
    match (signatures, codes) {
        (None, None) => Some(vec![]),
        (Some(signatures), Some(codes)) if signatures.len() == codes.len() => Some(
            signatures
                .into_iter()
                .zip(codes)
                .map(|(kind, (locals, body))| Function::new(kind, locals, body))
                .collect(),
        ),
        _ => None,
    }
}

/// Parses the given string in the WebAssembly text format into a module.
/// The string is first assembled to the binary format, then decoded.
///
/// # Examples
/// ```rust
/// use wasm_vm::parse_text;
///
/// let module = parse_text("(module)").unwrap();
///
/// assert!(module.functions().is_empty());
/// ```
#[cfg(feature = "text")]
pub fn parse_text(text: &str) -> Result<Module, TextError> {
    let binary = wat::parse_str(text)?;

    Ok(parse_binary(binary.as_slice())?)
}
