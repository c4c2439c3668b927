use crate::parser::errors::DecodeErrorKind;
use crate::parser::instructions::parse_expression;
use crate::parser::types::{
    parse_global_type, parse_memory_type, parse_reference_type, parse_table_type, parse_value_type,
};
use crate::parser::values::{
    fail, parse_byte, parse_byte_vector, parse_name, parse_u32, parse_vector, take_bytes, Input,
    ParseResult,
};
use crate::{
    Data, Element, Export, ExportDescription, Expression, FunctionIndex, Global, Import,
    ImportDescription, Memory, ReferenceInstruction, ResultType, Start, Table,
};

/// The number of locals a single function may declare.
/// Local declarations are run-length encoded,
/// so a handful of bytes can otherwise demand an arbitrarily large allocation.
const MAX_FUNCTION_LOCALS: u64 = 65_536;

/// Parses a WebAssembly import component from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#binary-importsec>
pub(crate) fn parse_import(input: Input) -> ParseResult<Import> {
    let (input, module) = parse_name(input)?;
    let (input, name) = parse_name(input)?;
    let (input, description) = parse_import_description(input)?;

    Ok((input, Import::new(module, name, description)))
}

/// Parses an import description.
fn parse_import_description(input: Input) -> ParseResult<ImportDescription> {
    let (remaining, kind) = parse_byte(input)?;

    match kind {
        0x00 => {
            let (remaining, index) = parse_u32(remaining)?;

            Ok((remaining, ImportDescription::Function(index)))
        }
        0x01 => {
            let (remaining, kind) = parse_table_type(remaining)?;

            Ok((remaining, ImportDescription::Table(kind)))
        }
        0x02 => {
            let (remaining, kind) = parse_memory_type(remaining)?;

            Ok((remaining, ImportDescription::Memory(kind)))
        }
        0x03 => {
            let (remaining, kind) = parse_global_type(remaining)?;

            Ok((remaining, ImportDescription::Global(kind)))
        }
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses a WebAssembly export component from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#export-section>
pub(crate) fn parse_export(input: Input) -> ParseResult<Export> {
    let (input, name) = parse_name(input)?;
    let (input, description) = parse_export_description(input)?;

    Ok((input, Export::new(name, description)))
}

/// Parses an export description.
fn parse_export_description(input: Input) -> ParseResult<ExportDescription> {
    let (remaining, kind) = parse_byte(input)?;
    let (remaining, index) = parse_u32(remaining)?;

    match kind {
        0x00 => Ok((remaining, ExportDescription::Function(index))),
        0x01 => Ok((remaining, ExportDescription::Table(index))),
        0x02 => Ok((remaining, ExportDescription::Memory(index))),
        0x03 => Ok((remaining, ExportDescription::Global(index))),
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses a WebAssembly table component from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#table-section>
pub(crate) fn parse_table(input: Input) -> ParseResult<Table> {
    let (remaining, kind) = parse_table_type(input)?;

    Ok((remaining, Table::new(kind)))
}

/// Parses a WebAssembly memory component from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#memory-section>
pub(crate) fn parse_memory(input: Input) -> ParseResult<Memory> {
    let (remaining, kind) = parse_memory_type(input)?;

    Ok((remaining, Memory::new(kind)))
}

/// Parses a WebAssembly global component (type plus initializer expression) from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#global-section>
pub(crate) fn parse_global(input: Input) -> ParseResult<Global> {
    let (input, kind) = parse_global_type(input)?;
    let (input, initializer) = parse_expression(input)?;

    Ok((input, Global::new(kind, initializer)))
}

/// Parses a WebAssembly start component from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#start-section>
pub(crate) fn parse_start(input: Input) -> ParseResult<Start> {
    let (remaining, function) = parse_u32(input)?;

    Ok((remaining, Start::new(function)))
}

/// Parses a WebAssembly data component from the input.
/// Encodings 0 and 2 are active (implicit and explicit memory index); encoding 1 is passive.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#data-section>
pub(crate) fn parse_data(input: Input) -> ParseResult<Data> {
    let (remaining, encoding) = parse_u32(input)?;

    match encoding {
        0 => {
            let (remaining, offset) = parse_expression(remaining)?;
            let (remaining, bytes) = parse_byte_vector(remaining)?;

            Ok((remaining, Data::active(0, offset, bytes.to_vec())))
        }
        1 => {
            let (remaining, bytes) = parse_byte_vector(remaining)?;

            Ok((remaining, Data::passive(bytes.to_vec())))
        }
        2 => {
            let (remaining, memory) = parse_u32(remaining)?;
            let (remaining, offset) = parse_expression(remaining)?;
            let (remaining, bytes) = parse_byte_vector(remaining)?;

            Ok((remaining, Data::active(memory, offset, bytes.to_vec())))
        }
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses a WebAssembly element component from the input.
/// All eight encodings of the bulk-memory proposal are accepted;
/// function indices are normalized to `ref.func` initializer expressions.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#element-section>
pub(crate) fn parse_element(input: Input) -> ParseResult<Element> {
    let (remaining, encoding) = parse_u32(input)?;

    match encoding {
        0 => {
            let (remaining, offset) = parse_expression(remaining)?;
            let (remaining, functions) = parse_vector(parse_u32)(remaining)?;

            Ok((
                remaining,
                Element::active(0, offset, function_initializers(functions)),
            ))
        }
        1 => {
            let (remaining, _) = parse_element_kind(remaining)?;
            let (remaining, functions) = parse_vector(parse_u32)(remaining)?;

            Ok((remaining, Element::passive(function_initializers(functions))))
        }
        2 => {
            let (remaining, table) = parse_u32(remaining)?;
            let (remaining, offset) = parse_expression(remaining)?;
            let (remaining, _) = parse_element_kind(remaining)?;
            let (remaining, functions) = parse_vector(parse_u32)(remaining)?;

            Ok((
                remaining,
                Element::active(table, offset, function_initializers(functions)),
            ))
        }
        3 => {
            let (remaining, _) = parse_element_kind(remaining)?;
            let (remaining, functions) = parse_vector(parse_u32)(remaining)?;

            Ok((
                remaining,
                Element::declarative(function_initializers(functions)),
            ))
        }
        4 => {
            let (remaining, offset) = parse_expression(remaining)?;
            let (remaining, initializers) = parse_vector(parse_expression)(remaining)?;

            Ok((remaining, Element::active(0, offset, initializers)))
        }
        5 => {
            let (remaining, _) = parse_reference_type(remaining)?;
            let (remaining, initializers) = parse_vector(parse_expression)(remaining)?;

            Ok((remaining, Element::passive(initializers)))
        }
        6 => {
            let (remaining, table) = parse_u32(remaining)?;
            let (remaining, offset) = parse_expression(remaining)?;
            let (remaining, _) = parse_reference_type(remaining)?;
            let (remaining, initializers) = parse_vector(parse_expression)(remaining)?;

            Ok((remaining, Element::active(table, offset, initializers)))
        }
        7 => {
            let (remaining, _) = parse_reference_type(remaining)?;
            let (remaining, initializers) = parse_vector(parse_expression)(remaining)?;

            Ok((remaining, Element::declarative(initializers)))
        }
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses the element kind byte; only kind 0 (funcref) is defined.
fn parse_element_kind(input: Input) -> ParseResult<()> {
    match parse_byte(input)? {
        (remaining, 0x00) => Ok((remaining, ())),
        _ => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Maps a vector of function indices to `ref.func` initializer expressions.
fn function_initializers(functions: Vec<FunctionIndex>) -> Vec<Expression> {
    functions
        .into_iter()
        .map(|function| Expression::new(vec![ReferenceInstruction::Function(function).into()]))
        .collect()
}

/// Parses the code portion of a WebAssembly function component from the input:
/// a size prefix, run-length encoded local declarations, and the body expression.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#code-section>
pub(crate) fn parse_code(input: Input) -> ParseResult<(ResultType, Expression)> {
    let (input, size) = parse_u32(input)?;
    let (remaining, input) = take_bytes(size as usize)(input)?;
    let (input, locals) = parse_locals(input)?;
    let (leftover, body) = parse_expression(input)?;

    if leftover.is_empty() {
        Ok((remaining, (locals, body)))
    } else {
        fail(leftover, DecodeErrorKind::OversizedSection)
    }
}

/// Parses the run-length encoded value types of the locals of a function.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#code-section>
pub(crate) fn parse_locals(input: Input) -> ParseResult<ResultType> {
    let (mut input, declarations) = parse_u32(input)?;
    let mut kinds = Vec::new();
    let mut total: u64 = 0;

    for _ in 0..declarations {
        let declaration = input;
        let (remaining, count) = parse_u32(input)?;
        let (remaining, kind) = parse_value_type(remaining)?;

        total += u64::from(count);

        if total > MAX_FUNCTION_LOCALS {
            return fail(declaration, DecodeErrorKind::OversizedSection);
        }

        kinds.extend((0..count).map(|_| kind));
        input = remaining;
    }

    Ok((input, kinds.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GlobalType, Limit, MemoryType, Name, NumericInstruction, ValueType};

    #[test]
    fn parse_function_import() {
        let mut input = vec![3];
        input.extend(b"env");
        input.push(3);
        input.extend(b"log");
        input.extend([0x00, 0x02]);

        let (_, import) = parse_import(input.as_slice()).unwrap();

        assert_eq!(
            import,
            Import::new("env".into(), "log".into(), ImportDescription::Function(2))
        );
    }

    #[test]
    fn parse_memory_import() {
        let mut input = vec![3];
        input.extend(b"env");
        input.push(6);
        input.extend(b"memory");
        input.extend([0x02, 0x00, 0x01]);

        let (_, import) = parse_import(input.as_slice()).unwrap();

        assert_eq!(
            import,
            Import::new(
                "env".into(),
                "memory".into(),
                ImportDescription::Memory(MemoryType::new(Limit::unbounded(1))),
            )
        );
    }

    #[test]
    fn parse_function_export() {
        let mut input = vec![3];
        input.extend(b"add");
        input.extend([0x00, 0x00]);

        let (_, export) = parse_export(input.as_slice()).unwrap();

        assert_eq!(export.name(), &Name::from("add"));
        assert_eq!(export.description(), &ExportDescription::Function(0));
    }

    #[test]
    fn parse_immutable_global_with_initializer() {
        let input = vec![0x7F, 0x00, 0x41, 0x2A, 0x0B];

        let (_, global) = parse_global(input.as_slice()).unwrap();

        assert_eq!(global.kind(), &GlobalType::immutable(ValueType::I32));
        assert_eq!(
            global.initializer(),
            &Expression::new(vec![NumericInstruction::I32Constant(42).into()])
        );
    }

    #[test]
    fn parse_active_data_segment() {
        let input = vec![0x00, 0x41, 0x10, 0x0B, 0x03, 0xAA, 0xBB, 0xCC];

        let (_, data) = parse_data(input.as_slice()).unwrap();

        assert_eq!(
            data,
            Data::active(
                0,
                Expression::new(vec![NumericInstruction::I32Constant(16).into()]),
                vec![0xAA, 0xBB, 0xCC],
            )
        );
    }

    #[test]
    fn parse_passive_data_segment() {
        let input = vec![0x01, 0x02, 0x01, 0x02];

        let (_, data) = parse_data(input.as_slice()).unwrap();

        assert_eq!(data, Data::passive(vec![1, 2]));
    }

    #[test]
    fn parse_active_element_segment() {
        let input = vec![0x00, 0x41, 0x00, 0x0B, 0x02, 0x00, 0x01];

        let (_, element) = parse_element(input.as_slice()).unwrap();

        assert_eq!(
            element,
            Element::active(
                0,
                Expression::new(vec![NumericInstruction::I32Constant(0).into()]),
                vec![
                    Expression::new(vec![ReferenceInstruction::Function(0).into()]),
                    Expression::new(vec![ReferenceInstruction::Function(1).into()]),
                ],
            )
        );
    }

    #[test]
    fn parse_code_entry_with_locals() {
        let input = vec![0x06, 0x01, 0x02, 0x7F, 0x41, 0x00, 0x0B];

        let (_, (locals, body)) = parse_code(input.as_slice()).unwrap();

        assert_eq!(locals, vec![ValueType::I32, ValueType::I32].into());
        assert_eq!(
            body,
            Expression::new(vec![NumericInstruction::I32Constant(0).into()])
        );
    }

    #[test]
    fn parse_code_entry_with_wrong_size() {
        let input = vec![0x07, 0x01, 0x02, 0x7F, 0x41, 0x00, 0x0B, 0x01];

        assert!(parse_code(input.as_slice()).is_err());
    }

    #[test]
    fn parse_locals_rejects_run_length_bomb() {
        let input = vec![0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x7F];

        assert!(parse_locals(input.as_slice()).is_err());
    }
}
