use crate::parser::errors::DecodeErrorKind;
use crate::parser::values::{
    fail, match_byte, parse_byte, parse_f32, parse_f64, parse_s32, parse_s33, parse_s64,
    parse_u32, parse_vector, Input, ParseResult,
};
use crate::parser::types::parse_value_type;
use crate::{
    BlockType, ControlInstruction, Expression, FloatType, Instruction, IntegerType,
    MemoryArgument, MemoryInstruction, NumberType, NumericInstruction, ParametricInstruction,
    ReferenceInstruction, SignExtension, TableInstruction, VariableInstruction,
};

/// Marks the end of an expression.
const EXPRESSION_END: u8 = 0x0B;

/// Marks the start of the alternative of an if instruction.
const ELSE_MARKER: u8 = 0x05;

/// The prefix byte of the extended (saturating truncation and bulk) opcode space.
const EXTENDED_PREFIX: u8 = 0xFC;

/// The block type encoding for a block with no result.
const EMPTY_BLOCK: u8 = 0x40;

/// Parses a WebAssembly expression (an instruction sequence terminated by an end marker)
/// from the input.
/// The nested sequences of structured instructions are materialized recursively,
/// so the decoded representation carries the full block structure.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#expressions>
pub(crate) fn parse_expression(input: Input) -> ParseResult<Expression> {
    let (input, (expression, terminal)) = parse_instruction_sequence(input)?;

    if terminal == EXPRESSION_END {
        Ok((input, expression))
    } else {
        fail(input, DecodeErrorKind::BadOpcode)
    }
}

/// Parses instructions until an end or else marker, returning the marker alongside the sequence.
fn parse_instruction_sequence(mut input: Input) -> ParseResult<(Expression, u8)> {
    let mut instructions = Vec::new();

    loop {
        let (remaining, byte) = parse_byte(input)?;

        if byte == EXPRESSION_END || byte == ELSE_MARKER {
            return Ok((remaining, (Expression::new(instructions), byte)));
        }

        let (remaining, instruction) = parse_instruction(input)?;

        instructions.push(instruction);
        input = remaining;
    }
}

/// Parses a single WebAssembly instruction, including any nested expressions, from the input.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html>
pub(crate) fn parse_instruction(input: Input) -> ParseResult<Instruction> {
    let (remaining, opcode) = parse_byte(input)?;

    match opcode {
        0x00..=0x11 => parse_control_instruction(opcode, input, remaining),
        0x1A..=0x1C => parse_parametric_instruction(opcode, input, remaining),
        0x20..=0x24 => parse_variable_instruction(opcode, input, remaining),
        0x28..=0x40 => parse_memory_instruction(opcode, input, remaining),
        0x41..=0xC4 => parse_numeric_instruction(opcode, input, remaining),
        0xD0..=0xD2 => parse_reference_instruction(opcode, input, remaining),
        EXTENDED_PREFIX => parse_extended_instruction(input, remaining),
        _ => fail(input, DecodeErrorKind::BadOpcode),
    }
}

/// Parses the block type of a structured instruction:
/// empty, a single inline value type, or a type index encoded as a signed 33-bit integer.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#control-instructions>
fn parse_block_type(input: Input) -> ParseResult<BlockType> {
    if let Ok((remaining, _)) = match_byte(EMPTY_BLOCK, DecodeErrorKind::BadValueType)(input) {
        return Ok((remaining, BlockType::None));
    }

    if let Ok((remaining, kind)) = parse_value_type(input) {
        return Ok((remaining, BlockType::ValueType(kind)));
    }

    let (remaining, index) = parse_s33(input)?;

    match u32::try_from(index) {
        Ok(index) => Ok((remaining, BlockType::Index(index))),
        Err(_) => fail(input, DecodeErrorKind::BadValueType),
    }
}

/// Parses a WebAssembly control instruction given its already-consumed opcode.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#control-instructions>
fn parse_control_instruction<'input>(
    opcode: u8,
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    match opcode {
        0x00 => Ok((remaining, ControlInstruction::Unreachable.into())),
        0x01 => Ok((remaining, ControlInstruction::Nop.into())),
        0x02 => {
            let (remaining, kind) = parse_block_type(remaining)?;
            let (remaining, body) = parse_expression(remaining)?;

            Ok((remaining, ControlInstruction::Block(kind, body).into()))
        }
        0x03 => {
            let (remaining, kind) = parse_block_type(remaining)?;
            let (remaining, body) = parse_expression(remaining)?;

            Ok((remaining, ControlInstruction::Loop(kind, body).into()))
        }
        0x04 => {
            let (remaining, kind) = parse_block_type(remaining)?;
            let (remaining, (consequent, terminal)) = parse_instruction_sequence(remaining)?;

            if terminal == ELSE_MARKER {
                let (remaining, alternative) = parse_expression(remaining)?;

                Ok((
                    remaining,
                    ControlInstruction::If(kind, consequent, Some(alternative)).into(),
                ))
            } else {
                Ok((remaining, ControlInstruction::If(kind, consequent, None).into()))
            }
        }
        0x0C => {
            let (remaining, label) = parse_u32(remaining)?;

            Ok((remaining, ControlInstruction::Branch(label).into()))
        }
        0x0D => {
            let (remaining, label) = parse_u32(remaining)?;

            Ok((remaining, ControlInstruction::BranchIf(label).into()))
        }
        0x0E => {
            let (remaining, labels) = parse_vector(parse_u32)(remaining)?;
            let (remaining, default) = parse_u32(remaining)?;

            Ok((remaining, ControlInstruction::BranchTable(labels, default).into()))
        }
        0x0F => Ok((remaining, ControlInstruction::Return.into())),
        0x10 => {
            let (remaining, function) = parse_u32(remaining)?;

            Ok((remaining, ControlInstruction::Call(function).into()))
        }
        0x11 => {
            let (remaining, kind) = parse_u32(remaining)?;
            let (remaining, table) = parse_u32(remaining)?;

            Ok((remaining, ControlInstruction::CallIndirect(kind, table).into()))
        }
        _ => fail(input, DecodeErrorKind::BadOpcode),
    }
}

/// Parses a WebAssembly parametric instruction given its already-consumed opcode.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#parametric-instructions>
fn parse_parametric_instruction<'input>(
    opcode: u8,
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    match opcode {
        0x1A => Ok((remaining, ParametricInstruction::Drop.into())),
        0x1B => Ok((remaining, ParametricInstruction::Select(None).into())),
        0x1C => {
            let (remaining, kinds) = parse_vector(parse_value_type)(remaining)?;

            Ok((remaining, ParametricInstruction::Select(Some(kinds)).into()))
        }
        _ => fail(input, DecodeErrorKind::BadOpcode),
    }
}

/// Parses a WebAssembly variable instruction given its already-consumed opcode.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#variable-instructions>
fn parse_variable_instruction<'input>(
    opcode: u8,
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    let (remaining, index) = parse_u32(remaining)?;

    let instruction = match opcode {
        0x20 => VariableInstruction::LocalGet(index),
        0x21 => VariableInstruction::LocalSet(index),
        0x22 => VariableInstruction::LocalTee(index),
        0x23 => VariableInstruction::GlobalGet(index),
        0x24 => VariableInstruction::GlobalSet(index),
        _ => return fail(input, DecodeErrorKind::BadOpcode),
    };

    Ok((remaining, instruction.into()))
}

/// Parses the static memory argument (alignment exponent and offset) of a load or store.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#memory-instructions>
fn parse_memory_argument(input: Input) -> ParseResult<MemoryArgument> {
    let (input, align) = parse_u32(input)?;
    let (input, offset) = parse_u32(input)?;

    Ok((input, MemoryArgument::new(align, offset)))
}

/// Parses a WebAssembly memory instruction given its already-consumed opcode.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#memory-instructions>
fn parse_memory_instruction<'input>(
    opcode: u8,
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    // memory.size and memory.grow carry a memory index, which must be 0 in this engine.
    if opcode == 0x3F || opcode == 0x40 {
        let (remaining, _) = match_byte(0x00, DecodeErrorKind::BadOpcode)(remaining)?;
        let instruction = if opcode == 0x3F {
            MemoryInstruction::Size
        } else {
            MemoryInstruction::Grow
        };

        return Ok((remaining, instruction.into()));
    }

    let (remaining, memarg) = parse_memory_argument(remaining)?;

    let instruction = match opcode {
        0x28 => MemoryInstruction::Load(NumberType::I32, memarg),
        0x29 => MemoryInstruction::Load(NumberType::I64, memarg),
        0x2A => MemoryInstruction::Load(NumberType::F32, memarg),
        0x2B => MemoryInstruction::Load(NumberType::F64, memarg),
        0x2C => MemoryInstruction::Load8(IntegerType::I32, SignExtension::Signed, memarg),
        0x2D => MemoryInstruction::Load8(IntegerType::I32, SignExtension::Unsigned, memarg),
        0x2E => MemoryInstruction::Load16(IntegerType::I32, SignExtension::Signed, memarg),
        0x2F => MemoryInstruction::Load16(IntegerType::I32, SignExtension::Unsigned, memarg),
        0x30 => MemoryInstruction::Load8(IntegerType::I64, SignExtension::Signed, memarg),
        0x31 => MemoryInstruction::Load8(IntegerType::I64, SignExtension::Unsigned, memarg),
        0x32 => MemoryInstruction::Load16(IntegerType::I64, SignExtension::Signed, memarg),
        0x33 => MemoryInstruction::Load16(IntegerType::I64, SignExtension::Unsigned, memarg),
        0x34 => MemoryInstruction::Load32(SignExtension::Signed, memarg),
        0x35 => MemoryInstruction::Load32(SignExtension::Unsigned, memarg),
        0x36 => MemoryInstruction::Store(NumberType::I32, memarg),
        0x37 => MemoryInstruction::Store(NumberType::I64, memarg),
        0x38 => MemoryInstruction::Store(NumberType::F32, memarg),
        0x39 => MemoryInstruction::Store(NumberType::F64, memarg),
        0x3A => MemoryInstruction::Store8(IntegerType::I32, memarg),
        0x3B => MemoryInstruction::Store16(IntegerType::I32, memarg),
        0x3C => MemoryInstruction::Store8(IntegerType::I64, memarg),
        0x3D => MemoryInstruction::Store16(IntegerType::I64, memarg),
        0x3E => MemoryInstruction::Store32(memarg),
        _ => return fail(input, DecodeErrorKind::BadOpcode),
    };

    Ok((remaining, instruction.into()))
}

/// Parses a WebAssembly reference instruction given its already-consumed opcode.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#reference-instructions>
fn parse_reference_instruction<'input>(
    opcode: u8,
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    match opcode {
        0xD0 => {
            let (remaining, _) = match_byte(0x70, DecodeErrorKind::BadValueType)(remaining)?;

            Ok((remaining, ReferenceInstruction::Null.into()))
        }
        0xD1 => Ok((remaining, ReferenceInstruction::IsNull.into())),
        0xD2 => {
            let (remaining, function) = parse_u32(remaining)?;

            Ok((remaining, ReferenceInstruction::Function(function).into()))
        }
        _ => fail(input, DecodeErrorKind::BadOpcode),
    }
}

/// Parses an instruction from the extended (0xFC-prefixed) opcode space:
/// saturating truncations and the bulk memory and table operators.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#numeric-instructions>
fn parse_extended_instruction<'input>(
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    let (remaining, extended) = parse_u32(remaining)?;

    match extended {
        0..=7 => {
            let integer = if extended < 4 {
                IntegerType::I32
            } else {
                IntegerType::I64
            };
            let float = if extended % 4 < 2 {
                FloatType::F32
            } else {
                FloatType::F64
            };
            let sign = if extended % 2 == 0 {
                SignExtension::Signed
            } else {
                SignExtension::Unsigned
            };

            Ok((
                remaining,
                NumericInstruction::ConvertAndTruncateWithSaturation(integer, float, sign).into(),
            ))
        }
        8 => {
            let (remaining, data) = parse_u32(remaining)?;
            let (remaining, _) = match_byte(0x00, DecodeErrorKind::BadOpcode)(remaining)?;

            Ok((remaining, MemoryInstruction::Init(data).into()))
        }
        9 => {
            let (remaining, data) = parse_u32(remaining)?;

            Ok((remaining, MemoryInstruction::DataDrop(data).into()))
        }
        10 => {
            let (remaining, _) = match_byte(0x00, DecodeErrorKind::BadOpcode)(remaining)?;
            let (remaining, _) = match_byte(0x00, DecodeErrorKind::BadOpcode)(remaining)?;

            Ok((remaining, MemoryInstruction::Copy.into()))
        }
        11 => {
            let (remaining, _) = match_byte(0x00, DecodeErrorKind::BadOpcode)(remaining)?;

            Ok((remaining, MemoryInstruction::Fill.into()))
        }
        12 => {
            let (remaining, element) = parse_u32(remaining)?;
            let (remaining, table) = parse_u32(remaining)?;

            Ok((remaining, TableInstruction::Init(element, table).into()))
        }
        13 => {
            let (remaining, element) = parse_u32(remaining)?;

            Ok((remaining, TableInstruction::ElementDrop(element).into()))
        }
        _ => fail(input, DecodeErrorKind::BadOpcode),
    }
}

/// Parses a WebAssembly numeric instruction given its already-consumed opcode.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#numeric-instructions>
fn parse_numeric_instruction<'input>(
    opcode: u8,
    input: Input<'input>,
    remaining: Input<'input>,
) -> ParseResult<'input, Instruction> {
    match opcode {
        0x41 => {
            let (remaining, value) = parse_s32(remaining)?;

            return Ok((remaining, NumericInstruction::I32Constant(value).into()));
        }
        0x42 => {
            let (remaining, value) = parse_s64(remaining)?;

            return Ok((remaining, NumericInstruction::I64Constant(value).into()));
        }
        0x43 => {
            let (remaining, value) = parse_f32(remaining)?;

            return Ok((remaining, NumericInstruction::F32Constant(value).into()));
        }
        0x44 => {
            let (remaining, value) = parse_f64(remaining)?;

            return Ok((remaining, NumericInstruction::F64Constant(value).into()));
        }
        _ => {}
    };

    let instruction = match opcode {
        0x45 => NumericInstruction::EqualToZero(IntegerType::I32),
        0x46 => NumericInstruction::Equal(NumberType::I32),
        0x47 => NumericInstruction::NotEqual(NumberType::I32),
        0x48 => NumericInstruction::LessThanInteger(IntegerType::I32, SignExtension::Signed),
        0x49 => NumericInstruction::LessThanInteger(IntegerType::I32, SignExtension::Unsigned),
        0x4A => NumericInstruction::GreaterThanInteger(IntegerType::I32, SignExtension::Signed),
        0x4B => NumericInstruction::GreaterThanInteger(IntegerType::I32, SignExtension::Unsigned),
        0x4C => {
            NumericInstruction::LessThanOrEqualToInteger(IntegerType::I32, SignExtension::Signed)
        }
        0x4D => {
            NumericInstruction::LessThanOrEqualToInteger(IntegerType::I32, SignExtension::Unsigned)
        }
        0x4E => {
            NumericInstruction::GreaterThanOrEqualToInteger(IntegerType::I32, SignExtension::Signed)
        }
        0x4F => NumericInstruction::GreaterThanOrEqualToInteger(
            IntegerType::I32,
            SignExtension::Unsigned,
        ),
        0x50 => NumericInstruction::EqualToZero(IntegerType::I64),
        0x51 => NumericInstruction::Equal(NumberType::I64),
        0x52 => NumericInstruction::NotEqual(NumberType::I64),
        0x53 => NumericInstruction::LessThanInteger(IntegerType::I64, SignExtension::Signed),
        0x54 => NumericInstruction::LessThanInteger(IntegerType::I64, SignExtension::Unsigned),
        0x55 => NumericInstruction::GreaterThanInteger(IntegerType::I64, SignExtension::Signed),
        0x56 => NumericInstruction::GreaterThanInteger(IntegerType::I64, SignExtension::Unsigned),
        0x57 => {
            NumericInstruction::LessThanOrEqualToInteger(IntegerType::I64, SignExtension::Signed)
        }
        0x58 => {
            NumericInstruction::LessThanOrEqualToInteger(IntegerType::I64, SignExtension::Unsigned)
        }
        0x59 => {
            NumericInstruction::GreaterThanOrEqualToInteger(IntegerType::I64, SignExtension::Signed)
        }
        0x5A => NumericInstruction::GreaterThanOrEqualToInteger(
            IntegerType::I64,
            SignExtension::Unsigned,
        ),
        0x5B => NumericInstruction::Equal(NumberType::F32),
        0x5C => NumericInstruction::NotEqual(NumberType::F32),
        0x5D => NumericInstruction::LessThanFloat(FloatType::F32),
        0x5E => NumericInstruction::GreaterThanFloat(FloatType::F32),
        0x5F => NumericInstruction::LessThanOrEqualToFloat(FloatType::F32),
        0x60 => NumericInstruction::GreaterThanOrEqualToFloat(FloatType::F32),
        0x61 => NumericInstruction::Equal(NumberType::F64),
        0x62 => NumericInstruction::NotEqual(NumberType::F64),
        0x63 => NumericInstruction::LessThanFloat(FloatType::F64),
        0x64 => NumericInstruction::GreaterThanFloat(FloatType::F64),
        0x65 => NumericInstruction::LessThanOrEqualToFloat(FloatType::F64),
        0x66 => NumericInstruction::GreaterThanOrEqualToFloat(FloatType::F64),
        0x67 => NumericInstruction::CountLeadingZeros(IntegerType::I32),
        0x68 => NumericInstruction::CountTrailingZeros(IntegerType::I32),
        0x69 => NumericInstruction::CountOnes(IntegerType::I32),
        0x6A => NumericInstruction::Add(NumberType::I32),
        0x6B => NumericInstruction::Subtract(NumberType::I32),
        0x6C => NumericInstruction::Multiply(NumberType::I32),
        0x6D => NumericInstruction::DivideInteger(IntegerType::I32, SignExtension::Signed),
        0x6E => NumericInstruction::DivideInteger(IntegerType::I32, SignExtension::Unsigned),
        0x6F => NumericInstruction::Remainder(IntegerType::I32, SignExtension::Signed),
        0x70 => NumericInstruction::Remainder(IntegerType::I32, SignExtension::Unsigned),
        0x71 => NumericInstruction::And(IntegerType::I32),
        0x72 => NumericInstruction::Or(IntegerType::I32),
        0x73 => NumericInstruction::Xor(IntegerType::I32),
        0x74 => NumericInstruction::ShiftLeft(IntegerType::I32),
        0x75 => NumericInstruction::ShiftRight(IntegerType::I32, SignExtension::Signed),
        0x76 => NumericInstruction::ShiftRight(IntegerType::I32, SignExtension::Unsigned),
        0x77 => NumericInstruction::RotateLeft(IntegerType::I32),
        0x78 => NumericInstruction::RotateRight(IntegerType::I32),
        0x79 => NumericInstruction::CountLeadingZeros(IntegerType::I64),
        0x7A => NumericInstruction::CountTrailingZeros(IntegerType::I64),
        0x7B => NumericInstruction::CountOnes(IntegerType::I64),
        0x7C => NumericInstruction::Add(NumberType::I64),
        0x7D => NumericInstruction::Subtract(NumberType::I64),
        0x7E => NumericInstruction::Multiply(NumberType::I64),
        0x7F => NumericInstruction::DivideInteger(IntegerType::I64, SignExtension::Signed),
        0x80 => NumericInstruction::DivideInteger(IntegerType::I64, SignExtension::Unsigned),
        0x81 => NumericInstruction::Remainder(IntegerType::I64, SignExtension::Signed),
        0x82 => NumericInstruction::Remainder(IntegerType::I64, SignExtension::Unsigned),
        0x83 => NumericInstruction::And(IntegerType::I64),
        0x84 => NumericInstruction::Or(IntegerType::I64),
        0x85 => NumericInstruction::Xor(IntegerType::I64),
        0x86 => NumericInstruction::ShiftLeft(IntegerType::I64),
        0x87 => NumericInstruction::ShiftRight(IntegerType::I64, SignExtension::Signed),
        0x88 => NumericInstruction::ShiftRight(IntegerType::I64, SignExtension::Unsigned),
        0x89 => NumericInstruction::RotateLeft(IntegerType::I64),
        0x8A => NumericInstruction::RotateRight(IntegerType::I64),
        0x8B => NumericInstruction::AbsoluteValue(FloatType::F32),
        0x8C => NumericInstruction::Negate(FloatType::F32),
        0x8D => NumericInstruction::Ceiling(FloatType::F32),
        0x8E => NumericInstruction::Floor(FloatType::F32),
        0x8F => NumericInstruction::Truncate(FloatType::F32),
        0x90 => NumericInstruction::Nearest(FloatType::F32),
        0x91 => NumericInstruction::SquareRoot(FloatType::F32),
        0x92 => NumericInstruction::Add(NumberType::F32),
        0x93 => NumericInstruction::Subtract(NumberType::F32),
        0x94 => NumericInstruction::Multiply(NumberType::F32),
        0x95 => NumericInstruction::DivideFloat(FloatType::F32),
        0x96 => NumericInstruction::Minimum(FloatType::F32),
        0x97 => NumericInstruction::Maximum(FloatType::F32),
        0x98 => NumericInstruction::CopySign(FloatType::F32),
        0x99 => NumericInstruction::AbsoluteValue(FloatType::F64),
        0x9A => NumericInstruction::Negate(FloatType::F64),
        0x9B => NumericInstruction::Ceiling(FloatType::F64),
        0x9C => NumericInstruction::Floor(FloatType::F64),
        0x9D => NumericInstruction::Truncate(FloatType::F64),
        0x9E => NumericInstruction::Nearest(FloatType::F64),
        0x9F => NumericInstruction::SquareRoot(FloatType::F64),
        0xA0 => NumericInstruction::Add(NumberType::F64),
        0xA1 => NumericInstruction::Subtract(NumberType::F64),
        0xA2 => NumericInstruction::Multiply(NumberType::F64),
        0xA3 => NumericInstruction::DivideFloat(FloatType::F64),
        0xA4 => NumericInstruction::Minimum(FloatType::F64),
        0xA5 => NumericInstruction::Maximum(FloatType::F64),
        0xA6 => NumericInstruction::CopySign(FloatType::F64),
        0xA7 => NumericInstruction::Wrap,
        0xA8 => {
            NumericInstruction::ConvertAndTruncate(IntegerType::I32, FloatType::F32, SignExtension::Signed)
        }
        0xA9 => NumericInstruction::ConvertAndTruncate(
            IntegerType::I32,
            FloatType::F32,
            SignExtension::Unsigned,
        ),
        0xAA => {
            NumericInstruction::ConvertAndTruncate(IntegerType::I32, FloatType::F64, SignExtension::Signed)
        }
        0xAB => NumericInstruction::ConvertAndTruncate(
            IntegerType::I32,
            FloatType::F64,
            SignExtension::Unsigned,
        ),
        0xAC => NumericInstruction::ExtendWithSignExtension(SignExtension::Signed),
        0xAD => NumericInstruction::ExtendWithSignExtension(SignExtension::Unsigned),
        0xAE => {
            NumericInstruction::ConvertAndTruncate(IntegerType::I64, FloatType::F32, SignExtension::Signed)
        }
        0xAF => NumericInstruction::ConvertAndTruncate(
            IntegerType::I64,
            FloatType::F32,
            SignExtension::Unsigned,
        ),
        0xB0 => {
            NumericInstruction::ConvertAndTruncate(IntegerType::I64, FloatType::F64, SignExtension::Signed)
        }
        0xB1 => NumericInstruction::ConvertAndTruncate(
            IntegerType::I64,
            FloatType::F64,
            SignExtension::Unsigned,
        ),
        0xB2 => NumericInstruction::Convert(FloatType::F32, IntegerType::I32, SignExtension::Signed),
        0xB3 => {
            NumericInstruction::Convert(FloatType::F32, IntegerType::I32, SignExtension::Unsigned)
        }
        0xB4 => NumericInstruction::Convert(FloatType::F32, IntegerType::I64, SignExtension::Signed),
        0xB5 => {
            NumericInstruction::Convert(FloatType::F32, IntegerType::I64, SignExtension::Unsigned)
        }
        0xB6 => NumericInstruction::Demote,
        0xB7 => NumericInstruction::Convert(FloatType::F64, IntegerType::I32, SignExtension::Signed),
        0xB8 => {
            NumericInstruction::Convert(FloatType::F64, IntegerType::I32, SignExtension::Unsigned)
        }
        0xB9 => NumericInstruction::Convert(FloatType::F64, IntegerType::I64, SignExtension::Signed),
        0xBA => {
            NumericInstruction::Convert(FloatType::F64, IntegerType::I64, SignExtension::Unsigned)
        }
        0xBB => NumericInstruction::Promote,
        0xBC => NumericInstruction::ReinterpretFloat(IntegerType::I32),
        0xBD => NumericInstruction::ReinterpretFloat(IntegerType::I64),
        0xBE => NumericInstruction::ReinterpretInteger(FloatType::F32),
        0xBF => NumericInstruction::ReinterpretInteger(FloatType::F64),
        0xC0 => NumericInstruction::ExtendSigned8(IntegerType::I32),
        0xC1 => NumericInstruction::ExtendSigned16(IntegerType::I32),
        0xC2 => NumericInstruction::ExtendSigned8(IntegerType::I64),
        0xC3 => NumericInstruction::ExtendSigned16(IntegerType::I64),
        0xC4 => NumericInstruction::ExtendSigned32,
        _ => return fail(input, DecodeErrorKind::BadOpcode),
    };

    Ok((remaining, instruction.into()))
}
