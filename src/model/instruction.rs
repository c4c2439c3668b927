//! WebAssembly instruction set.

use crate::model::{
    DataIndex, ElementIndex, FloatType, FunctionIndex, GlobalIndex, IntegerType, LabelIndex,
    LocalIndex, NumberType, SignExtension, TableIndex, TypeIndex, ValueType,
};

/// WebAssembly code consists of sequences of instructions.
/// Its computational model is based on a stack machine in that instructions manipulate values on
/// an implicit operand stack,
/// consuming (popping) argument values and producing or returning (pushing) result values.
/// Some instructions also carry static immediate arguments,
/// typically indices or type annotations, which are part of the instruction itself.
/// Structured instructions bracket nested instruction sequences.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#instructions>
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Numeric(NumericInstruction),
    Reference(ReferenceInstruction),
    Parametric(ParametricInstruction),
    Variable(VariableInstruction),
    Table(TableInstruction),
    Memory(MemoryInstruction),
    Control(ControlInstruction),
}

/// Numeric instructions provide basic operations over numeric values of a specific type.
/// Some integer instructions come in two flavors,
/// where a signedness annotation distinguishes whether the operands are interpreted as
/// unsigned or signed integers.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#numeric-instructions>
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NumericInstruction {
    /// i32.const
    I32Constant(i32),
    /// i64.const
    I64Constant(i64),
    /// f32.const
    F32Constant(f32),
    /// f64.const
    F64Constant(f64),
    /// inn.clz
    CountLeadingZeros(IntegerType),
    /// inn.ctz
    CountTrailingZeros(IntegerType),
    /// inn.popcnt
    CountOnes(IntegerType),
    /// fnn.abs
    AbsoluteValue(FloatType),
    /// fnn.neg
    Negate(FloatType),
    /// fnn.sqrt
    SquareRoot(FloatType),
    /// fnn.ceil
    Ceiling(FloatType),
    /// fnn.floor
    Floor(FloatType),
    /// fnn.trunc
    Truncate(FloatType),
    /// fnn.nearest
    Nearest(FloatType),
    /// xnn.add
    Add(NumberType),
    /// xnn.sub
    Subtract(NumberType),
    /// xnn.mul
    Multiply(NumberType),
    /// inn.div_sx
    DivideInteger(IntegerType, SignExtension),
    /// fnn.div
    DivideFloat(FloatType),
    /// inn.rem_sx
    Remainder(IntegerType, SignExtension),
    /// inn.and
    And(IntegerType),
    /// inn.or
    Or(IntegerType),
    /// inn.xor
    Xor(IntegerType),
    /// inn.shl
    ShiftLeft(IntegerType),
    /// inn.shr_sx
    ShiftRight(IntegerType, SignExtension),
    /// inn.rotl
    RotateLeft(IntegerType),
    /// inn.rotr
    RotateRight(IntegerType),
    /// fnn.min
    Minimum(FloatType),
    /// fnn.max
    Maximum(FloatType),
    /// fnn.copysign
    CopySign(FloatType),
    /// inn.eqz
    EqualToZero(IntegerType),
    /// xnn.eq
    Equal(NumberType),
    /// xnn.ne
    NotEqual(NumberType),
    /// inn.lt_sx
    LessThanInteger(IntegerType, SignExtension),
    /// fnn.lt
    LessThanFloat(FloatType),
    /// inn.gt_sx
    GreaterThanInteger(IntegerType, SignExtension),
    /// fnn.gt
    GreaterThanFloat(FloatType),
    /// inn.le_sx
    LessThanOrEqualToInteger(IntegerType, SignExtension),
    /// fnn.le
    LessThanOrEqualToFloat(FloatType),
    /// inn.ge_sx
    GreaterThanOrEqualToInteger(IntegerType, SignExtension),
    /// fnn.ge
    GreaterThanOrEqualToFloat(FloatType),
    /// inn.extend8_s
    ExtendSigned8(IntegerType),
    /// inn.extend16_s
    ExtendSigned16(IntegerType),
    /// i64.extend32_s
    ExtendSigned32,
    /// i32.wrap_i64
    Wrap,
    /// i64.extend_i32_sx
    ExtendWithSignExtension(SignExtension),
    /// inn.trunc_fmm_sx
    ConvertAndTruncate(IntegerType, FloatType, SignExtension),
    /// inn.trunc_sat_fmm_sx
    ConvertAndTruncateWithSaturation(IntegerType, FloatType, SignExtension),
    /// f32.demote_f64
    Demote,
    /// f64.promote_f32
    Promote,
    /// fnn.convert_imm_sx
    Convert(FloatType, IntegerType, SignExtension),
    /// inn.reinterpret_fmm
    ReinterpretFloat(IntegerType),
    /// fnn.reinterpret_imm
    ReinterpretInteger(FloatType),
}

impl From<NumericInstruction> for Instruction {
    fn from(instruction: NumericInstruction) -> Self {
        Instruction::Numeric(instruction)
    }
}

impl From<i32> for Instruction {
    fn from(value: i32) -> Self {
        NumericInstruction::I32Constant(value).into()
    }
}

impl From<i64> for Instruction {
    fn from(value: i64) -> Self {
        NumericInstruction::I64Constant(value).into()
    }
}

impl From<f32> for Instruction {
    fn from(value: f32) -> Self {
        NumericInstruction::F32Constant(value).into()
    }
}

impl From<f64> for Instruction {
    fn from(value: f64) -> Self {
        NumericInstruction::F64Constant(value).into()
    }
}

/// Instructions producing or inspecting references to functions.
/// The only reference type in this engine is the function reference;
/// a reference is either null or designates a function instance.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#reference-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReferenceInstruction {
    /// ref.null func
    Null,
    /// ref.is_null
    IsNull,
    /// ref.func funcidx
    Function(FunctionIndex),
}

impl From<ReferenceInstruction> for Instruction {
    fn from(instruction: ReferenceInstruction) -> Self {
        Instruction::Reference(instruction)
    }
}

/// Parametric instructions operate on operands of any value type.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#parametric-instructions>
#[derive(Clone, Debug, PartialEq)]
pub enum ParametricInstruction {
    /// drop
    Drop,
    /// select, optionally annotated with the type of its operands
    Select(Option<Vec<ValueType>>),
}

impl From<ParametricInstruction> for Instruction {
    fn from(instruction: ParametricInstruction) -> Self {
        Instruction::Parametric(instruction)
    }
}

/// Variable instructions access local variables of the current frame or module globals.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#variable-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VariableInstruction {
    /// local.get
    LocalGet(LocalIndex),
    /// local.set
    LocalSet(LocalIndex),
    /// local.tee
    LocalTee(LocalIndex),
    /// global.get
    GlobalGet(GlobalIndex),
    /// global.set
    GlobalSet(GlobalIndex),
}

impl From<VariableInstruction> for Instruction {
    fn from(instruction: VariableInstruction) -> Self {
        Instruction::Variable(instruction)
    }
}

/// Table instructions initialize a table from a passive element segment and drop segments.
/// Tables are otherwise only read through `call_indirect`;
/// the table mutation operators of later proposals are out of scope.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#table-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableInstruction {
    /// table.init elemidx (into the given table)
    Init(ElementIndex, TableIndex),
    /// elem.drop elemidx
    ElementDrop(ElementIndex),
}

impl From<TableInstruction> for Instruction {
    fn from(instruction: TableInstruction) -> Self {
        Instruction::Table(instruction)
    }
}

/// The static immediate of every load and store: an alignment exponent and an address offset.
/// The alignment is a hint only and does not affect semantics.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#memory-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryArgument {
    align: u32,
    offset: u32,
}

impl MemoryArgument {
    /// Creates a new memory argument with the given alignment exponent and offset.
    pub fn new(align: u32, offset: u32) -> Self {
        MemoryArgument { align, offset }
    }

    /// The alignment exponent; the hinted alignment is 2 to its power.
    pub fn align(&self) -> u32 {
        self.align
    }

    /// The static offset added to the dynamic base address.
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Memory instructions read and write linear memory.
/// Integer loads and stores can operate on a width smaller than the respective value type,
/// extending on load and wrapping on store.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#memory-instructions>
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MemoryInstruction {
    /// xnn.load
    Load(NumberType, MemoryArgument),
    /// xnn.store
    Store(NumberType, MemoryArgument),
    /// inn.load8_sx
    Load8(IntegerType, SignExtension, MemoryArgument),
    /// inn.load16_sx
    Load16(IntegerType, SignExtension, MemoryArgument),
    /// i64.load32_sx
    Load32(SignExtension, MemoryArgument),
    /// inn.store8
    Store8(IntegerType, MemoryArgument),
    /// inn.store16
    Store16(IntegerType, MemoryArgument),
    /// i64.store32
    Store32(MemoryArgument),
    /// memory.size
    Size,
    /// memory.grow
    Grow,
    /// memory.init dataidx
    Init(DataIndex),
    /// memory.copy
    Copy,
    /// memory.fill
    Fill,
    /// data.drop dataidx
    DataDrop(DataIndex),
}

impl From<MemoryInstruction> for Instruction {
    fn from(instruction: MemoryInstruction) -> Self {
        Instruction::Memory(instruction)
    }
}

/// The type of a block, loop, or if:
/// either no result, a single inline value type, or a reference to a function type.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#control-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockType {
    None,
    ValueType(ValueType),
    Index(TypeIndex),
}

/// Control instructions steer execution:
/// structured blocks, branches, calls, and the trapping `unreachable`.
/// Structured instructions carry their nested instruction sequences;
/// branch targets are label depths resolved dynamically against the control stack.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#control-instructions>
#[derive(Clone, Debug, PartialEq)]
pub enum ControlInstruction {
    /// nop
    Nop,
    /// unreachable
    Unreachable,
    /// block blocktype instr* end
    Block(BlockType, Expression),
    /// loop blocktype instr* end
    Loop(BlockType, Expression),
    /// if blocktype instr* else instr* end
    If(BlockType, Expression, Option<Expression>),
    /// br labelidx
    Branch(LabelIndex),
    /// br_if labelidx
    BranchIf(LabelIndex),
    /// br_table labelidx* labelidx
    BranchTable(Vec<LabelIndex>, LabelIndex),
    /// return
    Return,
    /// call funcidx
    Call(FunctionIndex),
    /// call_indirect typeidx (through the given table)
    CallIndirect(TypeIndex, TableIndex),
}

impl From<ControlInstruction> for Instruction {
    fn from(instruction: ControlInstruction) -> Self {
        Instruction::Control(instruction)
    }
}

/// Function bodies, initialization expressions, and the nested sequences of structured
/// instructions are expressions:
/// ordered sequences of instructions terminated in the binary format by an explicit end marker.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#expressions>
///
/// # Examples
/// ```rust
/// use wasm_vm::{Expression, Instruction, NumberType, NumericInstruction};
///
/// let expression = Expression::new(vec![
///     1i32.into(),
///     2i32.into(),
///     NumericInstruction::Add(NumberType::I32).into(),
/// ]);
///
/// assert_eq!(expression.instructions().len(), 3);
/// assert!(Expression::empty().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    instructions: Vec<Instruction>,
}

impl Expression {
    /// Creates a new expression from the given instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Expression { instructions }
    }

    /// Creates a new empty expression.
    pub fn empty() -> Self {
        Expression {
            instructions: vec![],
        }
    }

    /// The instructions for this expression.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns true if this `Expression` has no instructions, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<Instruction>> for Expression {
    fn from(instructions: Vec<Instruction>) -> Self {
        Expression { instructions }
    }
}
