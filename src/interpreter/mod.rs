//! The execution core: a tree-walking evaluator over decoded function bodies.
//!
//! Each call owns its operand stack and a frame of locals.
//! The nesting of the decoded expressions mirrors the label stack of the abstract machine,
//! so structured control flow is executed by recursion,
//! with branches threaded outward through an [`Outcome`] until they reach their target label.

mod numeric;

use crate::runtime::{
    FunctionAddress, FunctionInstance, MemoryAddress, ModuleHandle, ModuleInstance, Store, Trap,
    Value,
};
use crate::{
    BlockType, ControlInstruction, Expression, Instruction, IntegerType, MemoryArgument,
    MemoryInstruction, NumberType, ParametricInstruction, ReferenceInstruction, SignExtension,
    TableInstruction, VariableInstruction,
};
use log::trace;

/// How the evaluation of an instruction sequence ended.
enum Outcome {
    /// The sequence ran to its end.
    Completed,
    /// A branch targets the label at the given depth, 0 being the innermost enclosing label.
    Branched(u32),
    /// A return unwinds the entire call frame.
    Returned,
}

/// The frame of a single call: the owning instance and the locals
/// (parameters first, then the declared locals).
struct Frame {
    module: ModuleHandle,
    locals: Vec<Value>,
}

/// Evaluates function bodies against a store.
/// The evaluator tracks the call depth across nested calls
/// and traps with `StackOverflow` when the store's bound is exceeded.
pub(crate) struct Evaluator<'store> {
    store: &'store mut Store,
    depth: usize,
}

impl<'store> Evaluator<'store> {
    pub(crate) fn new(store: &'store mut Store) -> Self {
        Evaluator { store, depth: 0 }
    }

    /// Calls the function at the given address with the given arguments,
    /// returning its results (one value per declared result type).
    pub(crate) fn call(
        &mut self,
        function: FunctionAddress,
        arguments: Vec<Value>,
    ) -> Result<Vec<Value>, Trap> {
        if self.depth >= self.store.limits().max_call_depth() {
            return Err(Trap::StackOverflow);
        }

        self.depth += 1;
        let result = self.dispatch(function, arguments);
        self.depth -= 1;

        result
    }

    fn dispatch(
        &mut self,
        function: FunctionAddress,
        arguments: Vec<Value>,
    ) -> Result<Vec<Value>, Trap> {
        match self.store.function(function) {
            FunctionInstance::Host {
                signature,
                callable,
            } => {
                let signature = signature.clone();
                let callable = callable.clone();

                trace!("calling host function at depth {}", self.depth);

                let result = callable(&arguments).map_err(Trap::Host)?;

                match (result, signature.results().kinds()) {
                    (None, []) => Ok(Vec::new()),
                    (Some(value), [kind]) if value.kind() == *kind => Ok(vec![value]),
                    _ => Err(Trap::Host(
                        "the host function returned a result that does not match its signature"
                            .into(),
                    )),
                }
            }
            FunctionInstance::Wasm {
                signature,
                module,
                code,
            } => {
                let arity = signature.results().len();
                let module = *module;
                let code = code.clone();
                let mut locals = arguments;

                locals.extend(code.locals().iter().map(|kind| Value::default_for(*kind)));

                let mut frame = Frame { module, locals };
                let mut stack = Vec::new();

                self.evaluate(code.body(), &mut frame, &mut stack)?;

                if stack.len() < arity {
                    return Err(Trap::Unreachable);
                }

                Ok(stack.split_off(stack.len() - arity))
            }
        }
    }

    fn instance(&self, frame: &Frame) -> &ModuleInstance {
        self.store.instance(frame.module)
    }

    /// Evaluates an instruction sequence.
    /// A branch or return outcome propagates outward to the enclosing structured instruction;
    /// an `end` reached at the outermost sequence of a body behaves like a return.
    fn evaluate(
        &mut self,
        expression: &Expression,
        frame: &mut Frame,
        stack: &mut Vec<Value>,
    ) -> Result<Outcome, Trap> {
        for instruction in expression.instructions() {
            match instruction {
                Instruction::Numeric(instruction) => numeric::evaluate(stack, instruction)?,
                Instruction::Reference(instruction) => {
                    self.evaluate_reference(instruction, frame, stack)?
                }
                Instruction::Parametric(instruction) => evaluate_parametric(instruction, stack)?,
                Instruction::Variable(instruction) => {
                    self.evaluate_variable(instruction, frame, stack)?
                }
                Instruction::Table(instruction) => self.evaluate_table(instruction, frame, stack)?,
                Instruction::Memory(instruction) => {
                    self.evaluate_memory(instruction, frame, stack)?
                }
                Instruction::Control(instruction) => {
                    match self.evaluate_control(instruction, frame, stack)? {
                        Outcome::Completed => {}
                        outcome => return Ok(outcome),
                    }
                }
            }
        }

        Ok(Outcome::Completed)
    }

    fn evaluate_control(
        &mut self,
        instruction: &ControlInstruction,
        frame: &mut Frame,
        stack: &mut Vec<Value>,
    ) -> Result<Outcome, Trap> {
        match instruction {
            ControlInstruction::Nop => Ok(Outcome::Completed),
            ControlInstruction::Unreachable => Err(Trap::Unreachable),
            ControlInstruction::Block(kind, body) => {
                let arity = self.block_arity(frame, kind)?;
                let height = stack.len();

                match self.evaluate(body, frame, stack)? {
                    Outcome::Branched(0) => {
                        unwind(stack, height, arity)?;

                        Ok(Outcome::Completed)
                    }
                    Outcome::Branched(depth) => Ok(Outcome::Branched(depth - 1)),
                    outcome => Ok(outcome),
                }
            }
            ControlInstruction::Loop(_, body) => {
                let height = stack.len();

                loop {
                    match self.evaluate(body, frame, stack)? {
                        Outcome::Branched(0) => stack.truncate(height),
                        Outcome::Branched(depth) => return Ok(Outcome::Branched(depth - 1)),
                        Outcome::Completed => return Ok(Outcome::Completed),
                        Outcome::Returned => return Ok(Outcome::Returned),
                    }
                }
            }
            ControlInstruction::If(kind, consequent, alternative) => {
                let condition = pop_i32(stack)?;
                let arity = self.block_arity(frame, kind)?;
                let height = stack.len();
                let chosen = if condition != 0 {
                    Some(consequent)
                } else {
                    alternative.as_ref()
                };

                match chosen {
                    None => Ok(Outcome::Completed),
                    Some(body) => match self.evaluate(body, frame, stack)? {
                        Outcome::Branched(0) => {
                            unwind(stack, height, arity)?;

                            Ok(Outcome::Completed)
                        }
                        Outcome::Branched(depth) => Ok(Outcome::Branched(depth - 1)),
                        outcome => Ok(outcome),
                    },
                }
            }
            ControlInstruction::Branch(label) => Ok(Outcome::Branched(*label)),
            ControlInstruction::BranchIf(label) => {
                if pop_i32(stack)? != 0 {
                    Ok(Outcome::Branched(*label))
                } else {
                    Ok(Outcome::Completed)
                }
            }
            ControlInstruction::BranchTable(labels, default) => {
                let index = pop_i32(stack)? as u32 as usize;
                let label = labels.get(index).copied().unwrap_or(*default);

                Ok(Outcome::Branched(label))
            }
            ControlInstruction::Return => Ok(Outcome::Returned),
            ControlInstruction::Call(function) => {
                let address = self
                    .instance(frame)
                    .function(*function)
                    .ok_or(Trap::Unreachable)?;

                self.call_through_stack(address, stack)?;

                Ok(Outcome::Completed)
            }
            ControlInstruction::CallIndirect(kind, table) => {
                let index = pop_i32(stack)? as u32;
                let address = self
                    .instance(frame)
                    .table(*table)
                    .ok_or(Trap::Unreachable)?;
                let entry = self.store.table(address).get(index)?;
                let function = entry.ok_or(Trap::UndefinedElement)?;
                let expected = self
                    .instance(frame)
                    .function_type(*kind)
                    .ok_or(Trap::Unreachable)?
                    .clone();

                if self.store.function(function).signature() != &expected {
                    return Err(Trap::IndirectCallTypeMismatch);
                }

                self.call_through_stack(function, stack)?;

                Ok(Outcome::Completed)
            }
        }
    }

    /// Pops the callee's arguments off the operand stack, calls it,
    /// and pushes its results back.
    fn call_through_stack(
        &mut self,
        function: FunctionAddress,
        stack: &mut Vec<Value>,
    ) -> Result<(), Trap> {
        let parameters = self.store.function(function).signature().parameters().len();

        if stack.len() < parameters {
            return Err(Trap::Unreachable);
        }

        let arguments = stack.split_off(stack.len() - parameters);
        let results = self.call(function, arguments)?;

        stack.extend(results);

        Ok(())
    }

    /// The number of values a branch to the label of the given block type carries.
    fn block_arity(&self, frame: &Frame, kind: &BlockType) -> Result<usize, Trap> {
        match kind {
            BlockType::None => Ok(0),
            BlockType::ValueType(_) => Ok(1),
            BlockType::Index(index) => Ok(self
                .instance(frame)
                .function_type(*index)
                .ok_or(Trap::Unreachable)?
                .results()
                .len()),
        }
    }

    fn evaluate_reference(
        &mut self,
        instruction: &ReferenceInstruction,
        frame: &Frame,
        stack: &mut Vec<Value>,
    ) -> Result<(), Trap> {
        match instruction {
            ReferenceInstruction::Null => stack.push(Value::FuncRef(None)),
            ReferenceInstruction::IsNull => {
                let reference = pop_reference(stack)?;

                stack.push(Value::I32(reference.is_none() as i32));
            }
            ReferenceInstruction::Function(index) => {
                let address = self
                    .instance(frame)
                    .function(*index)
                    .ok_or(Trap::Unreachable)?;

                stack.push(Value::FuncRef(Some(address)));
            }
        }

        Ok(())
    }

    fn evaluate_variable(
        &mut self,
        instruction: &VariableInstruction,
        frame: &mut Frame,
        stack: &mut Vec<Value>,
    ) -> Result<(), Trap> {
        match instruction {
            VariableInstruction::LocalGet(index) => {
                let value = frame
                    .locals
                    .get(*index as usize)
                    .copied()
                    .ok_or(Trap::Unreachable)?;

                stack.push(value);
            }
            VariableInstruction::LocalSet(index) => {
                let value = pop(stack)?;
                let local = frame
                    .locals
                    .get_mut(*index as usize)
                    .ok_or(Trap::Unreachable)?;

                *local = value;
            }
            VariableInstruction::LocalTee(index) => {
                let value = pop(stack)?;
                let local = frame
                    .locals
                    .get_mut(*index as usize)
                    .ok_or(Trap::Unreachable)?;

                *local = value;
                stack.push(value);
            }
            VariableInstruction::GlobalGet(index) => {
                let address = self
                    .instance(frame)
                    .global(*index)
                    .ok_or(Trap::Unreachable)?;

                stack.push(self.store.global(address).get());
            }
            VariableInstruction::GlobalSet(index) => {
                let value = pop(stack)?;
                let address = self
                    .instance(frame)
                    .global(*index)
                    .ok_or(Trap::Unreachable)?;

                self.store
                    .global_mut(address)
                    .set(value)
                    .map_err(|_| Trap::Unreachable)?;
            }
        }

        Ok(())
    }

    fn evaluate_table(
        &mut self,
        instruction: &TableInstruction,
        frame: &Frame,
        stack: &mut Vec<Value>,
    ) -> Result<(), Trap> {
        match instruction {
            TableInstruction::Init(element, table) => {
                let length = pop_i32(stack)? as u32 as u64;
                let source = pop_i32(stack)? as u32 as u64;
                let destination = pop_i32(stack)? as u32 as u64;
                let address = self
                    .instance(frame)
                    .table(*table)
                    .ok_or(Trap::Unreachable)?;

                self.store
                    .initialize_table(frame.module, *element, address, destination, source, length)
            }
            TableInstruction::ElementDrop(element) => self
                .store
                .instance_mut(frame.module)
                .drop_element(*element)
                .ok_or(Trap::Unreachable),
        }
    }

    fn evaluate_memory(
        &mut self,
        instruction: &MemoryInstruction,
        frame: &Frame,
        stack: &mut Vec<Value>,
    ) -> Result<(), Trap> {
        let address = self.memory_address(frame)?;

        match instruction {
            MemoryInstruction::Load(kind, memarg) => {
                let effective = effective_address(stack, memarg)?;
                let memory = self.store.memory(address);
                let value = match kind {
                    NumberType::I32 => Value::I32(i32::from_le_bytes(memory.load(effective)?)),
                    NumberType::I64 => Value::I64(i64::from_le_bytes(memory.load(effective)?)),
                    NumberType::F32 => Value::F32(f32::from_le_bytes(memory.load(effective)?)),
                    NumberType::F64 => Value::F64(f64::from_le_bytes(memory.load(effective)?)),
                };

                stack.push(value);
            }
            MemoryInstruction::Load8(kind, sign, memarg) => {
                let effective = effective_address(stack, memarg)?;
                let [byte] = self.store.memory(address).load::<1>(effective)?;
                let value = match (kind, sign) {
                    (IntegerType::I32, SignExtension::Signed) => Value::I32(byte as i8 as i32),
                    (IntegerType::I32, SignExtension::Unsigned) => Value::I32(byte as i32),
                    (IntegerType::I64, SignExtension::Signed) => Value::I64(byte as i8 as i64),
                    (IntegerType::I64, SignExtension::Unsigned) => Value::I64(byte as i64),
                };

                stack.push(value);
            }
            MemoryInstruction::Load16(kind, sign, memarg) => {
                let effective = effective_address(stack, memarg)?;
                let bytes = self.store.memory(address).load::<2>(effective)?;
                let half = u16::from_le_bytes(bytes);
                let value = match (kind, sign) {
                    (IntegerType::I32, SignExtension::Signed) => Value::I32(half as i16 as i32),
                    (IntegerType::I32, SignExtension::Unsigned) => Value::I32(half as i32),
                    (IntegerType::I64, SignExtension::Signed) => Value::I64(half as i16 as i64),
                    (IntegerType::I64, SignExtension::Unsigned) => Value::I64(half as i64),
                };

                stack.push(value);
            }
            MemoryInstruction::Load32(sign, memarg) => {
                let effective = effective_address(stack, memarg)?;
                let bytes = self.store.memory(address).load::<4>(effective)?;
                let word = u32::from_le_bytes(bytes);
                let value = match sign {
                    SignExtension::Signed => Value::I64(word as i32 as i64),
                    SignExtension::Unsigned => Value::I64(word as i64),
                };

                stack.push(value);
            }
            MemoryInstruction::Store(kind, memarg) => {
                let value = pop(stack)?;
                let effective = effective_address(stack, memarg)?;
                let memory = self.store.memory_mut(address);

                match (kind, value) {
                    (NumberType::I32, Value::I32(value)) => {
                        memory.store(effective, value.to_le_bytes())?
                    }
                    (NumberType::I64, Value::I64(value)) => {
                        memory.store(effective, value.to_le_bytes())?
                    }
                    (NumberType::F32, Value::F32(value)) => {
                        memory.store(effective, value.to_le_bytes())?
                    }
                    (NumberType::F64, Value::F64(value)) => {
                        memory.store(effective, value.to_le_bytes())?
                    }
                    _ => return Err(Trap::Unreachable),
                }
            }
            MemoryInstruction::Store8(kind, memarg) => {
                let value = pop_integer(stack, kind)?;
                let effective = effective_address(stack, memarg)?;

                self.store
                    .memory_mut(address)
                    .store(effective, [value as u8])?;
            }
            MemoryInstruction::Store16(kind, memarg) => {
                let value = pop_integer(stack, kind)?;
                let effective = effective_address(stack, memarg)?;

                self.store
                    .memory_mut(address)
                    .store(effective, (value as u16).to_le_bytes())?;
            }
            MemoryInstruction::Store32(memarg) => {
                let value = pop_i64(stack)?;
                let effective = effective_address(stack, memarg)?;

                self.store
                    .memory_mut(address)
                    .store(effective, (value as u32).to_le_bytes())?;
            }
            MemoryInstruction::Size => {
                let pages = self.store.memory(address).size_pages();

                stack.push(Value::I32(pages as i32));
            }
            MemoryInstruction::Grow => {
                let delta = pop_i32(stack)? as u32;
                let previous = self.store.memory_mut(address).grow(delta);

                stack.push(Value::I32(match previous {
                    Some(pages) => pages as i32,
                    None => -1,
                }));
            }
            MemoryInstruction::Init(segment) => {
                let length = pop_i32(stack)? as u32 as u64;
                let source = pop_i32(stack)? as u32 as u64;
                let destination = pop_i32(stack)? as u32 as u64;

                self.store.initialize_memory(
                    frame.module,
                    *segment,
                    address,
                    destination,
                    source,
                    length,
                )?;
            }
            MemoryInstruction::Copy => {
                let length = pop_i32(stack)? as u32 as u64;
                let source = pop_i32(stack)? as u32 as u64;
                let destination = pop_i32(stack)? as u32 as u64;

                self.store
                    .memory_mut(address)
                    .copy_within(destination, source, length)?;
            }
            MemoryInstruction::Fill => {
                let length = pop_i32(stack)? as u32 as u64;
                let value = pop_i32(stack)? as u8;
                let destination = pop_i32(stack)? as u32 as u64;

                self.store
                    .memory_mut(address)
                    .fill(destination, value, length)?;
            }
            MemoryInstruction::DataDrop(segment) => {
                self.store
                    .instance_mut(frame.module)
                    .drop_data(*segment)
                    .ok_or(Trap::Unreachable)?;
            }
        }

        Ok(())
    }

    fn memory_address(&self, frame: &Frame) -> Result<MemoryAddress, Trap> {
        self.instance(frame).memory(0).ok_or(Trap::Unreachable)
    }
}

fn evaluate_parametric(
    instruction: &ParametricInstruction,
    stack: &mut Vec<Value>,
) -> Result<(), Trap> {
    match instruction {
        ParametricInstruction::Drop => {
            pop(stack)?;
        }
        ParametricInstruction::Select(_) => {
            let condition = pop_i32(stack)?;
            let second = pop(stack)?;
            let first = pop(stack)?;

            stack.push(if condition != 0 { first } else { second });
        }
    }

    Ok(())
}

/// Truncates the operand stack back to the height at a label's entry,
/// preserving the top `arity` values the branch carries to the label.
fn unwind(stack: &mut Vec<Value>, height: usize, arity: usize) -> Result<(), Trap> {
    if stack.len() < height + arity {
        return Err(Trap::Unreachable);
    }

    let preserved = stack.split_off(stack.len() - arity);

    stack.truncate(height);
    stack.extend(preserved);

    Ok(())
}

/// Computes the effective address of a memory access:
/// the popped 32-bit base plus the static offset, widened to 64 bits so it cannot wrap.
fn effective_address(stack: &mut Vec<Value>, memarg: &MemoryArgument) -> Result<u64, Trap> {
    let base = pop_i32(stack)? as u32;

    Ok(u64::from(base) + u64::from(memarg.offset()))
}

pub(crate) fn pop(stack: &mut Vec<Value>) -> Result<Value, Trap> {
    stack.pop().ok_or(Trap::Unreachable)
}

pub(crate) fn pop_i32(stack: &mut Vec<Value>) -> Result<i32, Trap> {
    match pop(stack)? {
        Value::I32(value) => Ok(value),
        _ => Err(Trap::Unreachable),
    }
}

pub(crate) fn pop_i64(stack: &mut Vec<Value>) -> Result<i64, Trap> {
    match pop(stack)? {
        Value::I64(value) => Ok(value),
        _ => Err(Trap::Unreachable),
    }
}

pub(crate) fn pop_f32(stack: &mut Vec<Value>) -> Result<f32, Trap> {
    match pop(stack)? {
        Value::F32(value) => Ok(value),
        _ => Err(Trap::Unreachable),
    }
}

pub(crate) fn pop_f64(stack: &mut Vec<Value>) -> Result<f64, Trap> {
    match pop(stack)? {
        Value::F64(value) => Ok(value),
        _ => Err(Trap::Unreachable),
    }
}

fn pop_reference(stack: &mut Vec<Value>) -> Result<Option<FunctionAddress>, Trap> {
    match pop(stack)? {
        Value::FuncRef(reference) => Ok(reference),
        _ => Err(Trap::Unreachable),
    }
}

/// Pops an integer of the given width, widened to i64.
fn pop_integer(stack: &mut Vec<Value>, kind: &IntegerType) -> Result<i64, Trap> {
    match kind {
        IntegerType::I32 => Ok(pop_i32(stack)? as i64),
        IntegerType::I64 => pop_i64(stack),
    }
}
