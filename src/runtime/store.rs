use crate::interpreter::Evaluator;
use crate::parser::parse_binary;
use crate::runtime::errors::{HostError, InstantiationError, InvokeError, LinkError, Trap};
use crate::runtime::func::{FunctionCode, FunctionInstance};
use crate::runtime::global::GlobalInstance;
use crate::runtime::instance::{
    DataSegmentInstance, ElementSegmentInstance, ExternalValue, ModuleInstance,
};
use crate::runtime::memory::MemoryInstance;
use crate::runtime::table::TableInstance;
use crate::runtime::Value;
use crate::{
    DataIndex, DataMode, ElementIndex, ElementMode, Expression, FunctionType, GlobalType,
    Instruction, Limit, MemoryType, Module, NumericInstruction, ReferenceInstruction, TableType,
    VariableInstruction,
};
use log::{debug, trace};
use std::collections::HashMap;

/// The runtime address of a function within a store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FunctionAddress(pub(crate) usize);

/// The runtime address of a linear memory within a store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MemoryAddress(pub(crate) usize);

/// The runtime address of a table within a store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableAddress(pub(crate) usize);

/// The runtime address of a global within a store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct GlobalAddress(pub(crate) usize);

/// The handle of an instantiated module within a store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModuleHandle(pub(crate) usize);

/// Execution limits enforced by a store.
/// The call depth bound turns runaway recursion into a `StackOverflow` trap
/// before the host stack is exhausted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StoreLimits {
    max_call_depth: usize,
}

impl StoreLimits {
    /// Creates new limits with the given maximum call depth.
    pub fn new(max_call_depth: usize) -> Self {
        StoreLimits { max_call_depth }
    }

    /// The maximum number of nested function calls a single invocation may make.
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        StoreLimits {
            max_call_depth: 512,
        }
    }
}

/// The top-level container of the runtime:
/// the arena owning every function, memory, table, global, and module instance,
/// the registry of host-supplied imports, and the entry points for instantiation and invocation.
///
/// Runtime objects are addressed by index into the arena,
/// so instances and functions can refer to each other without ownership cycles.
/// A store and everything in it belong to one logical executor;
/// hosts sharing a store across threads must serialize access externally.
///
/// # Examples
/// ```rust
/// use wasm_vm::Store;
///
/// let mut store = Store::new();
/// let module = store
///     .instantiate(b"\x00\x61\x73\x6D\x01\x00\x00\x00")
///     .unwrap();
///
/// assert!(store.get_export(module, "missing").is_none());
/// ```
#[derive(Default)]
pub struct Store {
    functions: Vec<FunctionInstance>,
    memories: Vec<MemoryInstance>,
    tables: Vec<TableInstance>,
    globals: Vec<GlobalInstance>,
    instances: Vec<ModuleInstance>,
    imports: HashMap<(String, String), ExternalValue>,
    limits: StoreLimits,
}

impl Store {
    /// Creates a new empty store with default limits.
    pub fn new() -> Self {
        Store::with_limits(StoreLimits::default())
    }

    /// Creates a new empty store with the given limits.
    pub fn with_limits(limits: StoreLimits) -> Self {
        Store {
            functions: Vec::new(),
            memories: Vec::new(),
            tables: Vec::new(),
            globals: Vec::new(),
            instances: Vec::new(),
            imports: HashMap::new(),
            limits,
        }
    }

    /// The execution limits of this store.
    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    /// Registers a runtime object under a two-level name,
    /// making it available to the imports of subsequently instantiated modules.
    /// Registering the same name again replaces the previous object.
    pub fn register_import(&mut self, namespace: &str, name: &str, value: ExternalValue) {
        self.imports
            .insert((namespace.to_string(), name.to_string()), value);
    }

    /// Allocates a host function with the given signature and registers it as an import.
    /// Returns the address of the new function.
    pub fn register_function(
        &mut self,
        namespace: &str,
        name: &str,
        signature: FunctionType,
        callable: impl Fn(&[Value]) -> Result<Option<Value>, HostError> + 'static,
    ) -> FunctionAddress {
        let address = FunctionAddress(self.functions.len());

        self.functions
            .push(FunctionInstance::host(signature, callable));
        self.register_import(namespace, name, ExternalValue::Function(address));

        address
    }

    /// Allocates a new linear memory, e.g. to satisfy a memory import.
    pub fn allocate_memory(&mut self, kind: MemoryType) -> MemoryAddress {
        let address = MemoryAddress(self.memories.len());

        self.memories.push(MemoryInstance::new(kind));

        address
    }

    /// Allocates a new table, e.g. to satisfy a table import.
    pub fn allocate_table(&mut self, kind: TableType) -> TableAddress {
        let address = TableAddress(self.tables.len());

        self.tables.push(TableInstance::new(kind));

        address
    }

    /// Allocates a new global holding the given value, e.g. to satisfy a global import.
    pub fn allocate_global(
        &mut self,
        kind: GlobalType,
        value: Value,
    ) -> Result<GlobalAddress, LinkError> {
        let address = GlobalAddress(self.globals.len());
        let global = GlobalInstance::new(kind, value).map_err(|_| {
            LinkError::UnsupportedInitializer {
                index: address.0 as u32,
            }
        })?;

        self.globals.push(global);

        Ok(address)
    }

    /// The function at the given address.
    pub fn function(&self, address: FunctionAddress) -> &FunctionInstance {
        &self.functions[address.0]
    }

    /// The memory at the given address.
    pub fn memory(&self, address: MemoryAddress) -> &MemoryInstance {
        &self.memories[address.0]
    }

    /// The memory at the given address, mutably; hosts use this to marshal data directly.
    pub fn memory_mut(&mut self, address: MemoryAddress) -> &mut MemoryInstance {
        &mut self.memories[address.0]
    }

    /// The table at the given address.
    pub fn table(&self, address: TableAddress) -> &TableInstance {
        &self.tables[address.0]
    }

    /// The table at the given address, mutably.
    pub fn table_mut(&mut self, address: TableAddress) -> &mut TableInstance {
        &mut self.tables[address.0]
    }

    /// The global at the given address.
    pub fn global(&self, address: GlobalAddress) -> &GlobalInstance {
        &self.globals[address.0]
    }

    /// The global at the given address, mutably.
    pub fn global_mut(&mut self, address: GlobalAddress) -> &mut GlobalInstance {
        &mut self.globals[address.0]
    }

    /// The module instance behind the given handle.
    pub fn instance(&self, handle: ModuleHandle) -> &ModuleInstance {
        &self.instances[handle.0]
    }

    pub(crate) fn instance_mut(&mut self, handle: ModuleHandle) -> &mut ModuleInstance {
        &mut self.instances[handle.0]
    }

    /// Decodes and instantiates a module from its binary encoding.
    pub fn instantiate(&mut self, bytes: &[u8]) -> Result<ModuleHandle, InstantiationError> {
        let module = parse_binary(bytes)?;

        Ok(self.instantiate_module(&module)?)
    }

    /// Instantiates an already decoded module:
    /// resolves its imports, allocates its definitions, runs its initializers in the order
    /// memories/tables/globals → active element segments → active data segments → start,
    /// and returns a handle to the new instance.
    ///
    /// On any failure the instance is discarded and every object allocated for it is released;
    /// writes already applied to imported memories and tables remain.
    pub fn instantiate_module(&mut self, module: &Module) -> Result<ModuleHandle, LinkError> {
        let functions = self.functions.len();
        let memories = self.memories.len();
        let tables = self.tables.len();
        let globals = self.globals.len();
        let instances = self.instances.len();

        match self.try_instantiate(module) {
            Ok(handle) => Ok(handle),
            Err(error) => {
                self.functions.truncate(functions);
                self.memories.truncate(memories);
                self.tables.truncate(tables);
                self.globals.truncate(globals);
                self.instances.truncate(instances);

                Err(error)
            }
        }
    }

    fn try_instantiate(&mut self, module: &Module) -> Result<ModuleHandle, LinkError> {
        let handle = ModuleHandle(self.instances.len());
        let (mut functions, mut tables, mut memories, mut globals) = self.resolve_imports(module)?;
        let imported_globals = globals.len();

        for function in module.functions() {
            let signature =
                module
                    .function_type(function.kind())
                    .ok_or(LinkError::UnknownIndex {
                        space: "type",
                        index: function.kind(),
                    })?;
            let code = FunctionCode::new(
                function.locals().kinds().to_vec(),
                function.body().clone(),
            );
            let address = FunctionAddress(self.functions.len());

            self.functions.push(FunctionInstance::wasm(
                signature.clone(),
                handle,
                code.into(),
            ));
            functions.push(address);
        }

        for table in module.tables() {
            tables.push(self.allocate_table(*table.kind()));
        }

        for memory in module.memories() {
            memories.push(self.allocate_memory(*memory.kind()));
        }

        for (index, global) in module.globals().iter().enumerate() {
            let index = index as u32;
            let value = self
                .evaluate_initializer(
                    global.initializer(),
                    &globals,
                    imported_globals,
                    &functions,
                )
                .ok_or(LinkError::UnsupportedInitializer { index })?;
            let address = GlobalAddress(self.globals.len());
            let instance = GlobalInstance::new(*global.kind(), value)
                .map_err(|_| LinkError::UnsupportedInitializer { index })?;

            self.globals.push(instance);
            globals.push(address);
        }

        use crate::ExportDescription;

        let mut exports = HashMap::new();

        for export in module.exports() {
            let value = match export.description() {
                ExportDescription::Function(index) => ExternalValue::Function(
                    functions
                        .get(*index as usize)
                        .copied()
                        .ok_or(LinkError::UnknownIndex {
                            space: "function",
                            index: *index,
                        })?,
                ),
                ExportDescription::Table(index) => {
                    ExternalValue::Table(tables.get(*index as usize).copied().ok_or(
                        LinkError::UnknownIndex {
                            space: "table",
                            index: *index,
                        },
                    )?)
                }
                ExportDescription::Memory(index) => {
                    ExternalValue::Memory(memories.get(*index as usize).copied().ok_or(
                        LinkError::UnknownIndex {
                            space: "memory",
                            index: *index,
                        },
                    )?)
                }
                ExportDescription::Global(index) => {
                    ExternalValue::Global(globals.get(*index as usize).copied().ok_or(
                        LinkError::UnknownIndex {
                            space: "global",
                            index: *index,
                        },
                    )?)
                }
            };

            exports.insert(export.name().as_str().to_string(), value);
        }

        let mut element_segments = Vec::with_capacity(module.elements().len());

        for (index, element) in module.elements().iter().enumerate() {
            let mut references = Vec::with_capacity(element.initializers().len());

            for initializer in element.initializers() {
                let value = self
                    .evaluate_initializer(initializer, &globals, imported_globals, &functions)
                    .and_then(|value| value.as_function_reference())
                    .ok_or(LinkError::UnsupportedInitializer {
                        index: index as u32,
                    })?;

                references.push(value);
            }

            element_segments.push(ElementSegmentInstance::new(references));
        }

        let data_segments = module
            .data()
            .iter()
            .map(|data| DataSegmentInstance::new(data.initializer().to_vec()))
            .collect();

        self.instances.push(ModuleInstance {
            functions,
            tables,
            memories,
            globals,
            types: module.function_types().to_vec(),
            exports,
            data_segments,
            element_segments,
        });

        debug!(
            "instantiated module {:?}: {} functions, {} tables, {} memories, {} globals",
            handle,
            self.instance(handle).functions.len(),
            self.instance(handle).tables.len(),
            self.instance(handle).memories.len(),
            self.instance(handle).globals.len(),
        );

        self.apply_element_segments(module, handle, imported_globals)?;
        self.apply_data_segments(module, handle, imported_globals)?;

        if let Some(start) = module.start() {
            let address =
                self.instance(handle)
                    .function(start.function())
                    .ok_or(LinkError::UnknownIndex {
                        space: "function",
                        index: start.function(),
                    })?;

            trace!("running start function {}", start.function());
            Evaluator::new(self)
                .call(address, Vec::new())
                .map_err(LinkError::StartTrapped)?;
        }

        Ok(handle)
    }

    /// Resolves the imports of a module against the registry,
    /// checking kind and type compatibility,
    /// and returns the resolved address vectors in declaration order.
    #[allow(clippy::type_complexity)]
    fn resolve_imports(
        &self,
        module: &Module,
    ) -> Result<
        (
            Vec<FunctionAddress>,
            Vec<TableAddress>,
            Vec<MemoryAddress>,
            Vec<GlobalAddress>,
        ),
        LinkError,
    > {
        use crate::ImportDescription;

        let mut functions = Vec::new();
        let mut tables = Vec::new();
        let mut memories = Vec::new();
        let mut globals = Vec::new();

        for import in module.imports() {
            let namespace = import.module().as_str().to_string();
            let name = import.name().as_str().to_string();
            let key = (namespace.clone(), name.clone());
            let resolved = self
                .imports
                .get(&key)
                .copied()
                .ok_or_else(|| LinkError::MissingImport {
                    namespace: namespace.clone(),
                    name: name.clone(),
                })?;

            match (import.description(), resolved) {
                (ImportDescription::Function(kind), ExternalValue::Function(address)) => {
                    let declared =
                        module
                            .function_type(*kind)
                            .ok_or(LinkError::UnknownIndex {
                                space: "type",
                                index: *kind,
                            })?;

                    if self.function(address).signature() != declared {
                        return Err(LinkError::SignatureMismatch { namespace, name });
                    }

                    functions.push(address);
                }
                (ImportDescription::Memory(kind), ExternalValue::Memory(address)) => {
                    let memory = self.memory(address);
                    let provided = Limit::new(memory.size_pages(), memory.limits().max());

                    if !provided.satisfies(kind.limits()) {
                        return Err(LinkError::LimitsMismatch { namespace, name });
                    }

                    memories.push(address);
                }
                (ImportDescription::Table(kind), ExternalValue::Table(address)) => {
                    let table = self.table(address);
                    let provided = Limit::new(table.size(), table.limits().max());

                    if !provided.satisfies(kind.limits()) {
                        return Err(LinkError::LimitsMismatch { namespace, name });
                    }

                    tables.push(address);
                }
                (ImportDescription::Global(kind), ExternalValue::Global(address)) => {
                    let global = self.global(address);

                    if global.kind().mutability() != kind.mutability() {
                        return Err(LinkError::MutabilityMismatch { namespace, name });
                    }

                    if global.kind().kind() != kind.kind() {
                        return Err(LinkError::SignatureMismatch { namespace, name });
                    }

                    globals.push(address);
                }
                _ => return Err(LinkError::KindMismatch { namespace, name }),
            }

            trace!("resolved import {}.{}", key.0, key.1);
        }

        Ok((functions, tables, memories, globals))
    }

    /// Evaluates a constant initializer expression.
    /// Supported forms: a numeric constant, `ref.null`, `ref.func`,
    /// and `global.get` of an imported immutable global.
    fn evaluate_initializer(
        &self,
        expression: &Expression,
        globals: &[GlobalAddress],
        imported_globals: usize,
        functions: &[FunctionAddress],
    ) -> Option<Value> {
        match expression.instructions() {
            [Instruction::Numeric(NumericInstruction::I32Constant(value))] => {
                Some(Value::I32(*value))
            }
            [Instruction::Numeric(NumericInstruction::I64Constant(value))] => {
                Some(Value::I64(*value))
            }
            [Instruction::Numeric(NumericInstruction::F32Constant(value))] => {
                Some(Value::F32(*value))
            }
            [Instruction::Numeric(NumericInstruction::F64Constant(value))] => {
                Some(Value::F64(*value))
            }
            [Instruction::Reference(ReferenceInstruction::Null)] => Some(Value::FuncRef(None)),
            [Instruction::Reference(ReferenceInstruction::Function(index))] => {
                let address = functions.get(*index as usize)?;

                Some(Value::FuncRef(Some(*address)))
            }
            [Instruction::Variable(VariableInstruction::GlobalGet(index))] => {
                let index = *index as usize;

                if index >= imported_globals {
                    return None;
                }

                let global = self.global(*globals.get(index)?);

                match global.kind().mutability() {
                    crate::Mutability::Immutable => Some(global.get()),
                    crate::Mutability::Mutable => None,
                }
            }
            _ => None,
        }
    }

    /// Applies the active element segments of a freshly created instance in declaration order,
    /// then marks active and declarative segments as dropped.
    /// Offset expressions follow the constant-expression grammar,
    /// so a `global.get` may only reference one of the first `imported_globals` globals.
    fn apply_element_segments(
        &mut self,
        module: &Module,
        handle: ModuleHandle,
        imported_globals: usize,
    ) -> Result<(), LinkError> {
        for (index, element) in module.elements().iter().enumerate() {
            let index = index as u32;

            match element.mode() {
                ElementMode::Passive => {}
                ElementMode::Declarative => {
                    self.instance_mut(handle).drop_element(index);
                }
                ElementMode::Active(table, offset) => {
                    let instance = self.instance(handle);
                    let offset = self
                        .evaluate_initializer(
                            offset,
                            &instance.globals,
                            imported_globals,
                            &instance.functions,
                        )
                        .and_then(|value| value.as_i32())
                        .ok_or(LinkError::UnsupportedInitializer { index })?;
                    let address =
                        self.instance(handle)
                            .table(*table)
                            .ok_or(LinkError::UnknownIndex {
                                space: "table",
                                index: *table,
                            })?;
                    let length = self.instance(handle).element_segments[index as usize]
                        .references()
                        .len() as u64;

                    self.initialize_table(handle, index, address, offset as u32 as u64, 0, length)
                        .map_err(LinkError::StartTrapped)?;
                    self.instance_mut(handle).drop_element(index);
                }
            }
        }

        Ok(())
    }

    /// Applies the active data segments of a freshly created instance in declaration order,
    /// then marks the active ones as dropped.
    /// Offset expressions follow the constant-expression grammar,
    /// so a `global.get` may only reference one of the first `imported_globals` globals.
    fn apply_data_segments(
        &mut self,
        module: &Module,
        handle: ModuleHandle,
        imported_globals: usize,
    ) -> Result<(), LinkError> {
        for (index, data) in module.data().iter().enumerate() {
            let index = index as u32;

            match data.mode() {
                DataMode::Passive => {}
                DataMode::Active(memory, offset) => {
                    let instance = self.instance(handle);
                    let offset = self
                        .evaluate_initializer(
                            offset,
                            &instance.globals,
                            imported_globals,
                            &instance.functions,
                        )
                        .and_then(|value| value.as_i32())
                        .ok_or(LinkError::UnsupportedInitializer { index })?;
                    let address =
                        self.instance(handle)
                            .memory(*memory)
                            .ok_or(LinkError::UnknownIndex {
                                space: "memory",
                                index: *memory,
                            })?;
                    let length = data.initializer().len() as u64;

                    self.initialize_memory(handle, index, address, offset as u32 as u64, 0, length)
                        .map_err(LinkError::StartTrapped)?;
                    self.instance_mut(handle).drop_data(index);
                }
            }
        }

        Ok(())
    }

    /// Copies a range of one of an instance's data segments into a memory,
    /// validating both ranges before writing.
    pub(crate) fn initialize_memory(
        &mut self,
        handle: ModuleHandle,
        segment: DataIndex,
        memory: MemoryAddress,
        destination: u64,
        source: u64,
        length: u64,
    ) -> Result<(), Trap> {
        let instance = &self.instances[handle.0];
        let segment = instance
            .data_segment(segment)
            .ok_or(Trap::OutOfBoundsMemory)?;

        self.memories[memory.0].init(destination, segment.bytes(), source, length)
    }

    /// Copies a range of one of an instance's element segments into a table,
    /// validating both ranges before writing.
    pub(crate) fn initialize_table(
        &mut self,
        handle: ModuleHandle,
        segment: ElementIndex,
        table: TableAddress,
        destination: u64,
        source: u64,
        length: u64,
    ) -> Result<(), Trap> {
        let instance = &self.instances[handle.0];
        let segment = instance
            .element_segment(segment)
            .ok_or(Trap::OutOfBoundsTable)?;

        self.tables[table.0].init(destination, segment.references(), source, length)
    }

    /// Invokes an exported function of an instance with the given arguments.
    /// The export must be a function,
    /// and the arguments must match its parameter types exactly;
    /// no implicit conversions are applied.
    /// On success the single result of the function is returned, or `None` for a void function.
    pub fn invoke(
        &mut self,
        handle: ModuleHandle,
        name: &str,
        arguments: &[Value],
    ) -> Result<Option<Value>, InvokeError> {
        let export = self
            .instance(handle)
            .export(name)
            .copied()
            .ok_or_else(|| InvokeError::UnknownExport(name.to_string()))?;
        let address = match export {
            ExternalValue::Function(address) => address,
            _ => return Err(InvokeError::NotAFunction(name.to_string())),
        };
        let signature = self.function(address).signature().clone();

        if arguments.len() != signature.parameters().len() {
            return Err(InvokeError::ArityMismatch {
                expected: signature.parameters().len(),
                actual: arguments.len(),
            });
        }

        for (index, (argument, kind)) in arguments
            .iter()
            .zip(signature.parameters().kinds())
            .enumerate()
        {
            if argument.kind() != *kind {
                return Err(InvokeError::ArgumentTypeMismatch { index });
            }
        }

        trace!("invoking export {name} with {} arguments", arguments.len());

        let mut results = Evaluator::new(self).call(address, arguments.to_vec())?;

        Ok(results.pop())
    }

    /// The export of an instance with the given name, if any.
    pub fn get_export(&self, handle: ModuleHandle, name: &str) -> Option<ExternalValue> {
        self.instance(handle).export(name).copied()
    }
}
