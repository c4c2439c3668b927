//! WebAssembly model of modules and their segments.

use crate::model::indices::*;
use crate::model::types::*;
use crate::model::{Expression, Name};
use crate::ModelError;
use std::convert::TryFrom;

/// A builder pattern for `Module`s.
/// The builder performs minimal validation when using the `add_*` family of methods;
/// it only checks that the added component would not exceed the index capacity of a u32.
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Creates a new empty builder of WebAssembly modules.
    pub fn new() -> Self {
        ModuleBuilder {
            module: Module::empty(),
        }
    }

    /// Sets the function types segment for the WebAssembly module to be built.
    pub fn set_function_types(&mut self, function_types: Vec<FunctionType>) {
        self.module.function_types = function_types;
    }

    /// Adds the function type to the module's segment.
    /// Returns the index of the type in the module.
    pub fn add_function_type(
        &mut self,
        function_type: FunctionType,
    ) -> Result<TypeIndex, ModelError> {
        let index = u32::try_from(self.module.function_types.len())?;

        self.module.function_types.push(function_type);

        Ok(index)
    }

    /// Sets the functions segment for the WebAssembly module to be built.
    pub fn set_functions(&mut self, functions: Vec<Function>) {
        self.module.functions = functions;
    }

    /// Adds the function to the module's segment.
    /// Returns the index of the function in the module.
    ///
    /// **Note:** In order for the returned index to be accurate,
    /// all function imports must be defined prior to adding any functions.
    pub fn add_function(&mut self, function: Function) -> Result<FunctionIndex, ModelError> {
        let imports = self
            .module
            .imports
            .iter()
            .filter(|import| matches!(import.description(), ImportDescription::Function(_)))
            .count();
        let index = u32::try_from(self.module.functions.len() + imports)?;

        self.module.functions.push(function);

        Ok(index)
    }

    /// Sets the table segment for the WebAssembly module to be built.
    pub fn set_tables(&mut self, tables: Vec<Table>) {
        self.module.tables = tables;
    }

    /// Adds the table to the module's segment.
    /// Returns the index of the table in the module.
    pub fn add_table(&mut self, table: Table) -> Result<TableIndex, ModelError> {
        let imports = self
            .module
            .imports
            .iter()
            .filter(|import| matches!(import.description(), ImportDescription::Table(_)))
            .count();
        let index = u32::try_from(self.module.tables.len() + imports)?;

        self.module.tables.push(table);

        Ok(index)
    }

    /// Sets the memories segment for the WebAssembly module to be built.
    pub fn set_memories(&mut self, memories: Vec<Memory>) {
        self.module.memories = memories;
    }

    /// Adds the memory to the module's segment.
    /// Returns the index of the memory in the module.
    pub fn add_memory(&mut self, memory: Memory) -> Result<MemoryIndex, ModelError> {
        let imports = self
            .module
            .imports
            .iter()
            .filter(|import| matches!(import.description(), ImportDescription::Memory(_)))
            .count();
        let index = u32::try_from(self.module.memories.len() + imports)?;

        self.module.memories.push(memory);

        Ok(index)
    }

    /// Sets the globals segment for the WebAssembly module to be built.
    pub fn set_globals(&mut self, globals: Vec<Global>) {
        self.module.globals = globals;
    }

    /// Adds the global to the module's segment.
    /// Returns the index of the global in the module.
    pub fn add_global(&mut self, global: Global) -> Result<GlobalIndex, ModelError> {
        let imports = self
            .module
            .imports
            .iter()
            .filter(|import| matches!(import.description(), ImportDescription::Global(_)))
            .count();
        let index = u32::try_from(self.module.globals.len() + imports)?;

        self.module.globals.push(global);

        Ok(index)
    }

    /// Sets the elements segment for the WebAssembly module to be built.
    pub fn set_elements(&mut self, elements: Vec<Element>) {
        self.module.elements = elements;
    }

    /// Adds the element to the module's segment.
    /// Returns the index of the element in the module.
    pub fn add_element(&mut self, element: Element) -> Result<ElementIndex, ModelError> {
        let index = u32::try_from(self.module.elements.len())?;

        self.module.elements.push(element);

        Ok(index)
    }

    /// Sets the data segment for the WebAssembly module to be built.
    pub fn set_data(&mut self, data: Vec<Data>) {
        self.module.data = data;
    }

    /// Adds the data to the module's segment.
    /// Returns the index of the data in the module.
    pub fn add_data(&mut self, datum: Data) -> Result<DataIndex, ModelError> {
        let index = u32::try_from(self.module.data.len())?;

        self.module.data.push(datum);

        Ok(index)
    }

    /// Sets the start segment for the WebAssembly module to be built.
    pub fn set_start(&mut self, start: Option<Start>) {
        self.module.start = start;
    }

    /// Sets the imports segment for the WebAssembly module to be built.
    pub fn set_imports(&mut self, imports: Vec<Import>) {
        self.module.imports = imports;
    }

    /// Adds the import to the module's segment.
    pub fn add_import(&mut self, import: Import) {
        self.module.imports.push(import);
    }

    /// Sets the exports segment for the WebAssembly module to be built.
    pub fn set_exports(&mut self, exports: Vec<Export>) {
        self.module.exports = exports;
    }

    /// Adds the export to the module's segment.
    pub fn add_export(&mut self, export: Export) {
        self.module.exports.push(export);
    }

    /// Sets the declared number of data segments for the WebAssembly module to be built.
    pub fn set_data_count(&mut self, data_count: Option<u32>) {
        self.module.data_count = data_count;
    }

    /// Builds the current segments into a module.
    pub fn build(self) -> Module {
        self.into()
    }
}

impl From<ModuleBuilder> for Module {
    fn from(builder: ModuleBuilder) -> Self {
        builder.module
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        ModuleBuilder::new()
    }
}

/// WebAssembly programs are organized into modules, which are the unit of deployment and loading.
/// A module collects definitions for types, functions, tables, memories, and globals.
/// In addition,
/// it can declare imports and exports and provide initialization in the form of data and element
/// segments, or a start function.
/// A decoded module is immutable; instantiation never modifies it.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#modules>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    function_types: Vec<FunctionType>,
    functions: Vec<Function>,
    tables: Vec<Table>,
    memories: Vec<Memory>,
    globals: Vec<Global>,
    elements: Vec<Element>,
    data: Vec<Data>,
    start: Option<Start>,
    imports: Vec<Import>,
    exports: Vec<Export>,
    data_count: Option<u32>,
}

impl Module {
    /// Creates a builder for WebAssembly modules.
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::new()
    }

    /// Creates a new empty `Module`.
    pub fn empty() -> Self {
        Module::default()
    }

    /// The 𝗍𝗒𝗉𝖾𝗌 component of a module defines a vector of function types.
    pub fn function_types(&self) -> &[FunctionType] {
        &self.function_types
    }

    /// The function type referenced by the given type index, if any.
    pub fn function_type(&self, index: TypeIndex) -> Option<&FunctionType> {
        self.function_types.get(index as usize)
    }

    /// The 𝖿𝗎𝗇𝖼𝗌 component of a module defines a vector of functions.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// The 𝗍𝖺𝖻𝗅𝖾𝗌 component of a module defines a vector of tables described by their table type.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// The 𝗆𝖾𝗆𝗌 component of a module defines a vector of linear memories described by their
    /// memory type.
    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    /// The 𝗀𝗅𝗈𝖻𝖺𝗅𝗌 component of a module defines a vector of global variables.
    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    /// The 𝖾𝗅𝖾𝗆𝗌 component of a module defines a vector of element segments.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The 𝖽𝖺𝗍𝖺𝗌 component of a module defines a vector of data segments.
    pub fn data(&self) -> &[Data] {
        &self.data
    }

    /// The 𝗌𝗍𝖺𝗋𝗍 component of a module declares the function index of a start function that is
    /// automatically invoked when the module is instantiated,
    /// after tables and memories have been initialized.
    pub fn start(&self) -> Option<&Start> {
        self.start.as_ref()
    }

    /// The 𝗂𝗆𝗉𝗈𝗋𝗍𝗌 component of a module defines a set of imports required for instantiation.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// The 𝖾𝗑𝗉𝗈𝗋𝗍𝗌 component of a module defines a set of exports that become accessible to the
    /// host environment once the module has been instantiated.
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// The number of data segments declared by the data count section, if present.
    pub fn data_count(&self) -> Option<u32> {
        self.data_count
    }
}

/// The 𝗍𝗒𝗉𝖾 of a function declares its signature by reference to a type defined in the module.
/// The 𝗅𝗈𝖼𝖺𝗅𝗌 declare a vector of mutable local variables and their types;
/// the parameters of the function precede the locals in the same index space.
/// The 𝖻𝗈𝖽𝗒 is an instruction sequence that upon termination must produce a stack matching the
/// function type's result type.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#functions>
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    kind: TypeIndex,
    locals: ResultType,
    body: Expression,
}

impl Function {
    /// Creates a new function with the given type index, locals, and body.
    pub fn new(kind: TypeIndex, locals: ResultType, body: Expression) -> Self {
        Function { kind, locals, body }
    }

    /// The index of the type definition for this `Function`.
    pub fn kind(&self) -> TypeIndex {
        self.kind
    }

    /// The types of the locals of this `Function`.
    pub fn locals(&self) -> &ResultType {
        &self.locals
    }

    /// The code for this `Function`.
    pub fn body(&self) -> &Expression {
        &self.body
    }
}

/// A table is a vector of function references.
/// The 𝗆𝗂𝗇 size in the limits of the table type specifies the initial size of that table,
/// while its 𝗆𝖺𝗑, if present, restricts the size to which it can grow later.
/// Tables can be initialized through element segments.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#tables>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Table {
    kind: TableType,
}

impl Table {
    /// Creates a new instance of a `Table`.
    pub fn new(kind: TableType) -> Self {
        Table { kind }
    }

    /// The type descriptor of this `Table`.
    pub fn kind(&self) -> &TableType {
        &self.kind
    }
}

impl From<TableType> for Table {
    fn from(kind: TableType) -> Self {
        Table { kind }
    }
}

/// A memory is a vector of raw uninterpreted bytes.
/// The limits are given in units of page size.
/// Memories can be initialized through data segments.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#memories>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Memory {
    kind: MemoryType,
}

impl Memory {
    /// Creates a new `Memory` of the given type.
    pub fn new(kind: MemoryType) -> Self {
        Memory { kind }
    }

    /// The type definition for this memory.
    pub fn kind(&self) -> &MemoryType {
        &self.kind
    }
}

impl<T> From<T> for Memory
where
    T: Into<MemoryType>,
{
    fn from(kind: T) -> Self {
        Memory { kind: kind.into() }
    }
}

/// Each global stores a single value of the given global type.
/// Its 𝗍𝗒𝗉𝖾 also specifies whether a global is immutable or mutable.
/// Moreover, each global is initialized with an 𝗂𝗇𝗂𝗍 value given by a constant
/// initializer expression.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#globals>
#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    kind: GlobalType,
    initializer: Expression,
}

impl Global {
    /// Creates a new `Global` with the given type and initializer.
    pub fn new(kind: GlobalType, initializer: Expression) -> Self {
        Global { kind, initializer }
    }

    /// Creates a new `Global` for a mutable global variable.
    pub fn mutable(kind: ValueType, initializer: Expression) -> Self {
        Global {
            kind: GlobalType::mutable(kind),
            initializer,
        }
    }

    /// Creates a new `Global` for an immutable global variable.
    pub fn immutable(kind: ValueType, initializer: Expression) -> Self {
        Global {
            kind: GlobalType::immutable(kind),
            initializer,
        }
    }

    /// The type of this `Global`.
    pub fn kind(&self) -> &GlobalType {
        &self.kind
    }

    /// The expression to initialize this `Global` with.
    pub fn initializer(&self) -> &Expression {
        &self.initializer
    }
}

/// Element segments initialize a subrange of a table from a static vector of function references,
/// given as constant expressions.
/// An active element segment copies its elements into a table during instantiation;
/// a passive segment is only available to `table.init`;
/// a declarative segment merely forward-declares references formed with `ref.func`.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#element-segments>
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    mode: ElementMode,
    initializers: Vec<Expression>,
}

impl Element {
    /// Creates a new instance of an element segment.
    pub fn new(mode: ElementMode, initializers: Vec<Expression>) -> Self {
        Element { mode, initializers }
    }

    /// Creates a passive element segment.
    pub fn passive(initializers: Vec<Expression>) -> Self {
        Element {
            mode: ElementMode::Passive,
            initializers,
        }
    }

    /// Creates an active element segment.
    pub fn active(table: TableIndex, offset: Expression, initializers: Vec<Expression>) -> Self {
        Element {
            mode: ElementMode::Active(table, offset),
            initializers,
        }
    }

    /// Creates a declarative element segment.
    pub fn declarative(initializers: Vec<Expression>) -> Self {
        Element {
            mode: ElementMode::Declarative,
            initializers,
        }
    }

    /// The initializers for the element segment.
    pub fn initializers(&self) -> &[Expression] {
        &self.initializers
    }

    /// The mode of the element segment.
    pub fn mode(&self) -> &ElementMode {
        &self.mode
    }
}

/// Element segments have a mode that identifies them as either passive, active, or declarative.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementMode {
    Passive,
    Active(TableIndex, Expression),
    Declarative,
}

/// Data segments initialize a range of memory from a static vector of bytes.
/// An active data segment copies its contents into a memory during instantiation;
/// a passive segment is only available to `memory.init`.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#data-segments>
#[derive(Clone, Debug, PartialEq)]
pub struct Data {
    mode: DataMode,
    initializer: Vec<u8>,
}

impl Data {
    /// Creates an instance of a data segment.
    pub fn new(mode: DataMode, initializer: Vec<u8>) -> Self {
        Data { mode, initializer }
    }

    /// Creates an instance of a passive data segment.
    pub fn passive(initializer: Vec<u8>) -> Self {
        Data {
            mode: DataMode::Passive,
            initializer,
        }
    }

    /// Creates an instance of an active data segment.
    pub fn active(memory: MemoryIndex, offset: Expression, initializer: Vec<u8>) -> Self {
        Data {
            mode: DataMode::Active(memory, offset),
            initializer,
        }
    }

    /// The mode of the data segment.
    pub fn mode(&self) -> &DataMode {
        &self.mode
    }

    /// The bytes to initialize the segment with.
    pub fn initializer(&self) -> &[u8] {
        &self.initializer
    }
}

/// Like element segments, data segments have a mode that identifies them as passive or active.
#[derive(Clone, Debug, PartialEq)]
pub enum DataMode {
    Passive,
    Active(MemoryIndex, Expression),
}

/// The 𝗌𝗍𝖺𝗋𝗍 component of a module declares the function index of a start function that
/// is automatically invoked when the module is instantiated,
/// after tables and memories have been initialized.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#start-function>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Start {
    function: FunctionIndex,
}

impl Start {
    /// Creates a new instance of `Start` referencing the given function.
    pub fn new(function: FunctionIndex) -> Self {
        Start { function }
    }

    /// The index of the function to run at module instantiation.
    pub fn function(&self) -> FunctionIndex {
        self.function
    }
}

impl From<u32> for Start {
    fn from(function: u32) -> Self {
        Start { function }
    }
}

/// The 𝗂𝗆𝗉𝗈𝗋𝗍𝗌 component of a module defines a set of imports required for instantiation.
/// Each import is labeled by a two-level name space,
/// consisting of a module name and a name for an entity within that module.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#imports>
///
/// # Examples
/// ```rust
/// use wasm_vm::{Import, ImportDescription, Name};
///
/// let import = Import::new("console".into(), "log".into(), ImportDescription::Function(0));
///
/// assert_eq!(import.module(), &Name::from("console"));
/// assert_eq!(import.name(), &Name::from("log"));
/// assert_eq!(import.description(), &ImportDescription::Function(0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    module: Name,
    name: Name,
    description: ImportDescription,
}

impl Import {
    /// Creates a new import for the given two-level name and description.
    pub fn new(module: Name, name: Name, description: ImportDescription) -> Self {
        Import {
            module,
            name,
            description,
        }
    }

    /// The name of the module (i.e. namespace) the import belongs to.
    pub fn module(&self) -> &Name {
        &self.module
    }

    /// The name of the imported entity within its module.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// A description of the imported entity.
    pub fn description(&self) -> &ImportDescription {
        &self.description
    }
}

/// Each import is specified by a descriptor with a respective type that a definition provided
/// during instantiation is required to match.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ImportDescription {
    Function(TypeIndex),
    Table(TableType),
    Memory(MemoryType),
    Global(GlobalType),
}

/// The 𝖾𝗑𝗉𝗈𝗋𝗍𝗌 component of a module defines a set of exports that become accessible to the
/// host environment once the module has been instantiated.
/// Exportable definitions are functions, tables, memories, and globals.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#exports>
///
/// # Examples
/// ```rust
/// use wasm_vm::{Export, ExportDescription, Name};
///
/// let export = Export::new("answer".into(), ExportDescription::Function(42));
///
/// assert_eq!(export.name(), &Name::from("answer"));
/// assert_eq!(export.description(), &ExportDescription::Function(42));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    name: Name,
    description: ExportDescription,
}

impl Export {
    /// Creates a new export with the given name and description.
    pub fn new(name: Name, description: ExportDescription) -> Self {
        Export { name, description }
    }

    /// The name of the export.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// A description of the exported entity.
    pub fn description(&self) -> &ExportDescription {
        &self.description
    }
}

/// Each export is specified by a descriptor with the index of the definition to be exported.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExportDescription {
    Function(FunctionIndex),
    Table(TableIndex),
    Memory(MemoryIndex),
    Global(GlobalIndex),
}

/// The identifiers of the sections of a module in the binary format.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#sections>
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ModuleSection {
    /// Custom sections are intended for debugging information or third-party extensions;
    /// this engine skips their contents.
    Custom = 0,
    Type = 1,
    Import = 2,
    Function = 3,
    Table = 4,
    Memory = 5,
    Global = 6,
    Export = 7,
    Start = 8,
    Element = 9,
    Code = 10,
    Data = 11,
    DataCount = 12,
}

impl TryFrom<u8> for ModuleSection {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(ModuleSection::Custom),
            1 => Ok(ModuleSection::Type),
            2 => Ok(ModuleSection::Import),
            3 => Ok(ModuleSection::Function),
            4 => Ok(ModuleSection::Table),
            5 => Ok(ModuleSection::Memory),
            6 => Ok(ModuleSection::Global),
            7 => Ok(ModuleSection::Export),
            8 => Ok(ModuleSection::Start),
            9 => Ok(ModuleSection::Element),
            10 => Ok(ModuleSection::Code),
            11 => Ok(ModuleSection::Data),
            12 => Ok(ModuleSection::DataCount),
            id => Err(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_tracks_imported_function_indices() {
        let mut builder = Module::builder();

        builder.add_import(Import::new(
            "env".into(),
            "callback".into(),
            ImportDescription::Function(0),
        ));

        let index = builder
            .add_function(Function::new(0, ResultType::empty(), Expression::empty()))
            .unwrap();

        assert_eq!(index, 1);
    }

    #[test]
    fn builder_counts_own_kind_of_imports_only() {
        let mut builder = Module::builder();

        builder.add_import(Import::new(
            "env".into(),
            "memory".into(),
            ImportDescription::Memory(MemoryType::new(Limit::unbounded(1))),
        ));

        let index = builder
            .add_function(Function::new(0, ResultType::empty(), Expression::empty()))
            .unwrap();

        assert_eq!(index, 0);
    }

    #[test]
    fn section_ids_round_trip() {
        for id in 0..=12u8 {
            let section = ModuleSection::try_from(id).unwrap();

            assert_eq!(section as u8, id);
        }

        assert!(ModuleSection::try_from(13).is_err());
    }
}
