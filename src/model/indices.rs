//! Definitions are referenced with zero-based indices, one index space per class of definition.
//!
//! The index spaces for functions, tables, memories, and globals include the respective imports
//! declared in the same module; those imported indices precede the indices of definitions in the
//! module itself.
//!
//! Element indices reference element segments and data indices reference data segments.
//!
//! The index space for locals is only accessible inside a function;
//! it starts with the parameters of that function, which precede the declared local variables.
//!
//! Label indices reference structured control instructions inside an instruction sequence,
//! counted relatively from the innermost enclosing one.
//!
//! See <https://webassembly.github.io/spec/core/syntax/modules.html#indices>

pub type TypeIndex = u32;
pub type FunctionIndex = u32;
pub type TableIndex = u32;
pub type MemoryIndex = u32;
pub type GlobalIndex = u32;
pub type ElementIndex = u32;
pub type DataIndex = u32;
pub type LocalIndex = u32;
pub type LabelIndex = u32;
