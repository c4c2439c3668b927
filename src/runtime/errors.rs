use crate::parser::DecodeError;
use thiserror::Error;

/// The error type host functions may fail with.
/// A host error aborts the running invocation and surfaces as [`Trap::Host`];
/// the engine never converts it into a successful return.
pub type HostError = Box<dyn std::error::Error>;

/// Abrupt termination of a WebAssembly invocation.
/// A trap aborts the current invocation only;
/// the owning instance stays usable for subsequent invocations.
///
/// Each kind maps to a stable name via [`Trap::name`]; the mapping is part of the public contract.
#[derive(Error, Debug)]
pub enum Trap {
    #[error("An unreachable instruction was executed.")]
    Unreachable,
    #[error("A memory access is out of bounds.")]
    OutOfBoundsMemory,
    #[error("A table access is out of bounds.")]
    OutOfBoundsTable,
    #[error("An integer was divided by zero.")]
    DivideByZero,
    #[error("An integer operation overflowed.")]
    IntegerOverflow,
    #[error("A float could not be converted to an integer.")]
    InvalidConversionToInteger,
    #[error("An indirect call went through a null table element.")]
    UndefinedElement,
    #[error("An indirect call found a function of a different type than the call expects.")]
    IndirectCallTypeMismatch,
    #[error("The call stack was exhausted.")]
    StackOverflow,
    #[error("A host function failed: {0}")]
    Host(HostError),
}

impl Trap {
    /// The stable name of this kind of trap.
    pub fn name(&self) -> &'static str {
        match self {
            Trap::Unreachable => "Unreachable",
            Trap::OutOfBoundsMemory => "OutOfBoundsMemory",
            Trap::OutOfBoundsTable => "OutOfBoundsTable",
            Trap::DivideByZero => "DivideByZero",
            Trap::IntegerOverflow => "IntegerOverflow",
            Trap::InvalidConversionToInteger => "InvalidConversionToInteger",
            Trap::UndefinedElement => "UndefinedElement",
            Trap::IndirectCallTypeMismatch => "IndirectCallTypeMismatch",
            Trap::StackOverflow => "StackOverflow",
            Trap::Host(_) => "Host",
        }
    }
}

/// A failure to link a decoded module against the import registry,
/// or to run its initialization steps.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("The import {namespace}.{name} is not registered.")]
    MissingImport { namespace: String, name: String },
    #[error("The import {namespace}.{name} resolves to a different kind of object than declared.")]
    KindMismatch { namespace: String, name: String },
    #[error("The import {namespace}.{name} does not match the declared signature.")]
    SignatureMismatch { namespace: String, name: String },
    #[error("The limits of the import {namespace}.{name} do not satisfy the declared limits.")]
    LimitsMismatch { namespace: String, name: String },
    #[error("The global import {namespace}.{name} differs from the declaration in mutability.")]
    MutabilityMismatch { namespace: String, name: String },
    #[error("Initializer expression {index} is not a supported constant expression.")]
    UnsupportedInitializer { index: u32 },
    #[error("The module references index {index} outside the {space} index space.")]
    UnknownIndex { space: &'static str, index: u32 },
    #[error("Instantiation trapped: {0}")]
    StartTrapped(Trap),
}

/// A failure to instantiate a module from bytes:
/// either the bytes do not decode, or the decoded module does not link and initialize.
#[derive(Error, Debug)]
pub enum InstantiationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// A failure to invoke an exported function.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("The instance has no export named {0}.")]
    UnknownExport(String),
    #[error("The export {0} is not a function.")]
    NotAFunction(String),
    #[error("The function expects {expected} arguments, but {actual} were provided.")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Argument {index} does not match the parameter type of the function.")]
    ArgumentTypeMismatch { index: usize },
    #[error(transparent)]
    Trap(#[from] Trap),
}
