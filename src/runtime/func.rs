use crate::runtime::errors::HostError;
use crate::runtime::{ModuleHandle, Value};
use crate::{Expression, FunctionType, ValueType};
use std::fmt;
use std::rc::Rc;

/// The callable of a host function:
/// it receives the argument values and returns at most one result, or a host error.
/// Host calls are opaque atomic steps to the engine;
/// a returned error unwinds the running invocation as a host trap.
pub type HostCallable = Rc<dyn Fn(&[Value]) -> Result<Option<Value>, HostError>>;

/// The code of a WebAssembly function:
/// the declared locals (parameters excluded) and the body expression.
/// The code is shared between the function instance and its running frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCode {
    locals: Vec<ValueType>,
    body: Expression,
}

impl FunctionCode {
    /// Creates new function code from the declared locals and the body.
    pub fn new(locals: Vec<ValueType>, body: Expression) -> Self {
        FunctionCode { locals, body }
    }

    /// The declared locals of the function, not counting its parameters.
    pub fn locals(&self) -> &[ValueType] {
        &self.locals
    }

    /// The body of the function.
    pub fn body(&self) -> &Expression {
        &self.body
    }
}

/// A function instance:
/// either a WebAssembly function tied to the module instance it was created with,
/// or a host-supplied callable.
/// The module back-reference is a store handle rather than a pointer,
/// which keeps the module↔function cycle out of the ownership graph.
#[derive(Clone)]
pub enum FunctionInstance {
    Wasm {
        signature: FunctionType,
        module: ModuleHandle,
        code: Rc<FunctionCode>,
    },
    Host {
        signature: FunctionType,
        callable: HostCallable,
    },
}

impl FunctionInstance {
    /// Creates a new WebAssembly function instance.
    pub fn wasm(signature: FunctionType, module: ModuleHandle, code: Rc<FunctionCode>) -> Self {
        FunctionInstance::Wasm {
            signature,
            module,
            code,
        }
    }

    /// Creates a new host function instance from the given callable.
    pub fn host(
        signature: FunctionType,
        callable: impl Fn(&[Value]) -> Result<Option<Value>, HostError> + 'static,
    ) -> Self {
        FunctionInstance::Host {
            signature,
            callable: Rc::new(callable),
        }
    }

    /// The signature of this function.
    pub fn signature(&self) -> &FunctionType {
        match self {
            FunctionInstance::Wasm { signature, .. } => signature,
            FunctionInstance::Host { signature, .. } => signature,
        }
    }
}

impl fmt::Debug for FunctionInstance {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionInstance::Wasm {
                signature, module, ..
            } => formatter
                .debug_struct("Wasm")
                .field("signature", signature)
                .field("module", module)
                .finish_non_exhaustive(),
            FunctionInstance::Host { signature, .. } => formatter
                .debug_struct("Host")
                .field("signature", signature)
                .finish_non_exhaustive(),
        }
    }
}
