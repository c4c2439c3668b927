use crate::runtime::Value;
use crate::{GlobalType, Mutability};
use thiserror::Error;

/// A failed operation on a global variable.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum GlobalError {
    #[error("The global is immutable.")]
    Immutable,
    #[error("The value does not match the value type of the global.")]
    KindMismatch,
}

/// A global variable: a typed value, mutable or immutable.
/// The stored value always matches the declared value type,
/// and an immutable global never changes after initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalInstance {
    kind: GlobalType,
    value: Value,
}

impl GlobalInstance {
    /// Creates a new global holding the given value.
    pub fn new(kind: GlobalType, value: Value) -> Result<Self, GlobalError> {
        if value.kind() != kind.kind() {
            return Err(GlobalError::KindMismatch);
        }

        Ok(GlobalInstance { kind, value })
    }

    /// The type of this global.
    pub fn kind(&self) -> &GlobalType {
        &self.kind
    }

    /// The current value of this global.
    pub fn get(&self) -> Value {
        self.value
    }

    /// Replaces the value of this global.
    /// Fails if the global is immutable or the value is of a different kind.
    pub fn set(&mut self, value: Value) -> Result<(), GlobalError> {
        if self.kind.mutability() == Mutability::Immutable {
            return Err(GlobalError::Immutable);
        }

        if value.kind() != self.kind.kind() {
            return Err(GlobalError::KindMismatch);
        }

        self.value = value;

        Ok(())
    }
}
