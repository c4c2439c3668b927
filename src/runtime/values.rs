use crate::runtime::FunctionAddress;
use crate::ValueType;

/// A runtime value: one of the four number types, or a reference to a function.
/// Integers carry no inherent signedness;
/// individual operations interpret their bits as signed or unsigned two's complement.
///
/// # Examples
/// ```rust
/// use wasm_vm::{Value, ValueType};
///
/// assert_eq!(Value::from(42i32).kind(), ValueType::I32);
/// assert_eq!(Value::from(1.5f64).kind(), ValueType::F64);
/// assert_eq!(Value::default_for(ValueType::I64), Value::I64(0));
/// assert_eq!(Value::I32(7).as_i32(), Some(7));
/// assert_eq!(Value::I32(7).as_f32(), None);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    FuncRef(Option<FunctionAddress>),
}

impl Value {
    /// The value type of this `Value`.
    pub fn kind(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::FuncRef(_) => ValueType::FunctionReference,
        }
    }

    /// The zero value of the given value type;
    /// locals and table elements start out with these.
    pub fn default_for(kind: ValueType) -> Value {
        match kind {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
            ValueType::FunctionReference => Value::FuncRef(None),
        }
    }

    /// The payload of an i32 value, if this value is one.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(value) => Some(*value),
            _ => None,
        }
    }

    /// The payload of an i64 value, if this value is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(value) => Some(*value),
            _ => None,
        }
    }

    /// The payload of an f32 value, if this value is one.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(value) => Some(*value),
            _ => None,
        }
    }

    /// The payload of an f64 value, if this value is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(value) => Some(*value),
            _ => None,
        }
    }

    /// The payload of a function reference, if this value is one.
    pub fn as_function_reference(&self) -> Option<Option<FunctionAddress>> {
        match self {
            Value::FuncRef(reference) => Some(*reference),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}
