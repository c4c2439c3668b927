//! An embeddable WebAssembly virtual machine:
//! a binary-format decoder, a store-based instance model with an import registry,
//! and a stack-machine interpreter covering the 1.0 instruction set
//! plus the bulk-memory and function-reference operators.
//!
//! The typical flow is bytes → [`parse_binary`] → [`Module`] → [`Store::instantiate_module`] →
//! [`Store::invoke`]:
//!
//! ```rust
//! use wasm_vm::{Store, Value};
//!
//! let bytes = wat::parse_str(
//!     r#"(module (func (export "add") (param i32 i32) (result i32)
//!            local.get 0
//!            local.get 1
//!            i32.add))"#,
//! )
//! .unwrap();
//!
//! let mut store = Store::new();
//! let module = store.instantiate(&bytes).unwrap();
//! let result = store
//!     .invoke(module, "add", &[Value::I32(2), Value::I32(3)])
//!     .unwrap();
//!
//! assert_eq!(result, Some(Value::I32(5)));
//! ```

pub mod leb128;
pub mod model;
pub mod parser;
pub mod runtime;

mod interpreter;

pub use model::*;
pub use parser::*;
pub use runtime::*;
