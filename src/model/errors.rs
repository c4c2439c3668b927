use thiserror::Error;

/// An error in a WebAssembly module model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("The module has no space left for the given component; indices in a WebAssembly module are limited to the capacity of a u32.")]
    IndexOverflow(#[from] std::num::TryFromIntError),
}
