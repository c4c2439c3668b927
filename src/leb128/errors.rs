/// An error in LEB128 decoding.
#[derive(thiserror::Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LEB128Error {
    #[error("The encoding uses {0} bytes, but an integer of this width permits at most {1}.")]
    Overlong(usize, usize),
    #[error("The input ended before the final byte of the encoding.")]
    Unterminated,
    #[error("The final byte of the encoding carries bits outside the range of the target type.")]
    ExcessBits,
}
