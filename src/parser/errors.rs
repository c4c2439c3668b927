use thiserror::Error;

/// The reason a WebAssembly binary failed to decode.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum DecodeErrorKind {
    #[error("The input ended before the current item was complete.")]
    UnexpectedEof,
    #[error("The magic preamble is not \\0asm.")]
    BadMagic,
    #[error("The binary format version is not 1.")]
    BadVersion,
    #[error("The section identifier is outside the range 0..=12.")]
    BadSectionId,
    #[error("An integer is not a valid LEB128 encoding of its type.")]
    BadLeb,
    #[error("The byte is not a valid value type.")]
    BadValueType,
    #[error("The opcode is not part of the instruction set of this engine.")]
    BadOpcode,
    #[error("A name is not valid UTF-8.")]
    BadUtf8,
    #[error("A non-custom section appears more than once.")]
    DuplicateSection,
    #[error("A section or function body declares a size its contents do not match.")]
    OversizedSection,
    #[error("The function and code sections declare different numbers of functions.")]
    MismatchedFunctionParts,
}

/// A failure to decode a WebAssembly module.
/// The offset is the number of bytes successfully decoded before the failure;
/// no partially decoded module is ever surfaced alongside it.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[error("{kind} (at byte offset {offset})")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    offset: usize,
}

impl DecodeError {
    /// Creates a new decode error for the given kind and byte offset.
    pub fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        DecodeError { kind, offset }
    }

    /// The reason decoding failed.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// The byte offset into the input at which decoding failed.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// The error type threaded through the nom parsers.
/// It records the failure reason and the input position at which the failure happened;
/// `parse_binary` translates it to a `DecodeError` with an absolute byte offset.
#[derive(Debug)]
pub(crate) struct SyntaxError<'input> {
    pub input: &'input [u8],
    pub kind: DecodeErrorKind,
}

impl<'input> SyntaxError<'input> {
    /// The absolute byte offset of this error within the module input it was produced from.
    pub fn offset_in(&self, module: &[u8]) -> usize {
        (self.input.as_ptr() as usize)
            .saturating_sub(module.as_ptr() as usize)
            .min(module.len())
    }
}

impl<'input> nom::error::ParseError<&'input [u8]> for SyntaxError<'input> {
    fn from_error_kind(input: &'input [u8], _kind: nom::error::ErrorKind) -> Self {
        SyntaxError {
            input,
            kind: DecodeErrorKind::UnexpectedEof,
        }
    }

    fn append(_input: &'input [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

/// An error assembling or decoding a WebAssembly module given in the text format.
#[cfg(feature = "text")]
#[derive(Error, Debug)]
pub enum TextError {
    #[error(transparent)]
    Assemble(#[from] wat::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
