//! Model for values in the WebAssembly syntax.

/// Names are sequences of Unicode scalar values.
/// Due to the limitations of the binary format,
/// the length of a name is bounded by the length of its UTF-8 encoding.
/// Imports and exports are labeled with names.
///
/// See <https://webassembly.github.io/spec/core/syntax/values.html#names>
///
/// # Examples
/// ```rust
/// use wasm_vm::Name;
///
/// let name = Name::new(String::from("memory"));
///
/// assert_eq!(name, Name::from("memory"));
/// assert_eq!(name.as_str(), "memory");
/// assert_eq!(name.len(), 6);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Name {
    value: String,
}

impl Name {
    /// Creates a new name with the given Unicode text.
    pub fn new(value: String) -> Self {
        Name { value }
    }

    /// Returns a string slice of this `Name`'s contents.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the length of this `Name` in bytes, not chars or graphemes.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Returns true if this `Name` has a length of zero, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name {
            value: name.to_string(),
        }
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name { value: name }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}
