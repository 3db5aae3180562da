use core::fmt;

// -----------------------------------------------------------------------------
// ValueKind

/// The tag of a [`Value`], or the family of a format byte on the wire.
///
/// [`Value`]: crate::value::Value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Integer,
    Float32,
    Float64,
    String,
    Binary,
    Array,
    Map,
    Extension,
}

impl ValueKind {
    /// Name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Binary => "Binary",
            Self::Array => "Array",
            Self::Map => "Map",
            Self::Extension => "Extension",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
