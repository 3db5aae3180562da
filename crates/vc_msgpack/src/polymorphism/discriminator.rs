use alloc::string::String;
use core::fmt;

/// The tag written in front of a polymorphic payload.
///
/// Integer and string tags never compare equal, even when they read alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Discriminator {
    Int(i64),
    Str(String),
}

impl From<i64> for Discriminator {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Discriminator {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Discriminator {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Discriminator {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}
