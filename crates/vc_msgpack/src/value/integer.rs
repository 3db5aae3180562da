use core::fmt;

// -----------------------------------------------------------------------------
// Integer

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum IntRepr {
    /// Any value `>= 0`.
    Unsigned(u64),
    /// Any value `< 0`.
    Negative(i64),
}

/// A MessagePack integer, normalized so that the wire width does not matter.
///
/// Non-negative values are always held unsigned, so `Integer::from(1_i8)`
/// and `Integer::from(1_u64)` compare and hash equal.
///
/// # Examples
///
/// ```
/// use vc_msgpack::value::Integer;
///
/// assert_eq!(Integer::from(7_i16), Integer::from(7_u64));
/// assert_eq!(Integer::from(-1_i32).as_u64(), None);
/// assert_eq!(Integer::from(300_u32).cast::<u8>(), None);
/// assert_eq!(Integer::from(300_u32).cast::<i16>(), Some(300));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Integer(pub(crate) IntRepr);

impl Integer {
    /// Returns the value as `u64` if it is non-negative.
    #[inline]
    pub const fn as_u64(self) -> Option<u64> {
        match self.0 {
            IntRepr::Unsigned(v) => Some(v),
            IntRepr::Negative(_) => None,
        }
    }

    /// Returns the value as `i64` if it fits.
    #[inline]
    pub const fn as_i64(self) -> Option<i64> {
        match self.0 {
            IntRepr::Unsigned(v) if v <= i64::MAX as u64 => Some(v as i64),
            IntRepr::Unsigned(_) => None,
            IntRepr::Negative(v) => Some(v),
        }
    }

    /// Converts to any primitive integer type that holds the value.
    pub fn cast<T: TryFrom<u64> + TryFrom<i64>>(self) -> Option<T> {
        match self.0 {
            IntRepr::Unsigned(v) => T::try_from(v).ok(),
            IntRepr::Negative(v) => T::try_from(v).ok(),
        }
    }

    /// Returns the value as `f64`, rounding large magnitudes.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self.0 {
            IntRepr::Unsigned(v) => v as f64,
            IntRepr::Negative(v) => v as f64,
        }
    }
}

impl From<u64> for Integer {
    #[inline]
    fn from(value: u64) -> Self {
        Self(IntRepr::Unsigned(value))
    }
}

impl From<i64> for Integer {
    #[inline]
    fn from(value: i64) -> Self {
        if value >= 0 {
            Self(IntRepr::Unsigned(value as u64))
        } else {
            Self(IntRepr::Negative(value))
        }
    }
}

macro_rules! impl_from_narrow {
    ($wide:ty => $($ty:ty),*) => {
        $(
            impl From<$ty> for Integer {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::from(value as $wide)
                }
            }
        )*
    };
}

impl_from_narrow!(u64 => u8, u16, u32, usize);
impl_from_narrow!(i64 => i8, i16, i32, isize);

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            IntRepr::Unsigned(v) => fmt::Display::fmt(&v, f),
            IntRepr::Negative(v) => fmt::Display::fmt(&v, f),
        }
    }
}
