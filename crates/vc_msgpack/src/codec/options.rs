use core::fmt;
use core::ops::{BitOr, BitOrAssign};

// -----------------------------------------------------------------------------
// PackerCompatibilityOptions

/// Switches that make a [`Packer`] emit bytes older MessagePack readers understand.
///
/// Flags combine with `|`.
///
/// # Examples
///
/// ```
/// use vc_msgpack::codec::PackerCompatibilityOptions as Compat;
///
/// let classic = Compat::PACK_BINARY_AS_RAW | Compat::PROHIBIT_EXTENDED_TYPE_OBJECTS;
/// assert_eq!(classic, Compat::CLASSIC);
/// assert!(classic.contains(Compat::PACK_BINARY_AS_RAW));
/// assert!(!Compat::NONE.contains(Compat::PACK_BINARY_AS_RAW));
/// ```
///
/// [`Packer`]: crate::codec::Packer
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackerCompatibilityOptions(u8);

impl PackerCompatibilityOptions {
    /// Current MessagePack format with the `bin` and `str8` families.
    pub const NONE: Self = Self(0);

    /// Write binaries with the legacy raw headers (`fixraw`, `raw16`, `raw32`).
    ///
    /// Strings also skip `str8`, which pre-2013 readers do not know.
    pub const PACK_BINARY_AS_RAW: Self = Self(1);

    /// Refuse to write extension values, including native timestamps.
    pub const PROHIBIT_EXTENDED_TYPE_OBJECTS: Self = Self(1 << 1);

    /// Everything a pre-2013 reader needs.
    pub const CLASSIC: Self = Self(Self::PACK_BINARY_AS_RAW.0 | Self::PROHIBIT_EXTENDED_TYPE_OBJECTS.0);

    /// Returns `true` if every flag of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub(crate) const fn binary_as_raw(self) -> bool {
        self.contains(Self::PACK_BINARY_AS_RAW)
    }

    #[inline]
    pub(crate) const fn prohibit_extensions(self) -> bool {
        self.contains(Self::PROHIBIT_EXTENDED_TYPE_OBJECTS)
    }
}

impl BitOr for PackerCompatibilityOptions {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PackerCompatibilityOptions {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for PackerCompatibilityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.binary_as_raw() {
            set.entry(&"PACK_BINARY_AS_RAW");
        }
        if self.prohibit_extensions() {
            set.entry(&"PROHIBIT_EXTENDED_TYPE_OBJECTS");
        }
        set.finish()
    }
}
