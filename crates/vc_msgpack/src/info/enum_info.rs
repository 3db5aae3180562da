use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::error::Result;

/// One variant of a field-less enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumVariant {
    pub(crate) name: &'static str,
    pub(crate) value: i64,
}

impl EnumVariant {
    #[inline]
    pub const fn new(name: &'static str, value: i64) -> Self {
        Self { name, value }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The underlying discriminant.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

/// A field-less enum, written by name or by underlying value.
#[derive(Clone)]
pub struct EnumInfo {
    pub(crate) variants: Vec<EnumVariant>,
    pub(crate) value_of: fn(&dyn Any) -> Result<i64>,
    pub(crate) from_value: fn(i64) -> Option<Box<dyn Any>>,
}

impl EnumInfo {
    pub fn new(
        variants: Vec<EnumVariant>,
        value_of: fn(&dyn Any) -> Result<i64>,
        from_value: fn(i64) -> Option<Box<dyn Any>>,
    ) -> Self {
        Self {
            variants,
            value_of,
            from_value,
        }
    }

    #[inline]
    pub fn variants(&self) -> &[EnumVariant] {
        &self.variants
    }

    pub fn variant_by_name(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_by_value(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}
