use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use crate::error::Result;
use crate::info::{MessagePackType, TypeDescriptor, downcast, unbox};

// -----------------------------------------------------------------------------
// CollectionKind

/// Flavor of a collection, kept for diagnostics and element ordering.
///
/// All kinds share one wire shape: an array header followed by the
/// elements in iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Index order, e.g. `Vec`.
    Sequence,
    /// Front to back, e.g. `VecDeque`.
    Queue,
    /// Top to bottom, e.g. [`Stack`](vc_utils::collections::Stack).
    Stack,
    /// Iteration order of the set.
    Set,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => f.pad("Sequence"),
            Self::Queue => f.pad("Queue"),
            Self::Stack => f.pad("Stack"),
            Self::Set => f.pad("Set"),
        }
    }
}

// -----------------------------------------------------------------------------
// CollectionBuilder

/// Accumulates unpacked elements and produces the finished collection.
pub trait CollectionBuilder {
    fn push(&mut self, item: Box<dyn Any>) -> Result<()>;

    fn finish(self: Box<Self>) -> Box<dyn Any>;
}

struct CollectBuilder<C, T> {
    items: Vec<T>,
    _marker: PhantomData<fn() -> C>,
}

impl<C, T> CollectionBuilder for CollectBuilder<C, T>
where
    C: FromIterator<T> + 'static,
    T: 'static,
{
    #[inline]
    fn push(&mut self, item: Box<dyn Any>) -> Result<()> {
        self.items.push(unbox::<T>(item)?);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.items.into_iter().collect::<C>())
    }
}

// -----------------------------------------------------------------------------
// CollectionInfo

/// A homogeneous collection of `element` values.
#[derive(Clone, Copy)]
pub struct CollectionInfo {
    pub(crate) kind: CollectionKind,
    pub(crate) element: fn() -> TypeDescriptor,
    pub(crate) len: fn(&dyn Any) -> Result<usize>,
    pub(crate) for_each: fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> Result<()>) -> Result<()>,
    pub(crate) builder: fn(usize) -> Box<dyn CollectionBuilder>,
}

impl CollectionInfo {
    /// Describes any collection that iterates by reference and collects by value.
    ///
    /// Unpacking collects elements in wire order, so `C::from_iter` must
    /// accept them in the same order `&C` yields them.
    pub fn of<C, T>(kind: CollectionKind) -> Self
    where
        C: FromIterator<T> + 'static,
        T: MessagePackType,
        for<'a> &'a C: IntoIterator<Item = &'a T>,
        for<'a> <&'a C as IntoIterator>::IntoIter: ExactSizeIterator,
    {
        Self {
            kind,
            element: T::type_descriptor,
            len: |value| Ok(downcast::<C>(value)?.into_iter().len()),
            for_each: |value, f| {
                downcast::<C>(value)?
                    .into_iter()
                    .try_for_each(|item| f(item as &dyn Any))
            },
            builder: |capacity| {
                Box::new(CollectBuilder::<C, T> {
                    items: Vec::with_capacity(capacity),
                    _marker: PhantomData,
                }) as Box<dyn CollectionBuilder>
            },
        }
    }

    #[inline]
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    #[inline]
    pub fn element(&self) -> TypeDescriptor {
        (self.element)()
    }
}
