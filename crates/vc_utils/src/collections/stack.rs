//! Provide a LIFO [`Stack`] backed by a `Vec`.

use alloc::vec::Vec;
use core::fmt;
use core::iter::Rev;

// -----------------------------------------------------------------------------
// Stack

/// A last-in first-out container.
///
/// Iteration runs from the top of the stack to the bottom, which is also
/// the order its elements are written in by serializers. Collecting an
/// iterator treats the first item as the top, so iterating and collecting
/// back yields an identical stack.
///
/// # Examples
///
/// ```
/// use vc_utils::collections::Stack;
///
/// let mut stack = Stack::new();
/// stack.push(1);
/// stack.push(2);
/// stack.push(3);
///
/// assert_eq!(stack.peek(), Some(&3));
/// assert_eq!(stack.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
///
/// let copy: Stack<i32> = stack.iter().copied().collect();
/// assert_eq!(copy, stack);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Stack<T> {
    // Bottom at index 0, top at the end.
    items: Vec<T>,
}

impl<T> Stack<T> {
    /// Creates an empty stack.
    #[inline]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates an empty stack with room for `capacity` elements.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Pushes an element on top of the stack.
    #[inline]
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Removes and returns the top element.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Returns the top element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the stack holds no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates from the top of the stack to the bottom.
    #[inline]
    pub fn iter(&self) -> Rev<core::slice::Iter<'_, T>> {
        self.items.iter().rev()
    }

    /// Builds a stack from elements given bottom first, the order they were pushed.
    #[inline]
    pub fn from_pushed(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> Default for Stack<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for Stack<T> {
    /// Collects items given top first.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut items: Vec<T> = iter.into_iter().collect();
        items.reverse();
        Self { items }
    }
}

impl<'a, T> IntoIterator for &'a Stack<T> {
    type Item = &'a T;
    type IntoIter = Rev<core::slice::Iter<'a, T>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::Stack;

    #[test]
    fn pop_order_is_lifo() {
        let mut stack = Stack::from_pushed(vec!['a', 'b']);
        stack.push('c');
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some('c'));
        assert_eq!(stack.pop(), Some('b'));
        assert_eq!(stack.pop(), Some('a'));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn collect_treats_first_item_as_top() {
        let stack: Stack<u8> = [9, 8, 7].into_iter().collect();
        assert_eq!(stack.peek(), Some(&9));
    }
}
