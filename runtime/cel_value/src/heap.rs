//! Shared immutable heap values.
//!
//! `Heap<T>` wraps `Arc<T>` and is the only construction path for the
//! heap-carried payloads of [`Value`](crate::Value). Values are immutable
//! once constructed, so sharing is always safe and cloning a value is O(1).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Reference-counted immutable payload.
///
/// `#[repr(transparent)]` keeps the layout identical to `Arc<T>`.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    /// Allocate a payload on the shared heap.
    #[inline]
    pub fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Pointer equality short-circuits deep comparison for shared clones.
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl<T: ?Sized + Eq> Eq for Heap<T> {}

impl<T: ?Sized + Hash> Hash for Heap<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: Default> Default for Heap<T> {
    fn default() -> Self {
        Heap::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_allocation() {
        let a = Heap::new(vec![1, 2, 3]);
        let b = a.clone();
        assert_eq!(*a, *b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn equality_compares_contents() {
        let a = Heap::new("hello".to_string());
        let b = Heap::new("hello".to_string());
        assert_eq!(a, b);
        assert_ne!(a, Heap::new("world".to_string()));
    }
}
