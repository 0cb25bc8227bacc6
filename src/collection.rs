//! The growable list behind every multi-element fact.
//!
//! A [`Collection`] never grows on its own. Producers check [`Collection::is_full`]
//! and call [`Collection::grow`] right before writing the next slot:
//!
//! ```rust
//! use hostfacts::Collection;
//!
//! let mut list = Collection::create(2)?;
//! for n in 0..5u32 {
//!     if list.is_full() {
//!         list.grow()?;
//!     }
//!     list.push(n);
//! }
//! assert_eq!(list.len(), 5);
//! assert_eq!(list.capacity(), 6);
//! # Ok::<(), hostfacts::Error>(())
//! ```

use std::ops::Deref;

use crate::{Error, Result};

/// Per-kind growth increments.
pub mod increment {
    pub const PROC_LIST: usize = 256;
    pub const PROC_ARGS: usize = 12;
    pub const FILE_SYSTEM_LIST: usize = 10;
    pub const CPU_INFO_LIST: usize = 4;
    pub const CPU_LIST: usize = 16;
    pub const NET_ROUTE_LIST: usize = 6;
    pub const NET_INTERFACE_LIST: usize = 20;
    pub const NET_CONNECTION_LIST: usize = 20;
    pub const WHO_LIST: usize = 12;
}

/// An owned, explicitly grown list of facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    items: Vec<T>,
    capacity: usize,
    increment: usize,
}

impl<T> Collection<T> {
    /// Create an empty collection with one increment of room.
    ///
    /// # Errors
    /// Returns [`Error::OutOfMemory`] if the first increment cannot be allocated
    ///
    /// # Panics
    /// Panics if `increment` is zero
    pub fn create(increment: usize) -> Result<Self> {
        assert!(increment > 0, "collection increment must be positive");

        let mut items = Vec::new();
        items
            .try_reserve_exact(increment)
            .map_err(|_| Error::OutOfMemory {
                requested: increment,
            })?;

        Ok(Self {
            items,
            capacity: increment,
            increment,
        })
    }

    /// Make room for one more increment, keeping every element in place.
    ///
    /// # Errors
    /// Returns [`Error::OutOfMemory`] if the allocation fails
    pub fn grow(&mut self) -> Result<()> {
        let requested = self.capacity + self.increment;
        self.items
            .try_reserve_exact(requested.saturating_sub(self.items.len()))
            .map_err(|_| Error::OutOfMemory { requested })?;
        self.capacity = requested;
        Ok(())
    }

    /// Release the elements and storage. Safe to call any number of times.
    pub fn destroy(&mut self) {
        if self.capacity == 0 {
            return;
        }
        self.items = Vec::new();
        self.capacity = 0;
    }

    /// Write the next element. The caller must have grown a full collection first.
    ///
    /// # Panics
    /// Panics if the collection is full
    pub fn push(&mut self, item: T) {
        assert!(
            self.items.len() < self.capacity,
            "Collection::push on a full collection; call grow() first"
        );
        self.items.push(item);
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Number of elements written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements that fit before the next [`grow`](Self::grow).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn increment(&self) -> usize {
        self.increment
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Consume the collection, keeping only its elements.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for Collection<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(increment: usize, n: usize) -> Collection<usize> {
        let mut list = Collection::create(increment).unwrap();
        for i in 0..n {
            if list.is_full() {
                list.grow().unwrap();
            }
            list.push(i);
        }
        list
    }

    #[test]
    fn starts_with_one_increment() {
        let list: Collection<u8> = Collection::create(16).unwrap();
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 16);
        assert!(!list.is_full());
    }

    #[test]
    fn appends_survive_growth() {
        for increment in [1, 2, 3, 7, 16, 256] {
            for n in [0, 1, increment, increment + 1, 3 * increment + 2] {
                let list = fill(increment, n);
                assert_eq!(list.len(), n);
                assert!(list.len() <= list.capacity());
                assert_eq!(list.capacity() % increment, 0);
                assert!(list.iter().copied().eq(0..n));
            }
        }
    }

    #[test]
    fn grows_by_exactly_one_increment() {
        let mut list = fill(4, 4);
        assert!(list.is_full());
        list.grow().unwrap();
        assert_eq!(list.capacity(), 8);
        assert_eq!(list.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn destroy_is_idempotent() {
        for n in [0, 1, 50] {
            let mut list = fill(8, n);
            list.destroy();
            assert_eq!(list.len(), 0);
            assert_eq!(list.capacity(), 0);
            list.destroy();
            assert_eq!(list.capacity(), 0);
        }
    }

    #[test]
    fn destroy_releases_owned_strings() {
        let mut names = Collection::create(increment::NET_INTERFACE_LIST).unwrap();
        for name in ["lo", "eth0", "eth1"] {
            if names.is_full() {
                names.grow().unwrap();
            }
            names.push(name.to_string());
        }
        let first = names[0].clone();
        names.destroy();
        names.destroy();
        assert!(names.is_empty());
        assert_eq!(first, "lo");
    }

    #[test]
    #[should_panic(expected = "call grow() first")]
    fn push_on_full_collection_panics() {
        let mut list = fill(1, 1);
        assert!(list.is_full());
        list.push(1);
    }

    #[test]
    fn full_collection_keeps_count_within_capacity() {
        let mut list = fill(1, 1);
        let pushed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| list.push(1)));
        assert!(pushed.is_err());
        assert_eq!(list.len(), 1);
        assert_eq!(list.capacity(), 1);

        list.grow().unwrap();
        assert_eq!(list.capacity(), 2);
        list.push(1);
        assert_eq!(list.as_slice(), &[0, 1]);
    }

    #[test]
    #[should_panic(expected = "increment must be positive")]
    fn zero_increment_is_rejected() {
        let _ = Collection::<u8>::create(0);
    }
}
