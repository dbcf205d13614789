use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::node::{self, Link};

/// A borrowed in-order iterator over a map's entries.
///
/// The borrow rules make this iterator immune to mutation; for traversals
/// interleaved with removal, see [`crate::Cursor`].
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(first: Link<K, V>, len: usize) -> Iter<'a, K, V> {
        Iter {
            next: first,
            remaining: len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let node = self.next?;
        unsafe {
            self.next = node::successor(node);
            self.remaining -= 1;
            Some((&(*node.as_ptr()).key, &(*node.as_ptr()).value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
