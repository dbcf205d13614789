use crate::map::{Core, TreeMap};
use crate::node::{self, Link};
use crate::policy::Policy;
use crate::Error;

/// A detached, fail-fast cursor over a [`TreeMap`].
///
/// A cursor captures the map's generation when created and holds no borrow
/// between steps, so the map stays fully usable while a traversal is in
/// flight. The price is that every step revalidates: if the map saw a
/// structural mutation the cursor did not make itself, the next call
/// reports [`Error::ConcurrentMutation`] instead of walking freed nodes.
///
/// Each cursor is bound to the map that created it. Passing it a different
/// map is a programming error and panics.
///
/// ```
/// use bbst::{AvlMap, Error};
///
/// let mut map: AvlMap<u32, &str> = AvlMap::new();
/// map.put(1, "one");
/// map.put(2, "two");
///
/// let mut cursor = map.cursor();
/// assert_eq!(cursor.next(&map), Ok(Some((&1, &"one"))));
/// map.put(3, "three");
/// assert_eq!(cursor.next(&map), Err(Error::ConcurrentMutation));
/// ```
pub struct Cursor<K, V> {
    map_id: u64,
    expected_generation: u64,
    next: Link<K, V>,
    returned: Link<K, V>,
}

impl<K, V> Cursor<K, V> {
    pub(crate) fn new(map_id: u64, generation: u64, first: Link<K, V>) -> Cursor<K, V> {
        Cursor {
            map_id,
            expected_generation: generation,
            next: first,
            returned: None,
        }
    }

    fn validate(&self, core: &Core<K, V>) -> Result<(), Error> {
        assert_eq!(
            core.id, self.map_id,
            "cursor used with a map other than its origin"
        );
        if core.generation != self.expected_generation {
            return Err(Error::ConcurrentMutation);
        }
        Ok(())
    }

    /// Steps to the next entry in ascending key order.
    ///
    /// Returns `Ok(None)` once the entries are exhausted and
    /// [`Error::ConcurrentMutation`] if the map was structurally mutated
    /// since the cursor last saw it.
    pub fn next<'a, P, C>(&mut self, map: &'a TreeMap<K, V, P, C>) -> Result<Option<(&'a K, &'a V)>, Error>
    where
        P: Policy,
    {
        self.validate(&map.core)?;

        match self.next {
            None => Ok(None),
            Some(node) => unsafe {
                self.returned = Some(node);
                self.next = node::successor(node);
                Ok(Some((&(*node.as_ptr()).key, &(*node.as_ptr()).value)))
            },
        }
    }

    /// Removes the entry most recently returned by [`Cursor::next`] and
    /// keeps the traversal valid.
    ///
    /// Returns `Ok(None)` if no entry has been returned since the last
    /// removal, and [`Error::ConcurrentMutation`] if someone else mutated
    /// the map in between.
    pub fn remove<P, C>(&mut self, map: &mut TreeMap<K, V, P, C>) -> Result<Option<V>, Error>
    where
        P: Policy,
    {
        self.validate(&map.core)?;

        let Some(target) = self.returned.take() else {
            return Ok(None);
        };

        unsafe {
            if (*target.as_ptr()).left().is_some() && (*target.as_ptr()).right().is_some() {
                // The successor's entry is about to be spliced into the
                // target node, so that node is where the traversal resumes.
                self.next = Some(target);
            }
            let (_, value) = map.remove_node(target);
            self.expected_generation = map.core.generation;
            Ok(Some(value))
        }
    }
}
