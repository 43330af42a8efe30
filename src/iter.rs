//! Cursor-style iteration over live entries.
//!
//! `Iter` can be driven two ways: explicitly with `advance`/`current`,
//! or as a regular `Iterator` yielding `(&str, &V)`. Both share the same
//! cursor. Order is slot order and changes across resizes.

use crate::table::Slot;
use core::iter::FusedIterator;

/// Forward-only cursor over a table's occupied slots.
///
/// Borrows the table, so the table cannot be mutated while this exists.
pub struct Iter<'a, V> {
    slots: &'a [Slot<V>],
    count: usize,
    // None until the first advance.
    position: Option<usize>,
    visited: usize,
    done: bool,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(slots: &'a [Slot<V>], count: usize) -> Self {
        Self {
            slots,
            count,
            position: None,
            visited: 0,
            done: count == 0,
        }
    }

    /// Move to the next occupied slot. Returns `false` once every live
    /// entry has been visited; after that the cursor stays at the end.
    pub fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }
        if self.visited == self.count {
            self.done = true;
            return false;
        }
        let mut next = self.position.map_or(0, |p| p + 1);
        while next < self.slots.len() {
            if self.slots[next].is_occupied() {
                self.position = Some(next);
                self.visited += 1;
                return true;
            }
            next += 1;
        }
        self.position = Some(self.slots.len());
        self.done = true;
        false
    }

    /// Key under the cursor. `None` before the first `advance` and after
    /// the end.
    pub fn current(&self) -> Option<&'a str> {
        self.current_entry().map(|(k, _)| k)
    }

    pub fn current_value(&self) -> Option<&'a V> {
        self.current_entry().map(|(_, v)| v)
    }

    pub fn current_entry(&self) -> Option<(&'a str, &'a V)> {
        if self.done {
            return None;
        }
        let slots: &'a [Slot<V>] = self.slots;
        slots.get(self.position?)?.entry()
    }

    pub fn at_end(&self) -> bool {
        self.done
    }

    fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.count - self.visited
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.current_entry()
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<'a, V> ExactSizeIterator for Iter<'a, V> {}

impl<'a, V> FusedIterator for Iter<'a, V> {}

/// Iterator over keys in slot order.
pub struct Keys<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Keys<'a, V> {
    pub(crate) fn new(inner: Iter<'a, V>) -> Self {
        Self { inner }
    }
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over values in slot order.
pub struct Values<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Values<'a, V> {
    pub(crate) fn new(inner: Iter<'a, V>) -> Self {
        Self { inner }
    }
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
