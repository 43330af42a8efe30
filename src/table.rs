//! Table: open-addressing storage with linear probing and tombstones.

use crate::config::TableConfig;
use crate::error::{PutError, Result, TableError};
use crate::hash::Djb2BuildHasher;
use crate::iter::{Iter, Keys, Values};
use core::fmt;
use core::hash::BuildHasher;
use core::mem;
use tracing::{debug, trace, warn};

/// Callback run on values the table disposes of: overwritten by `put`, or
/// still live when the table is dropped. Values returned by `remove` are
/// never passed here.
pub type Destructor<V> = Box<dyn FnMut(V)>;

pub(crate) enum Slot<V> {
    Empty,
    Occupied { key: String, value: V },
    // The key copy is freed when the tombstone is written.
    Tombstone,
}

impl<V> Slot<V> {
    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<(&str, &V)> {
        match self {
            Slot::Occupied { key, value } => Some((key.as_str(), value)),
            _ => None,
        }
    }

    fn into_value(self) -> Option<V> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// String-keyed hash table. See the crate docs for the probing and resize
/// rules.
pub struct Table<V, S = Djb2BuildHasher> {
    slots: Vec<Slot<V>>,
    count: usize,
    tombstones: usize,
    config: TableConfig,
    hasher: S,
    destructor: Option<Destructor<V>>,
}

impl<V> Table<V> {
    /// Empty table with the default config and no destructor.
    pub fn new() -> Self {
        Self::with_hasher(Djb2BuildHasher)
    }

    pub fn with_destructor<F>(destructor: F) -> Self
    where
        F: FnMut(V) + 'static,
    {
        let mut t = Self::new();
        t.set_destructor(destructor);
        t
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, Djb2BuildHasher)
    }
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_slots<V>(capacity: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}

fn try_empty_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| TableError::AllocationFailure {
            requested: capacity,
        })?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}

fn copy_key(key: &str) -> Result<String> {
    let mut owned = String::new();
    owned
        .try_reserve_exact(key.len())
        .map_err(|_| TableError::AllocationFailure {
            requested: key.len(),
        })?;
    owned.push_str(key);
    Ok(owned)
}

#[inline]
fn home_slot<S: BuildHasher>(hasher: &S, key: &str, capacity: usize) -> usize {
    (hasher.hash_one(key) % capacity as u64) as usize
}

/// First `Empty` or `Tombstone` slot at or after `home`, wrapping once.
fn probe_for_insert<V>(slots: &[Slot<V>], home: usize) -> Option<usize> {
    let capacity = slots.len();
    let mut idx = home;
    for _ in 0..capacity {
        if !slots[idx].is_occupied() {
            return Some(idx);
        }
        idx += 1;
        if idx == capacity {
            idx = 0;
        }
    }
    None
}

impl<V, S> Table<V, S> {
    /// Number of live keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Deleted slots not yet reclaimed by a resize or reuse.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// `(count + tombstones) / capacity`, the ratio that triggers growth.
    pub fn load_factor(&self) -> f64 {
        (self.count + self.tombstones) as f64 / self.slots.len() as f64
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Replace the value destructor. Values already stored are disposed of
    /// by the new one.
    pub fn set_destructor<F>(&mut self, destructor: F)
    where
        F: FnMut(V) + 'static,
    {
        self.destructor = Some(Box::new(destructor));
    }

    /// Cursor over live entries in slot order. The table cannot be
    /// mutated while the returned iterator is alive.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(&self.slots, self.count)
    }

    pub fn keys(&self) -> Keys<'_, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, V> {
        Values::new(self.iter())
    }

    fn dispose(&mut self, value: V) {
        match self.destructor.as_mut() {
            Some(destroy) => destroy(value),
            None => drop(value),
        }
    }
}

impl<V, S> Table<V, S>
where
    S: BuildHasher,
{
    /// Empty table with the default config hashing through `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        let config = TableConfig::default();
        Self {
            slots: empty_slots(config.initial_capacity),
            count: 0,
            tombstones: 0,
            config,
            hasher,
            destructor: None,
        }
    }

    /// Validates `config` and reserves its initial slots fallibly.
    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        let slots = try_empty_slots(config.initial_capacity)?;
        Ok(Self {
            slots,
            count: 0,
            tombstones: 0,
            config,
            hasher,
            destructor: None,
        })
    }

    /// Slot holding `key`. Tombstones are skipped; the scan stops on the
    /// first `Empty` slot or after one full lap.
    fn find_index(&self, key: &str) -> Option<usize> {
        let capacity = self.slots.len();
        let mut idx = home_slot(&self.hasher, key, capacity);
        for _ in 0..capacity {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied { key: k, .. } if k == key => return Some(idx),
                _ => {}
            }
            idx += 1;
            if idx == capacity {
                idx = 0;
            }
        }
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let idx = self.find_index(key)?;
        self.slots[idx].entry().map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.find_index(key)?;
        match &mut self.slots[idx] {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find_index(key).is_some()
    }

    /// Store `value` under `key`, copying the key.
    ///
    /// An existing value for `key` is handed to the destructor and
    /// replaced in place. On failure the table is unchanged and the value
    /// comes back inside the error.
    pub fn put(&mut self, key: &str, value: V) -> core::result::Result<(), PutError<V>> {
        if let Some(idx) = self.find_index(key) {
            if let Slot::Occupied { value: stored, .. } = &mut self.slots[idx] {
                let old = mem::replace(stored, value);
                self.dispose(old);
                return Ok(());
            }
        }

        let owned = match copy_key(key) {
            Ok(k) => k,
            Err(e) => {
                warn!(key_len = key.len(), error = %e, "key copy failed");
                return Err(PutError::new(value, e));
            }
        };

        if self.needs_grow() {
            if let Err(e) = self.grow() {
                warn!(capacity = self.capacity(), error = %e, "grow failed");
                return Err(PutError::new(value, e));
            }
        }

        let home = home_slot(&self.hasher, key, self.slots.len());
        let idx = match probe_for_insert(&self.slots, home) {
            Some(idx) => idx,
            None => {
                let e = TableError::AllocationFailure {
                    requested: self.slots.len() + 1,
                };
                return Err(PutError::new(value, e));
            }
        };
        if matches!(self.slots[idx], Slot::Tombstone) {
            self.tombstones -= 1;
            trace!(slot = idx, "reused tombstone");
        }
        self.slots[idx] = Slot::Occupied { key: owned, value };
        self.count += 1;
        Ok(())
    }

    /// Remove `key` and hand its value back to the caller. The
    /// destructor is not run.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.find_index(key)?;
        let value = mem::replace(&mut self.slots[idx], Slot::Tombstone).into_value()?;
        self.count -= 1;
        self.tombstones += 1;
        self.maybe_shrink();
        Some(value)
    }

    fn needs_grow(&self) -> bool {
        let used = self.count + self.tombstones;
        used >= self.slots.len() || self.load_factor() > self.config.grow_threshold
    }

    fn grow(&mut self) -> Result<()> {
        let capacity = self.slots.len();
        let target = capacity
            .checked_mul(self.config.growth_factor)
            .ok_or(TableError::AllocationFailure {
                requested: usize::MAX,
            })?;
        self.resize(target)
    }

    fn maybe_shrink(&mut self) {
        let capacity = self.slots.len();
        if (self.count as f64) / (capacity as f64) >= self.config.shrink_threshold {
            return;
        }
        let target = capacity / self.config.growth_factor;
        if target < self.config.initial_capacity {
            return;
        }
        if let Err(e) = self.resize(target) {
            warn!(capacity, target, error = %e, "shrink skipped");
        }
    }

    /// Rehash every live entry into `new_capacity` fresh slots, dropping
    /// tombstones. The table is untouched if the allocation fails.
    pub(crate) fn resize(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity == 0 || new_capacity < self.count {
            return Err(TableError::InvalidCapacity {
                requested: new_capacity,
                count: self.count,
            });
        }
        let fresh = try_empty_slots(new_capacity)?;
        let old = mem::replace(&mut self.slots, fresh);
        debug!(
            old_capacity = old.len(),
            new_capacity,
            count = self.count,
            tombstones = self.tombstones,
            "resizing table"
        );
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                let home = home_slot(&self.hasher, &key, new_capacity);
                let idx = probe_for_insert(&self.slots, home)
                    .expect("resize target holds every live entry");
                self.slots[idx] = Slot::Occupied { key, value };
            }
        }
        self.tombstones = 0;
        Ok(())
    }
}

#[cfg(test)]
impl<V, S> Table<V, S> {
    /// Occupied and tombstone slots counted from the array itself.
    pub(crate) fn audit(&self) -> (usize, usize) {
        self.slots.iter().fold((0, 0), |(occ, tomb), s| match s {
            Slot::Occupied { .. } => (occ + 1, tomb),
            Slot::Tombstone => (occ, tomb + 1),
            Slot::Empty => (occ, tomb),
        })
    }
}

impl<V, S> Drop for Table<V, S> {
    fn drop(&mut self) {
        if let Some(destroy) = self.destructor.as_mut() {
            for slot in self.slots.drain(..) {
                if let Some(value) = slot.into_value() {
                    destroy(value);
                }
            }
        }
    }
}

impl<V: fmt::Debug, S> fmt::Debug for Table<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V, S> IntoIterator for &'a Table<V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands on slot 0
    }

    fn small_colliding(capacity: usize) -> Table<i32, ConstBuildHasher> {
        let config = TableConfig::builder().initial_capacity(capacity).build();
        Table::with_config_and_hasher(config, ConstBuildHasher).unwrap()
    }

    fn occupied_at<V, S>(t: &Table<V, S>, idx: usize) -> Option<&str> {
        t.slots[idx].entry().map(|(k, _)| k)
    }

    /// Invariant: keys displaced past a deleted slot stay reachable; the
    /// probe only stops on `Empty`.
    #[test]
    fn lookup_continues_past_tombstone() {
        let mut t = small_colliding(16);
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        t.put("c", 3).unwrap();
        assert_eq!(occupied_at(&t, 2), Some("c"));

        assert_eq!(t.remove("b"), Some(2));
        assert!(matches!(t.slots[1], Slot::Tombstone));
        assert_eq!(t.get("c"), Some(&3));
        assert!(t.contains("c"));
        assert!(!t.contains("b"));
    }

    /// Invariant: inserting a new key reuses the first tombstone on its probe
    /// path and decrements the tombstone counter.
    #[test]
    fn insert_reuses_tombstone_and_decrements_counter() {
        let mut t = small_colliding(16);
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            t.put(k, i as i32).unwrap();
        }
        t.remove("a").unwrap();
        assert_eq!(t.tombstones(), 1);
        assert_eq!(t.len(), 2);

        t.put("d", 9).unwrap();
        assert_eq!(occupied_at(&t, 0), Some("d"));
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.len(), 3);
    }

    /// Invariant: overwriting an existing key past a tombstone updates it in
    /// place rather than inserting a duplicate into the tombstone.
    #[test]
    fn overwrite_past_tombstone_does_not_duplicate() {
        let mut t = small_colliding(16);
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        t.remove("a").unwrap();
        t.put("b", 20).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.tombstones(), 1);
        assert_eq!(occupied_at(&t, 1), Some("b"));
        assert_eq!(t.iter().count(), 1);
        assert_eq!(t.get("b"), Some(&20));
    }

    /// Invariant: resize rehashes live entries, discards tombstones and keeps
    /// every mapping.
    #[test]
    fn resize_discards_tombstones() {
        let mut t: Table<usize> = Table::new();
        for i in 0..30 {
            t.put(&format!("k{i}"), i).unwrap();
        }
        for i in 0..10 {
            t.remove(&format!("k{i}")).unwrap();
        }
        assert_eq!(t.tombstones(), 10);

        t.resize(257).unwrap();
        assert_eq!(t.capacity(), 257);
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.len(), 20);
        assert!(t.slots.iter().all(|s| !matches!(s, Slot::Tombstone)));
        for i in 10..30 {
            assert_eq!(t.get(&format!("k{i}")), Some(&i));
        }
    }

    /// Invariant: a failed resize leaves capacity, counters and entries as
    /// they were.
    #[test]
    fn failed_resize_leaves_table_untouched() {
        let mut t: Table<u64> = Table::new();
        t.put("x", 1).unwrap();
        t.put("y", 2).unwrap();
        t.remove("y").unwrap();

        match t.resize(usize::MAX) {
            Err(TableError::AllocationFailure { requested }) => assert_eq!(requested, usize::MAX),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(t.capacity(), 101);
        assert_eq!(t.len(), 1);
        assert_eq!(t.tombstones(), 1);
        assert_eq!(t.get("x"), Some(&1));
    }

    #[test]
    fn resize_below_count_rejected() {
        let mut t: Table<u8> = Table::new();
        for k in ["a", "b", "c"] {
            t.put(k, 0).unwrap();
        }
        assert_eq!(
            t.resize(2),
            Err(TableError::InvalidCapacity {
                requested: 2,
                count: 3
            })
        );
        assert!(t.resize(0).is_err());
        assert_eq!(t.capacity(), 101);
    }

    /// Invariant: a single-slot table never loops: misses on a full table
    /// terminate and the next new key forces growth.
    #[test]
    fn full_single_slot_table_terminates_and_grows() {
        let config = TableConfig::builder()
            .initial_capacity(1)
            .shrink_threshold(0.0)
            .build();
        let mut t: Table<i32> = Table::with_config(config).unwrap();
        t.put("only", 1).unwrap();
        assert_eq!(t.capacity(), 1);
        assert!(!t.contains("missing"));
        assert_eq!(t.get("missing"), None);

        t.put("second", 2).unwrap();
        assert_eq!(t.capacity(), 2);
        assert_eq!(t.get("only"), Some(&1));
        assert_eq!(t.get("second"), Some(&2));
    }

    /// Invariant: the destructor sees overwritten values and values live at
    /// drop, but not tombstoned ones.
    #[test]
    fn destructor_skips_removed_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut t = Table::with_destructor(move |v: i32| sink.borrow_mut().push(v));
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        t.put("a", 3).unwrap();
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(t.remove("b"), Some(2));
        drop(t);
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }

    #[test]
    fn counters_within_capacity_under_churn() {
        let mut t = small_colliding(8);
        for round in 0..50 {
            let k = format!("k{}", round % 7);
            if round % 3 == 0 {
                t.remove(&k);
            } else {
                t.put(&k, round).unwrap();
            }
            assert!(t.len() + t.tombstones() <= t.capacity());
            assert_eq!(t.audit(), (t.len(), t.tombstones()));
        }
    }
}
