//! probe-table: a single-threaded, string-keyed hash table using open
//! addressing with linear probing and lazy deletion.
//!
//! Internal Design:
//!
//! Summary
//! - One contiguous `Vec` of slots. Each slot is `Empty`, `Occupied`
//!   (owned key copy plus value) or `Tombstone`.
//! - Layers:
//!   - Table<V, S>: storage, probing, resize policy and entry lifecycle.
//!   - Iter<'a, V>: a cursor over occupied slots that borrows the table.
//!
//! Probing
//! - Home slot is `hash(key) % capacity`, recomputed on every operation
//!   from the current capacity. Hashers must be deterministic; the
//!   default is djb2 (`hash::Djb2BuildHasher`).
//! - Lookups scan forward with wraparound, skip tombstones, and stop at
//!   the first `Empty` slot. A tombstone never ends a lookup, because a
//!   key may have been placed past the slot that was later deleted.
//! - Inserts of a new key take the first `Empty` or `Tombstone` on the
//!   probe path. Reusing a tombstone decrements the tombstone counter.
//!
//! Resize policy
//! - Grow before inserting a new key when `(count + tombstones) /
//!   capacity` exceeds `grow_threshold` (0.7 by default): capacity is
//!   multiplied by `growth_factor` (2).
//! - Shrink after a removal when `count / capacity` falls below
//!   `shrink_threshold` (0.1), never below the initial capacity.
//! - Resizing rehashes every occupied slot into a fresh array and drops
//!   tombstones. It runs inline and costs O(capacity) on that call.
//!
//! Ownership
//! - Keys are copied in on insert and freed when the entry is removed or
//!   the table is dropped.
//! - The table owns its values. `remove` hands the value back to the
//!   caller. Values replaced by `put` and values still live when the
//!   table drops go to the optional destructor (or are simply dropped
//!   when none is set).
//!
//! Failure
//! - Only allocation can fail. Slot arrays and key copies are reserved
//!   with `try_reserve_exact`; on failure the table is left exactly as
//!   before and `put` returns the value inside `PutError`.
//!
//! Notes and non-goals
//! - Not thread-safe; the boxed destructor makes `Table` `!Send`/`!Sync`.
//! - Keys are `str` only.
//! - Iteration order is slot order and is not stable across resizes.

pub mod config;
pub mod error;
pub mod hash;
pub mod iter;
pub mod table;
mod table_proptest;

// Public surface
pub use config::{TableConfig, TableConfigBuilder};
pub use error::{PutError, Result, TableError};
pub use hash::{Djb2BuildHasher, Fnv1aBuildHasher};
pub use iter::{Iter, Keys, Values};
pub use table::{Destructor, Table};
