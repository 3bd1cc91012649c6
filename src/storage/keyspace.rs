//! Keyspace: Key → Arena-View Mapping
//!
//! The keyspace binds owned keys to [`ValueRef`] views into the arena that
//! it owns. Keys are stored as `Bytes`, never as views, because the
//! receive-buffer bytes they are parsed from are overwritten on the next
//! read. Value bytes are copied into the arena on every SET; overwriting a
//! key rebinds its view and leaves the old value bytes in the arena
//! unreferenced.
//!
//! The event loop is the only caller, so there is no interior locking.

use std::collections::HashMap;

use bytes::Bytes;

use super::arena::{Arena, ArenaFull, ValueRef};

/// The mapping from keys to arena-backed values.
pub struct Keyspace {
    entries: HashMap<Bytes, ValueRef>,
    arena: Arena,
}

impl Keyspace {
    /// Creates an empty keyspace backed by an arena of `arena_capacity`
    /// bytes.
    pub fn with_arena_capacity(arena_capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            arena: Arena::with_capacity(arena_capacity),
        }
    }

    /// Copies `value` into the arena and binds `key` to the new view.
    ///
    /// Fails without touching the mapping when the arena cannot hold the
    /// value; the caller turns that into a protocol-level out-of-memory
    /// error and the keyspace stays usable.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), ArenaFull> {
        let view = self.arena.store(value)?;
        match self.entries.get_mut(key) {
            Some(slot) => *slot = view,
            None => {
                self.entries.insert(Bytes::copy_from_slice(key), view);
            }
        }
        Ok(())
    }

    /// Returns the current value bytes for `key`, if present.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(|view| self.arena.get(*view))
    }

    /// Removes `key`, reporting whether it was present. The value bytes
    /// remain in the arena unreferenced, like an overwrite.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Whether `key` is currently bound.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys currently bound.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no keys are bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyspace")
            .field("keys", &self.entries.len())
            .field("arena", &self.arena)
            .finish()
    }
}
