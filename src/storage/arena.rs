//! Linear Bump Allocator
//!
//! All stored values live in one contiguous, fixed-capacity byte region that
//! is reserved once at startup. Allocation is a cursor bump: record the
//! current offset, advance the cursor, hand the offset back. There is no
//! per-allocation metadata, no free list, and no per-object free; the only
//! way to reclaim space is a bulk [`Arena::reset`].
//!
//! ## Why offsets instead of pointers
//!
//! The backing region never grows and never relocates, so an
//! `(offset, length)` pair is a stable handle for a stored value. [`ValueRef`]
//! is exactly that pair; it carries no ownership and is resolved back to
//! bytes through [`Arena::get`]. A `ValueRef` must not be used across a
//! `reset` of the arena it came from.
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::Arena;
//!
//! let mut arena = Arena::with_capacity(1024);
//! let value = arena.store(b"hello").unwrap();
//! assert_eq!(arena.get(value), b"hello");
//! assert_eq!(arena.remaining(), 1024 - 5);
//! ```

use thiserror::Error;

/// Allocation failure: the arena does not have enough room left.
///
/// The cursor is unchanged when this is returned, so the caller may keep
/// using the arena for smaller requests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("arena out of capacity: requested {requested} bytes, {remaining} remaining")]
pub struct ArenaFull {
    /// Bytes the caller asked for.
    pub requested: usize,
    /// Bytes the arena still had available.
    pub remaining: usize,
}

/// A view into bytes owned by an [`Arena`].
///
/// Offsets stay valid until the arena is reset. Cheap to copy; the keyspace
/// stores one of these per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRef {
    offset: usize,
    len: usize,
}

impl ValueRef {
    /// Length in bytes of the referenced range.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for a zero-length value.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Fixed-capacity linear allocator backing all stored values.
pub struct Arena {
    region: Box<[u8]>,
    cursor: usize,
}

impl Arena {
    /// Reserves a region of `capacity` bytes. The region is allocated once
    /// here and never grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            region: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Allocates `len` bytes and returns the start offset of the range.
    ///
    /// On success the returned range `[offset, offset + len)` is disjoint
    /// from every previously returned live range and the cursor advances by
    /// exactly `len`. On failure the cursor is unchanged.
    pub fn allocate(&mut self, len: usize) -> Result<usize, ArenaFull> {
        if len > self.remaining() {
            return Err(ArenaFull {
                requested: len,
                remaining: self.remaining(),
            });
        }
        let offset = self.cursor;
        self.cursor += len;
        Ok(offset)
    }

    /// Allocates `len` bytes with the start offset rounded up to a multiple
    /// of `align`, which must be a power of two.
    ///
    /// The padding bytes are consumed; the cursor is unchanged on failure.
    pub fn allocate_aligned(&mut self, len: usize, align: usize) -> Result<usize, ArenaFull> {
        debug_assert!(align.is_power_of_two());
        let aligned = (self.cursor + align - 1) & !(align - 1);
        if aligned > self.region.len() || len > self.region.len() - aligned {
            return Err(ArenaFull {
                requested: len,
                remaining: self.remaining(),
            });
        }
        self.cursor = aligned + len;
        Ok(aligned)
    }

    /// Copies `bytes` into a freshly allocated range and returns a view of
    /// it. This is the one-way flow behind SET: the source bytes live in a
    /// receive buffer that will be overwritten on the next read, so they are
    /// copied here before any reference to them is retained.
    pub fn store(&mut self, bytes: &[u8]) -> Result<ValueRef, ArenaFull> {
        let offset = self.allocate(bytes.len())?;
        self.region[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(ValueRef {
            offset,
            len: bytes.len(),
        })
    }

    /// Resolves a view back to its bytes.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not refer to a live range of this arena, which
    /// can only happen if it outlived a `reset` or came from another arena.
    pub fn get(&self, value: ValueRef) -> &[u8] {
        debug_assert!(value.offset + value.len <= self.cursor);
        &self.region[value.offset..value.offset + value.len]
    }

    /// Rewinds the cursor to zero, invalidating every previously returned
    /// offset and `ValueRef`. The caller must ensure no live views remain.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes still available for allocation.
    pub fn remaining(&self) -> usize {
        self.region.len() - self.cursor
    }

    /// Total size of the backing region.
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes consumed so far, padding included.
    pub fn used(&self) -> usize {
        self.cursor
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.region.len())
            .field("used", &self.cursor)
            .finish()
    }
}
