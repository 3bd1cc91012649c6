//! Storage Module
//!
//! This module provides the value store behind the server: a linear bump
//! allocator holding all value bytes contiguously, and the keyspace mapping
//! owned keys to views into it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Keyspace                             │
//! │   HashMap<Bytes, ValueRef>                                  │
//! │        │                                                    │
//! │        │ (offset, len)                                      │
//! │        ▼                                                    │
//! │   ┌──────────────────────────────────────────────────┐      │
//! │   │ Arena: one contiguous region, bump cursor        │      │
//! │   │ [ val ][ val ][ old val (unreferenced) ][ free ] │      │
//! │   └──────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are copied into the arena exactly once, on SET. Overwrites and
//! deletes leave the old bytes in place unreferenced; the arena only grows
//! until it is exhausted or explicitly reset.

pub mod arena;
pub mod keyspace;

// Re-export commonly used types for convenience
pub use arena::{Arena, ArenaFull, ValueRef};
pub use keyspace::Keyspace;
