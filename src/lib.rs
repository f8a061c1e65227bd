//! **Rarena:** The byte-addressable arena.
//!
//! This crate manages a linear address space `[0, capacity)` of abstract bytes. Callers allocate
//! contiguous blocks and free them by start address and size. Freed blocks are coalesced with
//! their free neighbours, so the arena never fragments beyond what the live allocations force.
//!
//! The arena never touches real memory; it only hands out addresses. Three strategies manage the
//! free blocks, differing only in how they index them:
//!
//! - [`LinearArena`]: first fit over a sorted vector.
//! - [`LinkedArena`]: first fit over a doubly linked list.
//! - [`IndexedArena`]: best fit over size-ordered indices.
//!
//! All of them implement [`Arena`], and [`Strategy`] selects one at runtime.

#![warn(missing_docs)]

#[macro_use]
mod log;

mod aligned;
mod arena;
mod block;
mod bookkeeper;
mod realloc;
mod sync;
mod sys;
pub mod fail;
pub mod pool;
pub mod strategy;

pub use crate::aligned::Aligned;
pub use crate::arena::{Arena, Segment, Snapshot, Violation};
pub use crate::block::{Address, Block, Size};
pub use crate::bookkeeper::Bookkeeper;
pub use crate::fail::{Error, Result};
pub use crate::realloc::{Realloc, Relocation};
pub use crate::strategy::Strategy;
pub use crate::sync::Locked;

/// An arena using a linear, first-fit free list.
pub type LinearArena = Bookkeeper<pool::LinearPool>;
/// An arena using a linked, first-fit free list.
pub type LinkedArena = Bookkeeper<pool::LinkedPool>;
/// An arena using size-indexed, best-fit free blocks.
pub type IndexedArena = Bookkeeper<pool::IndexedPool>;
