//! Synchronization primitives.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::arena::{Arena, Snapshot};
use crate::block::{Address, Block, Size};
use crate::fail::{self, Result};
use crate::realloc::{Realloc, Relocation};

/// A shared arena.
///
/// This assures that only one holds mutability of the inner arena. Mutations (`allocate`, `free`,
/// `realloc`) take the write lock, so they are serialized and never observed half-applied.
/// Queries take the read lock and may run concurrently with each other, but never with a
/// mutation.
///
/// To run a sequence of operations without interleaving, hold the guard returned by
/// [`lock`](#method.lock). The OOM handler is called after the lock is released, except when the
/// caller holds the guard itself.
#[derive(Debug, Default)]
pub struct Locked<A> {
    /// The inner arena.
    inner: RwLock<A>,
}

impl<A> Locked<A> {
    /// Wrap an arena.
    pub fn new(inner: A) -> Locked<A> {
        Locked {
            inner: RwLock::new(inner),
        }
    }

    /// Lock the arena for writing.
    ///
    /// If another lock is held, this will block the thread until it is released.
    #[inline]
    pub fn lock(&self) -> RwLockWriteGuard<A> {
        self.inner.write()
    }

    /// Lock the arena for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<A> {
        self.inner.read()
    }

    /// Unwrap the inner arena.
    pub fn into_inner(self) -> A {
        self.inner.into_inner()
    }
}

impl<A: Arena> Locked<A> {
    /// Allocate `size` bytes.
    ///
    /// See [`Arena::allocate`].
    #[inline]
    pub fn allocate(&self, size: Size) -> Result<Address> {
        let res = self.lock().try_allocate(size);
        fail::report(size, res)
    }

    /// Free the block of `size` bytes at `address`.
    ///
    /// See [`Arena::free`].
    #[inline]
    pub fn free(&self, address: Address, size: Size) -> Result<()> {
        self.lock().free(address, size)
    }

    /// The total number of addressable bytes.
    #[inline]
    pub fn capacity(&self) -> Size {
        self.read().capacity()
    }

    /// The total number of free bytes.
    #[inline]
    pub fn free_memory(&self) -> Size {
        self.read().free_memory()
    }

    /// The size of the largest free block.
    #[inline]
    pub fn largest_free_block(&self) -> Size {
        self.read().largest_free_block()
    }

    /// The total number of allocated bytes.
    #[inline]
    pub fn allocated_memory(&self) -> Size {
        self.read().allocated_memory()
    }

    /// The free blocks, in address order.
    pub fn free_blocks(&self) -> Vec<Block> {
        self.read().free_blocks()
    }

    /// The allocated blocks, in address order.
    pub fn allocated_blocks(&self) -> Vec<Block> {
        self.read().allocated_blocks()
    }

    /// Take a consistent snapshot of the arena.
    pub fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }

    /// A human-readable description of the arena.
    pub fn status(&self) -> String {
        self.read().status()
    }
}

impl<A: Realloc> Locked<A> {
    /// Resize an allocation inplace.
    ///
    /// See [`Realloc::realloc_inplace`].
    #[inline]
    pub fn realloc_inplace(&self, address: Address, old_size: Size, new_size: Size)
                           -> Result<()> {
        self.lock().realloc_inplace(address, old_size, new_size)
    }

    /// Resize an allocation, moving it if needed.
    ///
    /// See [`Realloc::realloc`].
    #[inline]
    pub fn realloc(&self, address: Address, old_size: Size, new_size: Size)
                   -> Result<Relocation> {
        let res = self.lock().try_realloc(address, old_size, new_size);
        fail::report(new_size, res)
    }
}

/// Exclusive access needs no locking.
impl<A: Arena> Arena for Locked<A> {
    fn capacity(&self) -> Size {
        self.read().capacity()
    }

    fn try_allocate(&mut self, size: Size) -> Result<Address> {
        self.inner.get_mut().try_allocate(size)
    }

    fn free(&mut self, address: Address, size: Size) -> Result<()> {
        self.inner.get_mut().free(address, size)
    }

    fn free_memory(&self) -> Size {
        self.read().free_memory()
    }

    fn largest_free_block(&self) -> Size {
        self.read().largest_free_block()
    }

    fn free_blocks(&self) -> Vec<Block> {
        self.read().free_blocks()
    }

    fn allocated_blocks(&self) -> Vec<Block> {
        self.read().allocated_blocks()
    }

    fn allocated_memory(&self) -> Size {
        self.read().allocated_memory()
    }

    fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }
}
