//! Reallocation.

use crate::arena::Arena;
use crate::block::{Address, Size};
use crate::bookkeeper::Bookkeeper;
use crate::fail::{self, Error, Result};
use crate::pool::Pool;

/// The outcome of a reallocation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Relocation {
    /// The allocation was resized without moving.
    InPlace(Address),
    /// The allocation was moved.
    ///
    /// The arena does not own the bytes, so the owner must copy `len` bytes from `from` to `to`.
    Moved {
        /// The old start address, which is now free.
        from: Address,
        /// The new start address.
        to: Address,
        /// The number of bytes to copy.
        len: Size,
    },
}

impl Relocation {
    /// The start address of the allocation after the reallocation.
    #[inline]
    pub fn address(&self) -> Address {
        match *self {
            Relocation::InPlace(address) => address,
            Relocation::Moved { to, .. } => to,
        }
    }
}

/// Arenas which can resize allocations.
pub trait Realloc: Arena {
    /// Extend/shrink the allocation of `old_size` bytes at `address` inplace.
    ///
    /// Shrinking cannot fail (given a valid allocation). Growing fails with `OutOfMemory`, leaving
    /// the arena intact, if the free space right after the allocation is too small.
    fn realloc_inplace(&mut self, address: Address, old_size: Size, new_size: Size)
                       -> Result<()>;

    /// Reallocate the allocation of `old_size` bytes at `address` to `new_size` bytes, without
    /// calling the OOM handler.
    ///
    /// This will first try to resize inplace. If that fails, a new block is allocated and the old
    /// one freed. If the new allocation fails, the old block is left intact.
    fn try_realloc(&mut self, address: Address, old_size: Size, new_size: Size)
                   -> Result<Relocation> {
        match self.realloc_inplace(address, old_size, new_size) {
            Ok(()) => Ok(Relocation::InPlace(address)),
            Err(Error::OutOfMemory { .. }) => {
                // Reallocation cannot be done inplace.

                // Allocate a new block with the new size.
                let to = self.try_allocate(new_size)?;
                // Free the old block.
                self.free(address, old_size)?;

                Ok(Relocation::Moved {
                    from: address,
                    to: to,
                    len: old_size.min(new_size),
                })
            },
            Err(err) => Err(err),
        }
    }

    /// Reallocate the allocation of `old_size` bytes at `address` to `new_size` bytes.
    ///
    /// See [`try_realloc`](#method.try_realloc). The OOM handler is called if the allocation can
    /// be neither resized nor moved.
    fn realloc(&mut self, address: Address, old_size: Size, new_size: Size)
               -> Result<Relocation> {
        let res = self.try_realloc(address, old_size, new_size);
        fail::report(new_size, res)
    }
}

impl<P: Pool> Realloc for Bookkeeper<P> {
    #[inline]
    fn realloc_inplace(&mut self, address: Address, old_size: Size, new_size: Size)
                       -> Result<()> {
        Bookkeeper::realloc_inplace(self, address, old_size, new_size)
    }
}

impl<A: Realloc + ?Sized> Realloc for Box<A> {
    fn realloc_inplace(&mut self, address: Address, old_size: Size, new_size: Size)
                       -> Result<()> {
        (**self).realloc_inplace(address, old_size, new_size)
    }
}
