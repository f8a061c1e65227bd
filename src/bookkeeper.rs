//! Memory bookkeeping.

use core::cmp::Ordering;
use std::collections::BTreeMap;

use crate::arena::Arena;
use crate::block::{Address, Block, Size};
use crate::fail::{self, Error, Result};
use crate::pool::Pool;

/// The arena bookkeeper.
///
/// This is the main component of rarena. Its job is to keep track of the allocated blocks and to
/// hand the free blocks to a [`Pool`], which decides how they are indexed and which one serves an
/// allocation. The choice of pool is the choice of strategy.
///
/// Only making use of [`allocate`](#method.allocate), [`free`](#method.free),
/// [`realloc_inplace`](#method.realloc_inplace) (and following their respective assumptions)
/// guarantee that no overlap, leak or otherwise inconsistent state will arise.
#[derive(Clone, Debug)]
pub struct Bookkeeper<P> {
    /// The size of the address space.
    capacity: Size,
    /// The free blocks.
    pool: P,
    /// The allocated blocks, start address to size.
    ///
    /// Every block in here was handed out by `allocate`, and is checked against when freed.
    allocated: BTreeMap<Address, Size>,
    /// The number of bytes currently allocated.
    used: Size,
}

impl<P: Pool> Bookkeeper<P> {
    /// Create a new arena of `capacity` bytes, all free.
    ///
    /// Fails with `InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: Size) -> Result<Bookkeeper<P>> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be positive"));
        }

        Ok(Bookkeeper {
            capacity: capacity,
            pool: P::from_block(Block::new(0, capacity)),
            allocated: BTreeMap::new(),
            used: 0,
        })
    }

    /// Look up the allocation of `size` bytes at `address`.
    fn lookup(&self, address: Address, size: Size) -> Result<Block> {
        fail::check_range(address, size, self.capacity)?;

        match self.allocated.get(&address) {
            None => Err(Error::InvalidFree {
                address: address,
            }),
            Some(&recorded) if recorded != size => Err(Error::SizeMismatch {
                address: address,
                recorded: recorded,
                given: size,
            }),
            Some(_) => Ok(Block::new(address, size)),
        }
    }

    /// Extend/shrink the allocation at `address` inplace.
    ///
    /// Shrinking returns the tail to the pool and cannot fail (given a valid allocation).
    /// Growing takes the missing bytes from the free block right after the allocation; if that
    /// block does not exist or is too small, `OutOfMemory` is returned and nothing changes.
    pub fn realloc_inplace(&mut self, address: Address, old_size: Size, new_size: Size)
                           -> Result<()> {
        let block = self.lookup(address, old_size)?;
        if new_size == 0 {
            return Err(Error::InvalidArgument("size must be positive"));
        }

        match new_size.cmp(&old_size) {
            Ordering::Equal => return Ok(()),
            Ordering::Less => {
                // Split the block in two segments, the main segment and the excessive segment.
                let (_, excessive) = block.split(new_size);
                // Free the excessive segment.
                self.pool.insert(excessive);
                self.used -= excessive.size();
            },
            Ordering::Greater => {
                let needed = new_size - old_size;

                // The blocks in the pool are never adjacent, so the one block starting at our end
                // is the only candidate for extending the allocation.
                if self.pool.take_at(block.end(), needed).is_none() {
                    log!(NOTE, self;address, "Cannot grow {:?} inplace to size {}.", block,
                         new_size);

                    return Err(Error::OutOfMemory {
                        requested: new_size,
                        largest: self.pool.largest(),
                    });
                }
                self.used += needed;
            },
        }

        self.allocated.insert(address, new_size);
        log!(NOTE, self;address, "Inplace reallocated {:?} to size {}.", block, new_size);

        // Check consistency.
        self.check();

        Ok(())
    }

    /// Leave the allocator.
    ///
    /// A block should be "registered" through this function when it leaves the allocator (e.g.,
    /// is returned), these are used to keep track of the current usage, and invalid frees.
    #[inline]
    fn leave(&mut self, block: Block) -> Address {
        let prev = self.allocated.insert(block.start(), block.size());
        debug_assert!(prev.is_none(), "Block {:?} handed out twice.", block);

        // Update the number of bytes allocated.
        self.used += block.size();

        block.start()
    }

    /// Enter the allocator.
    ///
    /// A block should be "registered" through this function when it enters the allocator (e.g.,
    /// is given as argument). The allocation record is validated and removed.
    #[inline]
    fn enter(&mut self, address: Address, size: Size) -> Result<Block> {
        let block = self.lookup(address, size)?;

        self.allocated.remove(&address);
        // Update the number of bytes allocated.
        self.used -= size;

        Ok(block)
    }

    /// No-op in release mode.
    #[cfg(not(debug_assertions))]
    #[inline]
    fn check(&self) {}

    /// Perform consistency checks.
    ///
    /// This will check for the following conditions:
    ///
    /// 1. The pool satisfies its own invariants.
    /// 2. Every byte is either free or allocated, exactly once.
    /// 3. No free blocks are adjacent.
    #[cfg(debug_assertions)]
    fn check(&self) {
        self.pool.check();

        assert_eq!(self.used, self.allocated.values().sum::<Size>(), "Allocated byte count out \
                   of sync.");
        assert_eq!(self.used + self.pool.free_memory(), self.capacity, "Bytes unaccounted for.");

        if let Err(violation) = self.snapshot().check() {
            panic!("Inconsistent arena: {}.", violation);
        }
    }

    /// Check for memory leaks.
    ///
    /// This will make sure that all the allocated blocks have been freed.
    #[cfg(feature = "debug_tools")]
    pub fn assert_no_leak(&self) {
        assert!(self.allocated.is_empty(), "Not all blocks freed. Total allocated space is {} \
                ({} blocks).", self.used, self.allocated.len());
    }
}

impl<P: Pool> Arena for Bookkeeper<P> {
    #[inline]
    fn capacity(&self) -> Size {
        self.capacity
    }

    /// Allocate a chunk of memory.
    ///
    /// The pool picks a fitting free block and we split it: the front part is returned, and the
    /// excessive space stays free.
    ///
    /// ```text
    ///    Address space
    ///   I----------I                 I-----------------------I
    ///   allocated      free block     ^ allocated
    ///
    ///   I----------I~~~~~~I----------I-----------------------I
    ///                ^      ^ excessive space, still free
    ///                our allocated block
    /// ```
    fn try_allocate(&mut self, size: Size) -> Result<Address> {
        if size == 0 {
            return Err(Error::InvalidArgument("size must be positive"));
        }

        if let Some(block) = self.pool.take(size) {
            let address = self.leave(block);
            log!(NOTE, self;address, "Allocated {:?}.", block);

            // Check consistency.
            self.check();
            debug_assert!(block.size() == size, "Requested space does not match with the returned \
                          block.");

            Ok(address)
        } else {
            let largest = self.pool.largest();
            log!(WARNING, self;(), "Cannot allocate {} bytes (largest free block is {}).", size,
                 largest);

            Err(Error::OutOfMemory {
                requested: size,
                largest: largest,
            })
        }
    }

    /// Free a memory block.
    ///
    /// ```text
    ///    Address space
    ///   I------I                                 I--------I
    ///   free   \_________________/               free
    ///          the used block we want to deallocate.
    /// ```
    ///
    /// If the blocks are adjacent, we merge them. This gives us:
    ///
    /// ```text
    ///    Address space
    ///   I------------------------I               I--------I
    /// ```
    ///
    /// If it cannot be done, the pool inserts the block as a new free block.
    fn free(&mut self, address: Address, size: Size) -> Result<()> {
        // "Enter" the allocator.
        let block = match self.enter(address, size) {
            Ok(block) => block,
            Err(err) => {
                log!(WARNING, self;address, "Rejected free of {} bytes at {}: {}.", size, address,
                     err);
                return Err(err);
            },
        };

        let merge = self.pool.insert(block);
        log!(NOTE, self;address, "Freed {:?} (merged left: {}, right: {}).", block, merge.left,
             merge.right);

        // Check consistency.
        self.check();

        Ok(())
    }

    #[inline]
    fn free_memory(&self) -> Size {
        self.pool.free_memory()
    }

    #[inline]
    fn largest_free_block(&self) -> Size {
        self.pool.largest()
    }

    fn free_blocks(&self) -> Vec<Block> {
        self.pool.blocks()
    }

    fn allocated_blocks(&self) -> Vec<Block> {
        self.allocated.iter().map(|(&start, &size)| Block::new(start, size)).collect()
    }

    #[inline]
    fn allocated_memory(&self) -> Size {
        self.used
    }
}
