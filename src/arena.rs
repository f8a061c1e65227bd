//! The arena contract.
//!
//! An arena manages the linear address space `[0, capacity)`. At all times the space is
//! partitioned into free and allocated blocks, and no two free blocks are adjacent.

use core::fmt;

use thiserror::Error;

use crate::block::{Address, Block, Size};
use crate::fail::{self, Result};

/// A byte-addressable arena.
///
/// This is the capability every strategy (and every decorator) exposes. Callers can swap the
/// strategy without changing their code.
///
/// Only making use of [`allocate`](#method.allocate) and [`free`](#tymethod.free) (and following
/// their respective assumptions) guarantee that the partition of the arena stays consistent. A
/// failing call never changes the arena.
pub trait Arena {
    /// The total number of addressable bytes.
    fn capacity(&self) -> Size;

    /// Allocate `size` bytes, without calling the OOM handler.
    ///
    /// Fails with `InvalidArgument` if `size` is zero, and with `OutOfMemory` if no free block
    /// is large enough.
    fn try_allocate(&mut self, size: Size) -> Result<Address>;

    /// Allocate `size` bytes, returning the start address of the allocated block.
    ///
    /// This is [`try_allocate`](#tymethod.try_allocate) followed by a call to the OOM handler if
    /// no free block is large enough. Wrappers holding a lock should call `try_allocate` and
    /// report after unlocking.
    fn allocate(&mut self, size: Size) -> Result<Address> {
        let res = self.try_allocate(size);
        fail::report(size, res)
    }

    /// Free the block of `size` bytes starting at `address`.
    ///
    /// `address` must be the start of a live allocation of exactly `size` bytes. The freed block
    /// is merged with its free neighbours.
    fn free(&mut self, address: Address, size: Size) -> Result<()>;

    /// The total number of free bytes.
    fn free_memory(&self) -> Size;

    /// The size of the largest free block.
    fn largest_free_block(&self) -> Size;

    /// The free blocks, in address order.
    fn free_blocks(&self) -> Vec<Block>;

    /// The allocated blocks, in address order.
    fn allocated_blocks(&self) -> Vec<Block>;

    /// The total number of allocated bytes.
    fn allocated_memory(&self) -> Size {
        self.capacity() - self.free_memory()
    }

    /// Take a snapshot of the arena's partition.
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            capacity: self.capacity(),
            free: self.free_blocks(),
            allocated: self.allocated_blocks(),
        }
    }

    /// A human-readable description of the arena.
    fn status(&self) -> String {
        self.snapshot().to_string()
    }
}

impl<A: Arena + ?Sized> Arena for Box<A> {
    fn capacity(&self) -> Size {
        (**self).capacity()
    }

    fn try_allocate(&mut self, size: Size) -> Result<Address> {
        (**self).try_allocate(size)
    }

    fn free(&mut self, address: Address, size: Size) -> Result<()> {
        (**self).free(address, size)
    }

    fn free_memory(&self) -> Size {
        (**self).free_memory()
    }

    fn largest_free_block(&self) -> Size {
        (**self).largest_free_block()
    }

    fn free_blocks(&self) -> Vec<Block> {
        (**self).free_blocks()
    }

    fn allocated_blocks(&self) -> Vec<Block> {
        (**self).allocated_blocks()
    }

    fn allocated_memory(&self) -> Size {
        (**self).allocated_memory()
    }
}

/// A block tagged with its state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Segment {
    /// A free block.
    Free(Block),
    /// An allocated block.
    Allocated(Block),
}

impl Segment {
    /// The underlying block.
    #[inline]
    pub fn block(&self) -> Block {
        match *self {
            Segment::Free(block) | Segment::Allocated(block) => block,
        }
    }

    /// Is this segment free?
    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(*self, Segment::Free(_))
    }
}

/// A broken arena invariant.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Violation {
    /// No block covers the bytes starting at `at`.
    #[error("no block covers address {at}")]
    Gap {
        /// The first uncovered address.
        at: Address,
    },
    /// Two blocks share bytes.
    #[error("blocks {0:?} and {1:?} overlap")]
    Overlap(Block, Block),
    /// Two free blocks are adjacent, so a merge has been missed.
    #[error("free blocks {0:?} and {1:?} are adjacent")]
    Adjacent(Block, Block),
    /// A block reaches beyond the capacity.
    #[error("block {0:?} exceeds the capacity")]
    Overrun(Block),
    /// An empty block is tracked.
    #[error("empty block at {0}")]
    Empty(Address),
}

/// A point-in-time view of an arena.
///
/// This is meant for tests and diagnostics, it is not part of the correctness contract.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    /// The capacity of the arena.
    pub capacity: Size,
    /// The free blocks, in address order.
    pub free: Vec<Block>,
    /// The allocated blocks, in address order.
    pub allocated: Vec<Block>,
}

impl Snapshot {
    /// All blocks tagged with their state, in address order.
    pub fn layout(&self) -> Vec<Segment> {
        let mut layout: Vec<Segment> = self.free.iter().cloned().map(Segment::Free)
            .chain(self.allocated.iter().cloned().map(Segment::Allocated))
            .collect();
        layout.sort_by_key(|x| x.block());

        layout
    }

    /// Check the arena invariants.
    ///
    /// This will check for the following conditions:
    ///
    /// 1. The blocks partition `[0, capacity)`: no gaps, no overlaps, no empty blocks.
    /// 2. No two free blocks are adjacent.
    pub fn check(&self) -> core::result::Result<(), Violation> {
        let mut prev: Option<Segment> = None;
        let mut cursor = 0;

        for segment in self.layout() {
            let block = segment.block();

            if block.is_empty() {
                return Err(Violation::Empty(block.start()));
            }
            if block.end() > self.capacity {
                return Err(Violation::Overrun(block));
            }
            if block.start() > cursor {
                return Err(Violation::Gap { at: cursor });
            }
            if let Some(prev) = prev {
                if prev.block().overlaps(&block) {
                    return Err(Violation::Overlap(prev.block(), block));
                }
                if prev.is_free() && segment.is_free() {
                    return Err(Violation::Adjacent(prev.block(), block));
                }
            }

            cursor = block.end();
            prev = Some(segment);
        }

        if cursor < self.capacity {
            Err(Violation::Gap { at: cursor })
        } else {
            Ok(())
        }
    }
}

/// Print the snapshot as `Free: [...]` and `Allocated: [...]` lines.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn list(f: &mut fmt::Formatter, blocks: &[Block]) -> fmt::Result {
            write!(f, "[")?;
            for (n, block) in blocks.iter().enumerate() {
                if n != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", block)?;
            }
            write!(f, "]")
        }

        write!(f, "Free: ")?;
        list(f, &self.free)?;
        write!(f, "\nAllocated: ")?;
        list(f, &self.allocated)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot(free: &[(Address, Size)], allocated: &[(Address, Size)]) -> Snapshot {
        Snapshot {
            capacity: 100,
            free: free.iter().map(|&(a, s)| Block::new(a, s)).collect(),
            allocated: allocated.iter().map(|&(a, s)| Block::new(a, s)).collect(),
        }
    }

    #[test]
    fn test_valid() {
        let snapshot = snapshot(&[(0, 50), (90, 10)], &[(50, 40)]);

        assert_eq!(snapshot.check(), Ok(()));
        assert_eq!(snapshot.to_string(), "Free: [[0,50], [90,10]]\nAllocated: [[50,40]]");
    }

    #[test]
    fn test_gap() {
        assert_eq!(snapshot(&[(0, 50)], &[(60, 40)]).check(), Err(Violation::Gap { at: 50 }));
        assert_eq!(snapshot(&[(0, 50)], &[]).check(), Err(Violation::Gap { at: 50 }));
    }

    #[test]
    fn test_overlap() {
        assert_eq!(
            snapshot(&[(0, 50)], &[(40, 60)]).check(),
            Err(Violation::Overlap(Block::new(0, 50), Block::new(40, 60)))
        );
        assert_eq!(
            snapshot(&[(0, 50)], &[(10, 5), (50, 50)]).check(),
            Err(Violation::Overlap(Block::new(0, 50), Block::new(10, 5)))
        );
    }

    #[test]
    fn test_adjacent() {
        assert_eq!(
            snapshot(&[(0, 50), (50, 10)], &[(60, 40)]).check(),
            Err(Violation::Adjacent(Block::new(0, 50), Block::new(50, 10)))
        );
    }

    #[test]
    fn test_overrun() {
        assert_eq!(
            snapshot(&[(0, 50)], &[(50, 60)]).check(),
            Err(Violation::Overrun(Block::new(50, 60)))
        );
    }
}
