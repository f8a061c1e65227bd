//! Free-block pools.
//!
//! A pool is the index over the free blocks of an arena. Every pool keeps the same logical set
//! of free blocks, sorted by address and maximally merged, but indexes it differently:
//!
//! - [`LinearPool`]: a sorted vector, scanned first-fit and re-sorted on every free.
//! - [`LinkedPool`]: a doubly linked list in a node table, walked first-fit and merged in place.
//! - [`IndexedPool`]: ordered indices by size and by both ends, giving best-fit lookup and
//!   neighbour discovery in logarithmic time.

mod indexed;
mod linear;
mod linked;

pub use self::indexed::IndexedPool;
pub use self::linear::LinearPool;
pub use self::linked::LinkedPool;

use crate::block::{Address, Block, Size};

/// The outcome of returning a block to a pool.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Merge {
    /// The block was merged into its left neighbour.
    pub left: bool,
    /// The block absorbed its right neighbour.
    pub right: bool,
}

/// An index over free blocks.
///
/// Guarantees
/// ==========
///
/// Assuming only the methods below are used, and blocks given to [`insert`](#tymethod.insert)
/// never overlap the pool's blocks:
///
/// 1. No block in the pool is empty.
/// 2. No two blocks in the pool are adjacent.
pub trait Pool {
    /// Create a pool holding a single free block.
    fn from_block(block: Block) -> Self where Self: Sized;

    /// Take `size` bytes from the front of a fitting block.
    ///
    /// The pool's policy decides which fitting block is used. The excessive part of the block
    /// stays in the pool. Returns `None` if no block is large enough.
    fn take(&mut self, size: Size) -> Option<Block>;

    /// Take `size` bytes from the front of the block starting exactly at `start`.
    ///
    /// Returns `None`, leaving the pool untouched, if there is no such block or it is too small.
    fn take_at(&mut self, start: Address, size: Size) -> Option<Block>;

    /// Return a block to the pool, merging it with its neighbours.
    fn insert(&mut self, block: Block) -> Merge;

    /// The blocks of the pool, in address order.
    fn blocks(&self) -> Vec<Block>;

    /// The number of blocks in the pool.
    fn len(&self) -> usize;

    /// Is the pool empty (i.e. is the arena fully allocated)?
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The total number of bytes in the pool.
    fn free_memory(&self) -> Size {
        self.blocks().iter().map(Block::size).sum()
    }

    /// The size of the largest block.
    fn largest(&self) -> Size {
        self.blocks().iter().map(Block::size).max().unwrap_or(0)
    }

    /// Perform consistency checks.
    ///
    /// This will check for the following conditions:
    ///
    /// 1. The blocks are sorted.
    /// 2. No blocks are empty.
    /// 3. No blocks are adjacent.
    ///
    /// NOP in release mode (`debug_assertions` disabled).
    fn check(&self) {
        if cfg!(debug_assertions) {
            let blocks = self.blocks();
            assert_eq!(blocks.len(), self.len(), "The block count is out of sync.");

            for (n, i) in blocks.iter().enumerate() {
                assert!(!i.is_empty(), "Empty block at index {} ({:?}).", n, i);

                if let Some(prev) = n.checked_sub(1).map(|x| blocks[x]) {
                    // Check if sorted.
                    assert!(prev.end() <= i.start(), "The pool is not sorted at index {} ({:?} \
                            before {:?}).", n, prev, i);
                    // Make sure no blocks are adjacent.
                    assert!(!prev.left_to(i), "Adjacent blocks at index {} ({:?} and {:?}).", n,
                            prev, i);
                }
            }
        }
    }
}

/// Which sides of `block` were merged, given the pool block now containing it.
#[inline]
fn merge_of(block: &Block, merged: &Block) -> Merge {
    Merge {
        left: merged.start() < block.start(),
        right: merged.end() > block.end(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Run a test against every pool.
    fn each_pool<F: Fn(&mut dyn Pool)>(capacity: Size, f: F) {
        f(&mut LinearPool::from_block(Block::new(0, capacity)));
        f(&mut LinkedPool::from_block(Block::new(0, capacity)));
        f(&mut IndexedPool::from_block(Block::new(0, capacity)));
    }

    #[test]
    fn test_take_all() {
        each_pool(100, |pool| {
            assert_eq!(pool.take(100), Some(Block::new(0, 100)));
            assert!(pool.is_empty());
            assert_eq!(pool.take(1), None);
            assert_eq!(pool.largest(), 0);
            pool.check();
        });
    }

    #[test]
    fn test_take_split() {
        each_pool(100, |pool| {
            assert_eq!(pool.take(20), Some(Block::new(0, 20)));
            assert_eq!(pool.take(30), Some(Block::new(20, 30)));
            assert_eq!(pool.blocks(), vec![Block::new(50, 50)]);
            assert_eq!(pool.free_memory(), 50);
            assert_eq!(pool.take(51), None);
            pool.check();
        });
    }

    #[test]
    fn test_insert_merges() {
        each_pool(100, |pool| {
            let a = pool.take(10).unwrap();
            let b = pool.take(10).unwrap();
            let c = pool.take(10).unwrap();
            let _d = pool.take(10).unwrap();

            assert_eq!(pool.insert(b), Merge::default());
            assert_eq!(pool.insert(a), Merge { left: false, right: true });
            assert_eq!(pool.insert(c), Merge { left: true, right: false });
            assert_eq!(pool.blocks(), vec![Block::new(0, 30), Block::new(40, 60)]);
            pool.check();
        });
    }

    #[test]
    fn test_insert_double_merge() {
        each_pool(30, |pool| {
            let a = pool.take(10).unwrap();
            let b = pool.take(10).unwrap();
            let c = pool.take(10).unwrap();

            pool.insert(a);
            pool.insert(c);
            assert_eq!(pool.len(), 2);
            assert_eq!(pool.insert(b), Merge { left: true, right: true });
            assert_eq!(pool.blocks(), vec![Block::new(0, 30)]);
            pool.check();
        });
    }

    #[test]
    fn test_take_at() {
        each_pool(100, |pool| {
            let a = pool.take(40).unwrap();
            pool.take(20).unwrap();
            pool.insert(a);

            // Not the start of a block.
            assert_eq!(pool.take_at(10, 5), None);
            // Too small.
            assert_eq!(pool.take_at(0, 41), None);
            assert_eq!(pool.take_at(0, 15), Some(Block::new(0, 15)));
            assert_eq!(pool.take_at(15, 25), Some(Block::new(15, 25)));
            assert_eq!(pool.blocks(), vec![Block::new(60, 40)]);
            pool.check();
        });
    }
}
