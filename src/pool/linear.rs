//! The linear free list.

use crate::block::{Address, Block, Size};

use super::{merge_of, Merge, Pool};

/// A first-fit pool backed by a sorted vector.
///
/// Allocation scans the vector for the first block large enough. Freeing pushes the block, sorts
/// the vector by address and coalesces it in a single pass.
#[derive(Clone, Debug)]
pub struct LinearPool {
    /// The free blocks.
    ///
    /// The list is always sorted with respect to the block's addresses, and no two blocks are
    /// adjacent.
    pool: Vec<Block>,
}

impl LinearPool {
    /// Find the index of the block starting at `start`.
    #[inline]
    fn find(&self, start: Address) -> Option<usize> {
        self.pool.binary_search_by_key(&start, Block::start).ok()
    }

    /// Take `size` bytes from the block at index `ind`.
    ///
    /// The excessive space replaces the block, which keeps the list sorted.
    fn take_ind(&mut self, ind: usize, size: Size) -> Block {
        let (res, excessive) = self.pool[ind].split(size);

        if excessive.is_empty() {
            self.pool.remove(ind);
        } else {
            self.pool[ind] = excessive;
        }

        res
    }

    /// Merge every run of adjacent blocks.
    ///
    /// The list must be sorted.
    #[inline]
    fn coalesce(&mut self) {
        self.pool.dedup_by(|next, prev| prev.merge_right(next).is_ok());
    }
}

impl Pool for LinearPool {
    fn from_block(block: Block) -> LinearPool {
        LinearPool {
            pool: vec![block],
        }
    }

    fn take(&mut self, size: Size) -> Option<Block> {
        // First fit.
        let ind = self.pool.iter().position(|x| x.size() >= size)?;

        Some(self.take_ind(ind, size))
    }

    fn take_at(&mut self, start: Address, size: Size) -> Option<Block> {
        let ind = self.find(start)?;

        if self.pool[ind].size() >= size {
            Some(self.take_ind(ind, size))
        } else { None }
    }

    fn insert(&mut self, block: Block) -> Merge {
        self.pool.push(block);
        self.pool.sort_unstable();
        self.coalesce();

        // The block now lies inside the last pool block starting at or before it.
        let ind = self.pool.partition_point(|x| x.start() <= block.start()) - 1;
        merge_of(&block, &self.pool[ind])
    }

    fn blocks(&self) -> Vec<Block> {
        self.pool.clone()
    }

    fn len(&self) -> usize {
        self.pool.len()
    }
}
