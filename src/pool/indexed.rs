//! The size-indexed pool.

use std::collections::{BTreeMap, BTreeSet};

use crate::block::{Address, Block, BySize, Size};

use super::{merge_of, Merge, Pool};

/// A best-fit pool with logarithmic neighbour lookup.
///
/// The free blocks are kept in three synchronized indices:
///
/// 1. `by_size`, ordered by `(size, start)`, to find the smallest fitting block, lowest address
///    first.
/// 2. `by_start`, mapping the start of a block to its size, to find right neighbours.
/// 3. `by_end`, mapping the end of a block to its start, to find left neighbours.
///
/// No operation is proportional to the number of free blocks.
#[derive(Clone, Debug, Default)]
pub struct IndexedPool {
    /// The blocks ordered by size, then address.
    by_size: BTreeSet<BySize>,
    /// Block start to block size.
    by_start: BTreeMap<Address, Size>,
    /// Block end to block start.
    by_end: BTreeMap<Address, Address>,
    /// The total number of free bytes.
    free: Size,
}

impl IndexedPool {
    /// Add a block to all indices.
    fn add(&mut self, block: Block) {
        debug_assert!(!block.is_empty(), "Inserting an empty block.");

        self.by_size.insert(BySize(block));
        self.by_start.insert(block.start(), block.size());
        self.by_end.insert(block.end(), block.start());
        self.free += block.size();
    }

    /// Remove a block from all indices.
    fn remove(&mut self, block: Block) {
        let res = self.by_size.remove(&BySize(block));
        debug_assert!(res, "Removing untracked block {:?}.", block);

        self.by_start.remove(&block.start());
        self.by_end.remove(&block.end());
        self.free -= block.size();
    }

    /// Take `size` bytes from the front of `block`, putting the excessive space back.
    fn take_block(&mut self, block: Block, size: Size) -> Block {
        self.remove(block);

        let (res, excessive) = block.split(size);
        if !excessive.is_empty() {
            self.add(excessive);
        }

        res
    }
}

impl Pool for IndexedPool {
    fn from_block(block: Block) -> IndexedPool {
        let mut pool = IndexedPool::default();
        pool.add(block);

        pool
    }

    fn take(&mut self, size: Size) -> Option<Block> {
        // The smallest block of at least `size` bytes, lowest address first.
        let BySize(block) = *self.by_size.range(BySize(Block::new(0, size))..).next()?;

        Some(self.take_block(block, size))
    }

    fn take_at(&mut self, start: Address, size: Size) -> Option<Block> {
        let block = Block::new(start, *self.by_start.get(&start)?);

        if block.size() >= size {
            Some(self.take_block(block, size))
        } else { None }
    }

    fn insert(&mut self, block: Block) -> Merge {
        let left = self.by_end.get(&block.start()).map(|&start| {
            Block::new(start, block.start() - start)
        });
        let right = self.by_start.get(&block.end()).map(|&size| Block::new(block.end(), size));

        let mut merged = block;
        if let Some(mut left) = left {
            self.remove(left);

            let res = left.merge_right(&mut merged);
            debug_assert!(res.is_ok(), "Left neighbour {:?} is not adjacent.", left);
            merged = left;
        }
        if let Some(mut right) = right {
            self.remove(right);

            let res = merged.merge_right(&mut right);
            debug_assert!(res.is_ok(), "Right neighbour is not adjacent to {:?}.", merged);
        }

        self.add(merged);
        merge_of(&block, &merged)
    }

    fn blocks(&self) -> Vec<Block> {
        self.by_start.iter().map(|(&start, &size)| Block::new(start, size)).collect()
    }

    fn len(&self) -> usize {
        self.by_start.len()
    }

    fn free_memory(&self) -> Size {
        self.free
    }

    fn largest(&self) -> Size {
        self.by_size.last().map_or(0, |x| x.0.size())
    }

    fn check(&self) {
        if cfg!(debug_assertions) {
            assert_eq!(self.by_size.len(), self.by_start.len(), "Size index out of sync.");
            assert_eq!(self.by_end.len(), self.by_start.len(), "End index out of sync.");

            let mut free = 0;
            for (&start, &size) in &self.by_start {
                let block = Block::new(start, size);

                assert!(self.by_size.contains(&BySize(block)), "{:?} missing in the size index.",
                        block);
                assert_eq!(self.by_end.get(&block.end()), Some(&start), "{:?} missing in the end \
                           index.", block);
                free += size;
            }
            assert_eq!(free, self.free, "Free byte count out of sync.");

            // Sorted, non-empty, and no missed merges.
            let blocks = self.blocks();
            for pair in blocks.windows(2) {
                assert!(!pair[0].is_empty(), "Empty block {:?}.", pair[0]);
                assert!(pair[0].end() < pair[1].start(), "Adjacent or overlapping blocks {:?} and \
                        {:?}.", pair[0], pair[1]);
            }
        }
    }
}
