//! Address-space blocks.
//!
//! Blocks are the main unit for the arena bookkeeping. A block is a simple construct with a start
//! address and a size. Empty blocks (zero-sized) are used as placeholders when a block has been
//! merged into another.

use core::{cmp, fmt, mem};

/// An address inside the arena.
///
/// Addresses are byte offsets from the start of the arena, so the first byte is `0`.
pub type Address = usize;

/// A size in bytes.
pub type Size = usize;

/// A contiguous range of the arena, `[start, start + size)`.
///
/// This provides a number of guarantees,
///
/// 1. The end of the block never overflows `usize`.
/// 2. No byte in the block is contained in another live block of the same arena (aliased in this
///    case is defined purely based on liveliness).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    /// The start of this block.
    start: Address,
    /// The size of this block, in bytes.
    size: Size,
}

impl Block {
    /// Construct a block from its start and size.
    ///
    /// # Panics
    ///
    /// Panics if the end of the block would overflow the address space.
    #[inline]
    pub fn new(start: Address, size: Size) -> Block {
        assert!(start.checked_add(size).is_some(), "Block [{}, +{}) overflows.", start, size);

        Block {
            start: start,
            size: size,
        }
    }

    /// Create an empty block starting at `start`.
    #[inline]
    pub fn empty(start: Address) -> Block {
        Block {
            start: start,
            size: 0,
        }
    }

    /// Get the start address of the block.
    #[inline]
    pub fn start(&self) -> Address {
        self.start
    }

    /// Get the size of the block.
    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Get the end (exclusive) of the block.
    #[inline]
    pub fn end(&self) -> Address {
        // Bounded by construction.
        self.start + self.size
    }

    /// Is this block empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Do the two blocks share any byte?
    #[inline]
    pub fn overlaps(&self, other: &Block) -> bool {
        !self.is_empty() && !other.is_empty()
            && self.start < other.end() && other.start < self.end()
    }

    /// Is this block placed left to the given other block?
    #[inline]
    pub fn left_to(&self, to: &Block) -> bool {
        self.end() == to.start
    }

    /// Merge this block with a block to the right.
    ///
    /// This will simply extend the block, adding the size of the block, and then set the size to
    /// zero. The return value is `Ok(())` on success, and `Err(())` on failure (e.g., the blocks
    /// are not adjacent).
    ///
    /// If you merge with a zero sized block, it will succeed, even if they are not adjacent.
    #[inline]
    pub fn merge_right(&mut self, block: &mut Block) -> Result<(), ()> {
        if block.is_empty() {
            Ok(())
        } else if self.left_to(block) {
            // We pop it to make sure it isn't aliased.
            self.size += block.pop().size;

            Ok(())
        } else { Err(()) }
    }

    /// "Pop" this block.
    ///
    /// This leaves an empty block in its place, and returns the old value.
    #[inline]
    pub fn pop(&mut self) -> Block {
        let empty = Block::empty(self.start);
        mem::replace(self, empty)
    }

    /// Split the block at some position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bound.
    #[inline]
    pub fn split(self, pos: Size) -> (Block, Block) {
        assert!(pos <= self.size, "Split {} out of bound (size is {})!", pos, self.size);

        (
            Block {
                start: self.start,
                size: pos,
            },
            Block {
                start: self.start + pos,
                size: self.size - pos,
            },
        )
    }

    /// Is this block aligned to `align`?
    #[inline]
    pub fn aligned_to(&self, align: Size) -> bool {
        self.start % align == 0
    }

    /// Split this block, such that the second block is aligned to `align`.
    ///
    /// The first block is the padding (possibly empty). Returns `None`, leaving the block intact,
    /// if the aligned address lies beyond the end of the block.
    #[inline]
    pub fn align(&mut self, align: Size) -> Option<(Block, Block)> {
        debug_assert!(align != 0, "Aligning to zero.");

        let aligner = (align - self.start % align) % align;

        // Bound check.
        if aligner <= self.size {
            Some(self.pop().split(aligner))
        } else { None }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}[0x{:x}]", self.start, self.size)
    }
}

/// Print the block as `[start,size]`.
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.size)
    }
}

/// Order blocks by size first, then by address.
///
/// This is the key of the best-fit index: the smallest fitting block, and among equally sized
/// blocks the lowest one, comes first.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BySize(pub Block);

impl PartialOrd for BySize {
    #[inline]
    fn partial_cmp(&self, other: &BySize) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BySize {
    #[inline]
    fn cmp(&self, other: &BySize) -> cmp::Ordering {
        (self.0.size, self.0.start).cmp(&(other.0.size, other.0.start))
    }
}
