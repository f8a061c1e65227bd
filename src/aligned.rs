//! Aligned allocation.

use std::collections::BTreeMap;

use crate::arena::Arena;
use crate::block::{Address, Block, Size};
use crate::fail::{self, Error, Result};
use crate::realloc::Realloc;

/// A reservation made on behalf of an aligned allocation.
#[derive(Clone, Copy, Debug)]
struct Reservation {
    /// The block reserved from the inner arena.
    ///
    /// This ends with the aligned allocation, preceded by the padding (possibly empty).
    raw: Block,
    /// The size the caller asked for.
    size: Size,
}

/// An arena decorator aligning every allocation.
///
/// An allocation is first placed wherever the inner arena puts it. If it is misaligned, it is
/// grown inplace until its tail is aligned, or else moved to a block of `size + align - 1` bytes,
/// of which only the padding and the allocation are kept. The padding is released together with
/// the allocation.
#[derive(Debug)]
pub struct Aligned<A> {
    /// The inner arena.
    inner: A,
    /// The alignment, a power of two.
    align: Size,
    /// Aligned start address to reservation.
    records: BTreeMap<Address, Reservation>,
}

impl<A: Realloc> Aligned<A> {
    /// Wrap an arena, aligning its allocations to `align`.
    ///
    /// Fails with `Misaligned` if `align` is not a power of two (zero included).
    pub fn new(inner: A, align: Size) -> Result<Aligned<A>> {
        if !align.is_power_of_two() {
            return Err(Error::Misaligned {
                align: align,
            });
        }

        Ok(Aligned {
            inner: inner,
            align: align,
            records: BTreeMap::new(),
        })
    }

    /// The alignment of the allocations.
    #[inline]
    pub fn align(&self) -> Size {
        self.align
    }

    /// The inner arena.
    #[inline]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Reserve a block ending with an aligned run of `size` bytes.
    ///
    /// A block of `size + align - 1` bytes always contains such a run. The slack behind it is
    /// given back to the inner arena right away.
    fn reserve(&mut self, size: Size) -> Result<Block> {
        let padded = match size.checked_add(self.align - 1) {
            Some(padded) => padded,
            None => return Err(Error::OutOfMemory {
                requested: size,
                largest: self.inner.largest_free_block(),
            }),
        };
        let start = self.inner.try_allocate(padded)?;

        // The padding never exceeds `align - 1`, so the split always succeeds.
        let pad = Block::new(start, padded).align(self.align).map_or(0, |(pad, _)| pad.size());
        let used = pad + size;

        if used < padded {
            if let Err(err) = self.inner.realloc_inplace(start, padded, used) {
                // Roll back.
                let _ = self.inner.free(start, padded);
                return Err(err);
            }
        }

        Ok(Block::new(start, used))
    }
}

impl<A: Realloc> Arena for Aligned<A> {
    #[inline]
    fn capacity(&self) -> Size {
        self.inner.capacity()
    }

    fn try_allocate(&mut self, size: Size) -> Result<Address> {
        if size == 0 {
            return Err(Error::InvalidArgument("size must be positive"));
        }

        let start = self.inner.try_allocate(size)?;
        let mut raw = Block::new(start, size);

        if !raw.aligned_to(self.align) {
            // Distance to the next aligned address.
            let pad = self.align - start % self.align;

            raw = match pad.checked_add(size) {
                Some(grown) if self.inner.realloc_inplace(start, size, grown).is_ok() => {
                    Block::new(start, grown)
                },
                _ => {
                    self.inner.free(start, size)?;
                    self.reserve(size)?
                },
            };
        }

        let address = raw.end() - size;
        debug_assert!(address % self.align == 0, "Alignment failed.");

        self.records.insert(address, Reservation {
            raw: raw,
            size: size,
        });
        log!(DEBUG, self;raw.start()..raw.end(), "Aligned {:?} to {} for {} bytes.", raw,
             self.align, size);

        Ok(address)
    }

    fn free(&mut self, address: Address, size: Size) -> Result<()> {
        fail::check_range(address, size, self.capacity())?;

        let reservation = match self.records.get(&address) {
            None => return Err(Error::InvalidFree {
                address: address,
            }),
            Some(reservation) if reservation.size != size => return Err(Error::SizeMismatch {
                address: address,
                recorded: reservation.size,
                given: size,
            }),
            Some(&reservation) => reservation,
        };

        self.inner.free(reservation.raw.start(), reservation.raw.size())?;
        self.records.remove(&address);

        Ok(())
    }

    #[inline]
    fn free_memory(&self) -> Size {
        self.inner.free_memory()
    }

    #[inline]
    fn largest_free_block(&self) -> Size {
        self.inner.largest_free_block()
    }

    fn free_blocks(&self) -> Vec<Block> {
        self.inner.free_blocks()
    }

    /// The reserved blocks, padding included.
    fn allocated_blocks(&self) -> Vec<Block> {
        self.records.values().map(|x| x.raw).collect()
    }

    #[inline]
    fn allocated_memory(&self) -> Size {
        self.inner.allocated_memory()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::bookkeeper::Bookkeeper;
    use crate::pool::LinearPool;

    fn arena(align: Size) -> Aligned<Bookkeeper<LinearPool>> {
        Aligned::new(Bookkeeper::new(100).unwrap(), align).unwrap()
    }

    #[test]
    fn test_alignment() {
        let mut arena = arena(8);

        assert_eq!(arena.allocate(3), Ok(0));
        // Placed at 3, then grown inplace to [3, 13).
        assert_eq!(arena.allocate(5), Ok(8));
        assert_eq!(arena.allocated_blocks(), vec![Block::new(0, 3), Block::new(3, 10)]);
        assert_eq!(arena.free_memory(), 87);
        assert_eq!(arena.snapshot().check(), Ok(()));

        arena.free(8, 5).unwrap();
        arena.free(0, 3).unwrap();
        assert_eq!(arena.free_blocks(), vec![Block::new(0, 100)]);
    }

    #[test]
    fn test_exact_fit() {
        let mut arena = Aligned::new(Bookkeeper::<LinearPool>::new(16).unwrap(), 8).unwrap();

        assert_eq!(arena.allocate(8), Ok(0));
        assert_eq!(arena.allocate(8), Ok(8));
        assert_eq!(arena.free_memory(), 0);

        let mut arena = Aligned::new(Bookkeeper::<LinearPool>::new(16).unwrap(), 8).unwrap();

        assert_eq!(arena.allocate(1), Ok(0));
        assert_eq!(arena.allocate(8), Ok(8));
        assert_eq!(arena.allocated_blocks(), vec![Block::new(0, 1), Block::new(1, 15)]);
    }

    #[test]
    fn test_slack_released() {
        let mut arena = Aligned::new(Bookkeeper::<LinearPool>::new(32).unwrap(), 8).unwrap();

        assert_eq!(arena.allocate(3), Ok(0));
        assert_eq!(arena.allocate(4), Ok(8));
        assert_eq!(arena.allocated_blocks(), vec![Block::new(0, 3), Block::new(3, 9)]);
        assert_eq!(arena.free_blocks(), vec![Block::new(12, 20)]);
    }

    #[test]
    fn test_moved() {
        let mut arena = Aligned::new(Bookkeeper::<LinearPool>::new(64).unwrap(), 16).unwrap();

        assert_eq!(arena.allocate(4), Ok(0));
        assert_eq!(arena.allocate(4), Ok(16));
        assert_eq!(arena.allocate(4), Ok(32));
        arena.free(16, 4).unwrap();
        assert_eq!(arena.free_blocks(), vec![Block::new(4, 16), Block::new(36, 28)]);

        // The hole [4, 20) fits 8 bytes, but not once they are aligned.
        assert_eq!(arena.allocate(8), Ok(48));
        assert_eq!(arena.allocated_blocks(), vec![Block::new(0, 4), Block::new(20, 16),
                                                  Block::new(36, 20)]);
        assert_eq!(arena.free_blocks(), vec![Block::new(4, 16), Block::new(56, 8)]);
        assert_eq!(arena.snapshot().check(), Ok(()));
    }

    #[test]
    fn test_bad_align() {
        let inner = Bookkeeper::<LinearPool>::new(100).unwrap();
        assert_eq!(Aligned::new(inner.clone(), 0).unwrap_err(), Error::Misaligned { align: 0 });
        assert_eq!(Aligned::new(inner, 12).unwrap_err(), Error::Misaligned { align: 12 });
    }

    #[test]
    fn test_free_checks() {
        let mut arena = arena(16);
        let a = arena.allocate(4).unwrap();
        let b = arena.allocate(4).unwrap();
        assert_eq!(b, 16);

        // The start of the reservation is not the allocation.
        assert_eq!(arena.free(4, 4), Err(Error::InvalidFree { address: 4 }));
        assert_eq!(arena.free(b, 19), Err(Error::SizeMismatch {
            address: 16,
            recorded: 4,
            given: 19,
        }));
        assert!(matches!(arena.free(a, 101), Err(Error::OutOfBounds { .. })));

        arena.free(b, 4).unwrap();
        assert_eq!(arena.free(b, 4), Err(Error::InvalidFree { address: 16 }));
    }

    #[test]
    fn test_unit_align() {
        let mut arena = arena(1);

        assert_eq!(arena.allocate(7), Ok(0));
        assert_eq!(arena.allocate(7), Ok(7));
        assert_eq!(arena.allocated_memory(), 14);
    }
}
