//! General error handling.

use parking_lot::RwLock;
use thiserror::Error;

use crate::block::{Address, Size};

/// The OOM handler.
static OOM_HANDLER: RwLock<fn(Size)> = parking_lot::const_rwlock(default_oom_handler as fn(Size));

/// The result of an arena operation.
pub type Result<T> = core::result::Result<T, Error>;

/// An arena error.
///
/// Every failed operation leaves the arena exactly as it was before the call.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A zero capacity, size or alignment was given.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// No free block is large enough for the request.
    #[error("cannot allocate {requested} bytes: insufficient contiguous memory (largest free block is {largest})")]
    OutOfMemory {
        /// The number of bytes requested.
        requested: Size,
        /// The largest free block at the time of the request.
        largest: Size,
    },
    /// Nothing is allocated at the address (stale, never allocated or already freed).
    #[error("invalid free: no allocation at {address}")]
    InvalidFree {
        /// The address passed to `free`.
        address: Address,
    },
    /// The size passed to `free` differs from the allocated size.
    #[error("invalid free: allocation at {address} has size {recorded}, not {given}")]
    SizeMismatch {
        /// The address passed to `free`.
        address: Address,
        /// The size recorded at allocation time.
        recorded: Size,
        /// The size passed to `free`.
        given: Size,
    },
    /// The range falls outside the arena.
    #[error("range [{address}, +{size}) exceeds the arena bounds [0, {capacity})")]
    OutOfBounds {
        /// The start of the range.
        address: Address,
        /// The size of the range.
        size: Size,
        /// The capacity of the arena.
        capacity: Size,
    },
    /// The alignment is not a power of two.
    #[error("alignment {align} is not a power of two")]
    Misaligned {
        /// The rejected alignment.
        align: Size,
    },
    /// The strategy name is not recognized.
    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),
}

/// Check that `[address, address + size)` is a non-empty range inside `[0, capacity)`.
///
/// The address is checked before the size, and the size before the end, so that the error
/// describes the first thing that is wrong with the request.
pub fn check_range(address: Address, size: Size, capacity: Size) -> Result<()> {
    let out_of_bounds = Error::OutOfBounds {
        address: address,
        size: size,
        capacity: capacity,
    };

    if address >= capacity {
        Err(out_of_bounds)
    } else if size == 0 {
        Err(Error::InvalidArgument("size must be positive"))
    } else if address.checked_add(size).map_or(true, |end| end > capacity) {
        Err(out_of_bounds)
    } else {
        Ok(())
    }
}

/// The default OOM handler.
///
/// This will simply log the failed request. Arena OOM is recoverable, so nothing is aborted.
#[cold]
fn default_oom_handler(size: Size) {
    log!(WARNING, "Out of memory (requested {} bytes).", size);
}

/// Call the OOM handler.
///
/// This is called every time an allocation fails with [`Error::OutOfMemory`], right before the
/// error is returned to the caller. See [`report`].
#[cold]
pub fn oom(size: Size) {
    let handler = *OOM_HANDLER.read();
    handler(size)
}

/// Call the OOM handler if `res` failed with [`Error::OutOfMemory`].
///
/// This must run after every lock on the arena has been released, as the handler is free to
/// inspect the arena.
#[inline]
pub fn report<T>(size: Size, res: Result<T>) -> Result<T> {
    if let Err(Error::OutOfMemory { .. }) = res {
        oom(size);
    }

    res
}

/// Set the OOM handler.
///
/// The handler is process-wide and purely observational: the allocation still fails.
#[inline]
pub fn set_oom_handler(handler: fn(Size)) {
    *OOM_HANDLER.write() = handler;
}
