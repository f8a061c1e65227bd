//! Sink for platforms without `libc`.

use std::io::{self, Write};

/// Write raw bytes to the logging target (standard error).
///
/// Returns the number of bytes written, or `Err(())` if the write failed.
pub fn sink(bytes: &[u8]) -> Result<usize, ()> {
    io::stderr().write_all(bytes).map(|_| bytes.len()).map_err(|_| ())
}
