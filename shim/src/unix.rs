//! Unix sink.

use crate::config;

/// Write raw bytes to the logging target.
///
/// Returns the number of bytes written, or `Err(())` if the write failed.
pub fn sink(bytes: &[u8]) -> Result<usize, ()> {
    let res = unsafe {
        libc::write(config::LOG_TARGET, bytes.as_ptr() as *const libc::c_void, bytes.len())
    };

    if res < 0 { Err(()) } else { Ok(res as usize) }
}
