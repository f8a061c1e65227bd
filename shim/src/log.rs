//! Allocator logging.

use core::{cmp, fmt, mem};
use core::fmt::Write;

use crate::config;

/// Write to the log.
///
/// This points to the sink defined for the platform (stderr by default). The line is
/// formatted into a fixed buffer, so writing never allocates.
pub fn write(lv: u8, kind: &str, args: fmt::Arguments, file: &str, line: u32) -> Result<(), ()> {
    if lv < config::MIN_LOG_LEVEL {
        return Ok(());
    }

    // The buffer. We add three extra slots reserved for overflows, and one for the newline. If
    // the buffer is filled, the dots tell the reader that there is more in this message. We
    // start out with all dots, so we don't have to set these up later on.
    let mut buffer = [b'.'; config::LOG_BUFFER_SIZE + 4];

    // The bytes of the buffer that are filled.
    let mut filled = format(&mut buffer[..config::LOG_BUFFER_SIZE], kind, args, file, line);

    // Keep the dots if the buffer was full.
    if filled == config::LOG_BUFFER_SIZE {
        filled += 3;
    }
    buffer[filled] = b'\n';
    filled += 1;

    crate::sink(&buffer[..filled]).map(|_| ())
}

/// Format a log line into `buffer`, returning the number of bytes filled.
fn format(buffer: &mut [u8], kind: &str, args: fmt::Arguments, file: &str, line: u32) -> usize {
    let len = buffer.len();
    let mut writer = BufWriter {
        buffer: buffer,
    };
    // `BufWriter` never fails, it truncates.
    let _ = write!(writer, "{:10}{} (@ {}:{})", kind, args, file, line);

    len - writer.buffer.len()
}

/// A logging buffer.
///
/// This simply keeps track of the buffer by maintaining a slice representing the remaining part of
/// the buffer.
struct BufWriter<'a> {
    /// A view into the remaining part of the buffer.
    buffer: &'a mut [u8],
}

impl<'a> fmt::Write for BufWriter<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Find the appropriate length of the copied subbuffer.
        let amt = cmp::min(s.len(), self.buffer.len());
        // Split the buffer.
        let (head, tail) = mem::take(&mut self.buffer).split_at_mut(amt);
        // Memcpy the content of the string.
        head.copy_from_slice(&s.as_bytes()[..amt]);
        self.buffer = tail;

        Ok(())
    }
}
