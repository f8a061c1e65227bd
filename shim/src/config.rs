//! Configuration.
//!
//! This module contains anything which can be tweaked and customized to the users preferences.

/// The minimum log level.
///
/// Messages with a lower level are dropped before formatting.
pub const MIN_LOG_LEVEL: u8 = 0;

/// The file descriptor the log is written to (standard error).
pub const LOG_TARGET: i32 = 2;

/// The size of the log buffer.
///
/// Longer messages are truncated and marked with `...`.
pub const LOG_BUFFER_SIZE: usize = 256;
