//! System primitives.

extern crate rarena_shim as shim;

use core::fmt;

use parking_lot::Mutex;

/// The log lock.
///
/// This lock is used to avoid bungling and intertwining the log.
static LOG_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Write a line to the log.
///
/// The log target is defined by the `shim` crate.
pub fn log(lv: u8, kind: &str, args: fmt::Arguments, file: &str, line: u32) {
    let _guard = LOG_LOCK.lock();

    // A failing log sink is not worth failing the operation for.
    let _ = shim::log::write(lv, kind, args, file, line);
}
