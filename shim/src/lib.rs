//! Platform glue that `rarena` depends on.
//!
//! This crate provides the log sink and the compile-time configuration. On unix the log is
//! written straight to a file descriptor through `libc`, elsewhere it goes through `std::io`.

#![warn(missing_docs)]

pub mod config;
pub mod log;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::sink;

#[cfg(not(unix))]
mod fallback;

#[cfg(not(unix))]
pub use fallback::sink;
