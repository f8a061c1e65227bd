//! Arena logging.
//!
//! This allows for detailed logging for `rarena`. Logging is compiled in with the `log` feature;
//! without it, the log statements are dead code and their arguments are never evaluated.

/// Log to the appropriate source.
///
/// The first argument is the level (`DEBUG`, `NOTE` or `WARNING`). It may be followed by an
/// argument of the form `arena;mark`, which prints the arena's layout with `mark` drawn into it.
/// The mark is an address, an address range, or `()` for none.
///
/// The rest of the arguments are just normal formatters.
macro_rules! log {
    ($lv:ident, $bk:expr;$mark:expr, $( $arg:tt )*) => {
        if cfg!(feature = "log") {
            // Print the arena layout.
            let layout = $crate::arena::Arena::snapshot(&*$bk).layout();
            $crate::sys::log($crate::log::level::$lv, stringify!($lv), format_args!(
                "{} : {}",
                $crate::log::internal::Picture::new($mark.clone(), &layout),
                format_args!($( $arg )*)
            ), file!(), line!());
        }
    };
    ($lv:ident, $( $arg:tt )*) => {
        if cfg!(feature = "log") {
            $crate::sys::log($crate::log::level::$lv, stringify!($lv), format_args!($( $arg )*),
                             file!(), line!());
        }
    };
}

/// Log levels.
///
/// Messages below `rarena_shim::config::MIN_LOG_LEVEL` are dropped.
pub mod level {
    /// Internal state changes.
    pub const DEBUG: u8 = 0;
    /// Completed operations.
    pub const NOTE: u8 = 1;
    /// Failed operations.
    pub const WARNING: u8 = 2;
}

/// Layout pictures.
pub mod internal {
    use core::fmt;
    use core::ops::Range;

    use crate::arena::Segment;
    use crate::block::Address;

    /// A position drawn into a layout picture.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Mark {
        /// Nothing is marked.
        Nothing,
        /// `|` in front of the segment starting at the address.
        ///
        /// If no segment starts there, `…|` is appended to the picture instead.
        Address(Address),
        /// `[` in front of the segment starting at the range start, `]` in front of the segment
        /// starting at the range end (or at the very end, if the range ends the arena).
        Range(Range<Address>),
    }

    impl From<()> for Mark {
        fn from(_: ()) -> Mark {
            Mark::Nothing
        }
    }

    impl From<Address> for Mark {
        fn from(address: Address) -> Mark {
            Mark::Address(address)
        }
    }

    impl From<Range<Address>> for Mark {
        fn from(range: Range<Address>) -> Mark {
            Mark::Range(range)
        }
    }

    /// A picture of an arena layout.
    ///
    /// Every segment is a single glyph, `x` for allocated and `_` for free, regardless of its size:
    ///
    /// ```text
    /// xx_|x_
    /// ```
    pub struct Picture<'a> {
        /// The mark.
        mark: Mark,
        /// The segments, in address order.
        layout: &'a [Segment],
    }

    impl<'a> Picture<'a> {
        /// Draw `layout` with `mark`.
        pub fn new<M: Into<Mark>>(mark: M, layout: &'a [Segment]) -> Picture<'a> {
            Picture {
                mark: mark.into(),
                layout: layout,
            }
        }

        /// The glyph of the mark right before the segment starting at `start`, if any.
        fn glyph_at(&self, start: Address) -> Option<&'static str> {
            match self.mark {
                Mark::Address(address) if address == start => Some("|"),
                Mark::Range(ref range) if range.start == start => Some("["),
                Mark::Range(ref range) if range.end == start => Some("]"),
                _ => None,
            }
        }
    }

    impl<'a> fmt::Display for Picture<'a> {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            for segment in self.layout {
                if let Some(glyph) = self.glyph_at(segment.block().start()) {
                    f.write_str(glyph)?;
                }

                f.write_str(if segment.is_free() { "_" } else { "x" })?;
            }

            let end = self.layout.last().map_or(0, |segment| segment.block().end());
            match self.mark {
                Mark::Address(address)
                    if !self.layout.iter().any(|x| x.block().start() == address) => {
                    f.write_str("…|")
                },
                Mark::Range(ref range) if range.end == end => f.write_str("]"),
                _ => Ok(()),
            }
        }
    }

}
