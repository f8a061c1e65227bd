//! Runtime strategy selection.

use core::fmt;
use core::str::FromStr;

use crate::arena::Arena;
use crate::block::Size;
use crate::bookkeeper::Bookkeeper;
use crate::fail::{Error, Result};
use crate::pool::{IndexedPool, LinearPool, LinkedPool};

/// A free-block management strategy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Strategy {
    /// First fit over a sorted vector, re-sorted and coalesced on every free.
    Linear,
    /// First fit over a doubly linked list, merged in place on free.
    Linked,
    /// Best fit over size- and address-ordered indices.
    Indexed,
}

impl Strategy {
    /// Every strategy.
    pub const ALL: [Strategy; 3] = [Strategy::Linear, Strategy::Linked, Strategy::Indexed];

    /// The name of the strategy, as accepted by `FromStr`.
    pub fn name(&self) -> &'static str {
        match *self {
            Strategy::Linear => "linear",
            Strategy::Linked => "linked",
            Strategy::Indexed => "indexed",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Strategy> {
        Strategy::ALL.iter().cloned()
            .find(|x| x.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownStrategy(s.to_owned()))
    }
}

/// Build an arena of `capacity` bytes managed by `strategy`.
pub fn build(strategy: Strategy, capacity: Size) -> Result<Box<dyn Arena + Send + Sync>> {
    Ok(match strategy {
        Strategy::Linear => Box::new(Bookkeeper::<LinearPool>::new(capacity)?),
        Strategy::Linked => Box::new(Bookkeeper::<LinkedPool>::new(capacity)?),
        Strategy::Indexed => Box::new(Bookkeeper::<IndexedPool>::new(capacity)?),
    })
}
