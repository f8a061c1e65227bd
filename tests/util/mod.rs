//! Test automation.

use rarena::{strategy, Arena, Block, Size, Strategy};

/// Run a closure against a fresh arena of every strategy.
///
/// The arena is checked for consistency after the closure is completed.
#[allow(dead_code)]
pub fn each_strategy<F: FnMut(Strategy, &mut dyn Arena)>(capacity: Size, mut func: F) {
    for &s in &Strategy::ALL {
        let mut arena = strategy::build(s, capacity).unwrap();
        acid(&mut *arena, |arena| func(s, arena));
    }
}

/// Wrap a block in acid tests.
///
/// This runs the closure and then asserts the arena invariants:
///
/// 1. The free and allocated blocks partition `[0, capacity)` with no gaps and no overlaps.
/// 2. No two free blocks are adjacent.
/// 3. The counters agree with the blocks.
#[allow(dead_code)]
pub fn acid<A: Arena + ?Sized, F: FnOnce(&mut A)>(arena: &mut A, func: F) {
    func(arena);

    let snapshot = arena.snapshot();
    if let Err(violation) = snapshot.check() {
        panic!("Inconsistent arena: {}\n{}", violation, snapshot);
    }

    let free: Size = snapshot.free.iter().map(Block::size).sum();
    assert_eq!(arena.free_memory(), free);
    assert_eq!(arena.allocated_memory(), arena.capacity() - free);
    assert_eq!(arena.largest_free_block(), snapshot.free.iter().map(Block::size).max()
               .unwrap_or(0));
}

/// A pseudorandom number generator.
///
/// This is `xorshift+`, seeded explicitly so every run replays the same call sequence.
#[allow(dead_code)]
pub struct Rand {
    /// The state.
    state: [u64; 2],
}

#[allow(dead_code)]
impl Rand {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Rand {
        Rand {
            state: [0xBADF00D1 ^ seed, 0xDEADBEEF ^ seed.rotate_left(32)],
        }
    }

    /// Get a pseudorandom integer.
    pub fn get(&mut self) -> u64 {
        // Store the first and second part.
        let mut x = self.state[0];
        let y = self.state[1];

        // Put the second part into the first slot.
        self.state[0] = y;
        // Twist the first slot.
        x ^= x << 23;
        // Update the second slot.
        self.state[1] = x ^ y ^ (x >> 17) ^ (y >> 26);

        // Generate the final integer.
        self.state[1].wrapping_add(y)
    }

    /// Get a pseudorandom integer in `[0, n)`.
    pub fn below(&mut self, n: usize) -> usize {
        (self.get() % n as u64) as usize
    }

    /// Flip a coin.
    pub fn coin(&mut self) -> bool {
        self.get() & 1 == 1
    }
}

/// A call to replay against an arena.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum Op {
    /// Allocate this many bytes.
    Allocate(Size),
    /// Free the n'th (modulo the count) live allocation.
    Free(usize),
}

/// Generate a random call sequence.
#[allow(dead_code)]
pub fn ops(rand: &mut Rand, len: usize, max_size: Size) -> Vec<Op> {
    (0..len).map(|_| {
        if rand.below(5) < 3 {
            Op::Allocate(1 + rand.below(max_size))
        } else {
            Op::Free(rand.below(usize::MAX))
        }
    }).collect()
}

/// Replay a call sequence, returning the outcome of every allocation.
///
/// Frees always target live allocations, so they are expected to succeed.
#[allow(dead_code)]
pub fn replay(arena: &mut dyn Arena, ops: &[Op]) -> Vec<rarena::Result<usize>> {
    let mut live: Vec<(usize, Size)> = Vec::new();
    let mut res = Vec::new();

    for op in ops {
        match *op {
            Op::Allocate(size) => {
                let out = arena.allocate(size);
                if let Ok(address) = out {
                    live.push((address, size));
                }
                res.push(out);
            },
            Op::Free(n) if !live.is_empty() => {
                let (address, size) = live.swap_remove(n % live.len());
                arena.free(address, size).unwrap();
            },
            Op::Free(_) => {},
        }
    }

    res
}
