extern crate rarena;

mod util;

use rarena::{strategy, Strategy};

/// Replay `ops` on a fresh arena of `strategy`.
fn run(s: Strategy, capacity: usize, ops: &[util::Op]) -> (Vec<rarena::Result<usize>>,
                                                          rarena::Snapshot) {
    let mut arena = strategy::build(s, capacity).unwrap();
    let mut res = Vec::new();

    util::acid(&mut *arena, |arena| res = util::replay(arena, ops));

    (res, arena.snapshot())
}

#[test]
fn first_fit_agree() {
    let mut rand = util::Rand::new(0);

    for _ in 0..40 {
        // Small arenas, so allocations fail regularly.
        let capacity = 64 + rand.below(512);
        let ops = util::ops(&mut rand, 300, 64);

        let linear = run(Strategy::Linear, capacity, &ops);
        let linked = run(Strategy::Linked, capacity, &ops);

        assert_eq!(linear, linked);
    }
}

#[test]
fn best_fit_agrees_on_totals() {
    let mut rand = util::Rand::new(1);

    for _ in 0..40 {
        // Large enough that no allocation ever fails.
        let ops = util::ops(&mut rand, 300, 64);
        let capacity = 300 * 64;

        let (linear, linear_snapshot) = run(Strategy::Linear, capacity, &ops);
        let (indexed, indexed_snapshot) = run(Strategy::Indexed, capacity, &ops);

        assert!(linear.iter().all(Result::is_ok));
        assert!(indexed.iter().all(Result::is_ok));

        let free = |s: &rarena::Snapshot| s.free.iter().map(|x| x.size()).sum::<usize>();
        assert_eq!(free(&linear_snapshot), free(&indexed_snapshot));
        assert_eq!(linear_snapshot.allocated.len(), indexed_snapshot.allocated.len());
    }
}

#[test]
fn agree_on_sequential_use() {
    // Without holes, first fit and best fit pick the same block.
    let mut rand = util::Rand::new(2);
    let sizes: Vec<usize> = (0..50).map(|_| 1 + rand.below(30)).collect();

    let results: Vec<Vec<usize>> = Strategy::ALL.iter().map(|&s| {
        let mut arena = strategy::build(s, 2000).unwrap();
        let addresses: Vec<usize> = sizes.iter().map(|&x| arena.allocate(x).unwrap()).collect();

        // Free in reverse, always merging into the tail.
        for (&address, &size) in addresses.iter().zip(&sizes).rev() {
            arena.free(address, size).unwrap();
            assert_eq!(arena.free_blocks().len(), 1);
        }

        addresses
    }).collect();

    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}
