extern crate rarena;

mod util;

use rarena::{Arena, Block, Error, IndexedArena, LinearArena, LinkedArena, Realloc, Relocation};

fn realloc<A: Realloc>(mut arena: A) {
    util::acid(&mut arena, |arena| {
        let a = arena.allocate(10).unwrap();
        let b = arena.allocate(10).unwrap();

        // Grow into the free tail.
        assert_eq!(arena.realloc(b, 10, 50), Ok(Relocation::InPlace(b)));
        // Shrink, freeing the tail.
        assert_eq!(arena.realloc(b, 50, 20), Ok(Relocation::InPlace(b)));
        assert_eq!(arena.free_blocks(), vec![Block::new(30, 70)]);

        // Boxed in, so it moves.
        let moved = arena.realloc(a, 10, 15).unwrap();
        assert_eq!(moved, Relocation::Moved {
            from: a,
            to: 30,
            len: 10,
        });
        assert_eq!(arena.free_blocks(), vec![Block::new(0, 10), Block::new(45, 55)]);

        arena.free(moved.address(), 15).unwrap();
        arena.free(b, 20).unwrap();
    });

    assert_eq!(arena.free_blocks(), vec![Block::new(0, 100)]);
}

#[test]
fn realloc_every_strategy() {
    realloc(LinearArena::new(100).unwrap());
    realloc(LinkedArena::new(100).unwrap());
    realloc(IndexedArena::new(100).unwrap());
}

#[test]
fn realloc_inplace_refused() {
    let mut arena = LinkedArena::new(30).unwrap();
    let a = arena.allocate(10).unwrap();
    arena.allocate(10).unwrap();
    let before = arena.snapshot();

    assert_eq!(arena.realloc_inplace(a, 10, 11), Err(Error::OutOfMemory {
        requested: 11,
        largest: 10,
    }));
    assert_eq!(arena.realloc(a, 10, 11), Err(Error::OutOfMemory {
        requested: 11,
        largest: 10,
    }));
    assert_eq!(arena.snapshot(), before);
}

#[test]
fn realloc_random() {
    let mut rand = util::Rand::new(11);
    let mut arena = IndexedArena::new(4096).unwrap();
    let mut live: Vec<(usize, usize)> = Vec::new();

    for _ in 0..500 {
        if live.is_empty() || rand.coin() {
            let size = 1 + rand.below(64);
            if let Ok(address) = arena.allocate(size) {
                live.push((address, size));
            }
        } else {
            let n = rand.below(live.len());
            let (address, size) = live[n];
            let new_size = 1 + rand.below(128);

            if let Ok(res) = arena.realloc(address, size, new_size) {
                live[n] = (res.address(), new_size);
            }
        }

        assert_eq!(arena.snapshot().check(), Ok(()));
    }

    let mut blocks: Vec<Block> = live.iter().map(|&(a, s)| Block::new(a, s)).collect();
    blocks.sort();
    assert_eq!(arena.allocated_blocks(), blocks);
}
