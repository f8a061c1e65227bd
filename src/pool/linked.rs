//! The linked free list.
//!
//! Nodes live in a table and link to each other by index, so the list has no owning cycles. The
//! slots of removed nodes are recycled.

use crate::block::{Address, Block, Size};

use super::{Merge, Pool};

/// A node index.
type Link = Option<usize>;

/// A block list node.
#[derive(Clone, Debug)]
struct Node {
    /// The inner block.
    ///
    /// This should never be empty (zero-sized) while the node is linked.
    block: Block,
    /// The node that precedes this node.
    prev: Link,
    /// The node that follows this node.
    ///
    /// This cannot be adjacent (tangent) to `self.block`. It is important to maintain the blocks
    /// as long as possible, and hence merge if that is the case.
    next: Link,
}

/// A first-fit pool backed by a doubly linked list sorted by address.
///
/// Allocation walks the list and shrinks the fitting node in place. Freeing walks to the
/// insertion point and merges with the predecessor and successor without any rescan. The walk
/// starts at the last touched node when that node lies before the target.
#[derive(Clone, Debug)]
pub struct LinkedPool {
    /// The node table.
    nodes: Vec<Node>,
    /// Slots of `nodes` which are not linked.
    vacant: Vec<usize>,
    /// The first node of the list.
    head: Link,
    /// The last touched node.
    cursor: Link,
    /// The number of linked nodes.
    len: usize,
}

impl LinkedPool {
    /// Create an unlinked node holding `block`.
    fn alloc_node(&mut self, block: Block) -> usize {
        let node = Node {
            block: block,
            prev: None,
            next: None,
        };

        if let Some(ind) = self.vacant.pop() {
            self.nodes[ind] = node;
            ind
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Link node `ind` after `prev` (at the head if `prev` is `None`).
    fn link_after(&mut self, prev: Link, ind: usize) {
        let next = match prev {
            Some(prev) => self.nodes[prev].next.replace(ind),
            None => self.head.replace(ind),
        };

        if let Some(next) = next {
            self.nodes[next].prev = Some(ind);
        }

        let node = &mut self.nodes[ind];
        node.prev = prev;
        node.next = next;

        self.len += 1;
    }

    /// Unlink node `ind` and recycle its slot.
    fn unlink(&mut self, ind: usize) {
        let Node { prev, next, .. } = self.nodes[ind];

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        if let Some(next) = next {
            self.nodes[next].prev = prev;
        }

        // Keep the cursor on a linked node.
        if self.cursor == Some(ind) {
            self.cursor = prev;
        }

        self.nodes[ind].block = Block::empty(self.nodes[ind].block.start());
        self.vacant.push(ind);
        self.len -= 1;
    }

    /// Take `size` bytes from the front of node `ind`.
    ///
    /// The node is shrunk in place, or unlinked if it is used entirely.
    fn take_node(&mut self, ind: usize, size: Size) -> Block {
        let (res, excessive) = self.nodes[ind].block.split(size);

        if excessive.is_empty() {
            self.unlink(ind);
        } else {
            self.nodes[ind].block = excessive;
            self.cursor = Some(ind);
        }

        res
    }

    /// Find the neighbours of `start`.
    ///
    /// Returns the last node starting before `start`, and the node following it.
    fn seek(&self, start: Address) -> (Link, Link) {
        // Start from the cursor if it lies before the target, otherwise from the head.
        let (mut prev, mut cur) = match self.cursor {
            Some(c) if self.nodes[c].block.start() < start => (Some(c), self.nodes[c].next),
            _ => (None, self.head),
        };

        while let Some(ind) = cur {
            if self.nodes[ind].block.start() >= start {
                break;
            }

            prev = cur;
            cur = self.nodes[ind].next;
        }

        (prev, cur)
    }

    /// Iterate over the linked nodes' blocks, in address order.
    fn iter(&self) -> Iter {
        Iter {
            nodes: &self.nodes,
            cur: self.head,
        }
    }
}

impl Pool for LinkedPool {
    fn from_block(block: Block) -> LinkedPool {
        let mut pool = LinkedPool {
            nodes: Vec::new(),
            vacant: Vec::new(),
            head: None,
            cursor: None,
            len: 0,
        };

        let ind = pool.alloc_node(block);
        pool.link_after(None, ind);

        pool
    }

    fn take(&mut self, size: Size) -> Option<Block> {
        // First fit, walking from the head.
        let mut cur = self.head;
        while let Some(ind) = cur {
            if self.nodes[ind].block.size() >= size {
                return Some(self.take_node(ind, size));
            }

            cur = self.nodes[ind].next;
        }

        None
    }

    fn take_at(&mut self, start: Address, size: Size) -> Option<Block> {
        let (_, cur) = self.seek(start);
        let ind = cur?;
        let block = self.nodes[ind].block;

        if block.start() == start && block.size() >= size {
            Some(self.take_node(ind, size))
        } else { None }
    }

    fn insert(&mut self, mut block: Block) -> Merge {
        let (prev, next) = self.seek(block.start());

        let merge = Merge {
            left: prev.map_or(false, |x| self.nodes[x].block.left_to(&block)),
            right: next.map_or(false, |x| block.left_to(&self.nodes[x].block)),
        };

        match (prev, next) {
            (Some(prev), Some(next)) if merge.left && merge.right => {
                // The predecessor absorbs both the new block and the successor.
                let mut right = self.nodes[next].block;
                let res = block.merge_right(&mut right)
                    .and_then(|_| self.nodes[prev].block.merge_right(&mut block));
                debug_assert!(res.is_ok(), "Neighbours of {:?} are not adjacent.", block);

                self.unlink(next);
                self.cursor = Some(prev);
            },
            (Some(prev), _) if merge.left => {
                let res = self.nodes[prev].block.merge_right(&mut block);
                debug_assert!(res.is_ok(), "Predecessor is not adjacent.");

                self.cursor = Some(prev);
            },
            (_, Some(next)) if merge.right => {
                // Extend the successor leftwards.
                let res = block.merge_right(&mut self.nodes[next].block);
                debug_assert!(res.is_ok(), "Successor is not adjacent.");

                self.nodes[next].block = block;
                self.cursor = Some(next);
            },
            _ => {
                let ind = self.alloc_node(block);
                self.link_after(prev, ind);
                self.cursor = Some(ind);
            },
        }

        merge
    }

    fn blocks(&self) -> Vec<Block> {
        self.iter().collect()
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// An iterator over the blocks of a linked pool.
struct Iter<'a> {
    /// The node table.
    nodes: &'a [Node],
    /// The next node of this iterator.
    ///
    /// If there is another element, it will be returned on next iteration. If not, this field is
    /// `None` and the iterator is over.
    cur: Link,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let node = &self.nodes[self.cur?];
        self.cur = node.next;

        Some(node.block)
    }
}
