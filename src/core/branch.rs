//! Out-of-order block buffering
//!
//! Gossip can deliver blocks before their parents. A `Branch` is a
//! contiguous run of such blocks; the `BranchTree` keeps disjoint branches,
//! folds them together as gaps close, and reports when a branch has grown
//! down to the point where it extends the canonical chain.

use crate::core::{Block, Blockchain};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Branch {
    blocks: HashMap<u64, Block>,
    top: u64,
    bottom: u64,
}

impl Branch {
    pub fn new(block: Block) -> Branch {
        let id = block.id;
        let mut blocks = HashMap::new();
        blocks.insert(id, block);

        Branch {
            blocks,
            top: id,
            bottom: id,
        }
    }

    pub fn top(&self) -> u64 {
        self.top
    }

    pub fn bottom(&self) -> u64 {
        self.bottom
    }

    pub fn bottom_block(&self) -> &Block {
        &self.blocks[&self.bottom]
    }

    /// Extend one end of the branch if `block` links there.
    pub fn add(&mut self, block: &Block) -> bool {
        if block.is_next_to(&self.blocks[&self.top]) {
            self.top = block.id;
            self.blocks.insert(block.id, block.clone());
            return true;
        }

        if self.blocks[&self.bottom].is_next_to(block) {
            self.bottom = block.id;
            self.blocks.insert(block.id, block.clone());
            return true;
        }

        false
    }

    fn absorb(&mut self, other: Branch) {
        if other.top > self.top {
            self.top = other.top;
        }
        if other.bottom < self.bottom {
            self.bottom = other.bottom;
        }
        self.blocks.extend(other.blocks);
    }

    /// The branch's blocks in id order, consuming the branch.
    pub fn into_blocks(mut self) -> Vec<Block> {
        (self.bottom..=self.top)
            .filter_map(|id| self.blocks.remove(&id))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct BranchTree {
    branches: Vec<Branch>,
}

impl BranchTree {
    pub fn new() -> BranchTree {
        BranchTree {
            branches: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Attach `block` to whichever branch accepts it, folding newly
    /// adjacent branches together; otherwise open a new singleton branch.
    pub fn add(&mut self, block: &Block) {
        for branch in &mut self.branches {
            if branch.add(block) {
                self.merge();
                return;
            }
        }

        self.branches.push(Branch::new(block.clone()));
    }

    fn adjacent_pair(&self) -> Option<(usize, usize)> {
        for (i, branch) in self.branches.iter().enumerate() {
            for (j, other) in self.branches.iter().enumerate() {
                if i == j {
                    continue;
                }

                if branch.top.checked_add(1) == Some(other.bottom) {
                    return Some((i, j));
                }
                if branch.bottom.checked_sub(1) == Some(other.top) {
                    return Some((i, j));
                }
            }
        }

        None
    }

    /// Fold adjacent branches until no two remain adjacent.
    fn merge(&mut self) {
        while let Some((into, from)) = self.adjacent_pair() {
            let other = self.branches.remove(from);
            let into = if from < into { into - 1 } else { into };
            self.branches[into].absorb(other);
        }
    }

    fn chain_extension_index(&self, chain: &Blockchain) -> Option<usize> {
        self.branches.iter().position(|branch| {
            if chain.is_empty() {
                return branch.bottom == 0;
            }

            branch.bottom == chain.len() && chain.validate_block(branch.bottom_block()).is_ok()
        })
    }

    /// Whether some branch would extend the chain if appended now.
    pub fn can_merge_with_chain(&self, chain: &Blockchain) -> bool {
        self.chain_extension_index(chain).is_some()
    }

    /// Remove and return a branch whose bottom extends the chain.
    pub fn take_chain_extension(&mut self, chain: &Blockchain) -> Option<Branch> {
        let index = self.chain_extension_index(chain)?;
        Some(self.branches.remove(index))
    }
}
