//! Consensus and execution engine: blocks, transactions, targets, the
//! canonical chain and the out-of-order block buffer.

pub mod block;
pub mod blockchain;
pub mod branch;
pub mod merkle;
pub mod target;
pub mod transaction;

pub use block::{Block, BLOCK_REWARD};
pub use blockchain::Blockchain;
pub use branch::{Branch, BranchTree};
pub use merkle::merkle_root;
pub use target::{calculate_target, Target, BLOCK_SAMPLE_SIZE, BLOCK_TIME};
pub use transaction::{
    addresses_used, Input, Output, Transaction, TransactionBuilder,
};
