use crate::core::{merkle_root, Target, Transaction};
use crate::wallet::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Coins paid to `reward_to` for each accepted block
pub const BLOCK_REWARD: f32 = 100.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: u64,
    pub prev_block: [u8; 32],
    /// Unix seconds
    pub timestamp: u64,
    pub target: Target,
    pub reward_to: Address,
    pub transactions: Vec<Transaction>,
    pub pow: u64,
}

impl Block {
    /// SHA-256 over the header fields with the transaction merkle root in
    /// place of the transaction list. Scalars are little-endian.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.id.to_le_bytes());
        hasher.update(self.prev_block);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.target.as_bytes());
        hasher.update(self.reward_to.as_bytes());
        hasher.update(merkle_root(&self.transactions));
        hasher.update(self.pow.to_le_bytes());
        hasher.finalize().into()
    }

    /// Grind the nonce from its current value until the hash satisfies the
    /// target. Blocking; cooperative cancellation is the miner's job.
    pub fn mine(&mut self) {
        while !self.target.is_met_by(&self.hash()) {
            self.pow += 1;
        }
    }

    /// True when this block directly extends `other`.
    pub fn is_next_to(&self, other: &Block) -> bool {
        self.id == other.id.wrapping_add(1)
            && self.timestamp >= other.timestamp
            && self.prev_block == other.hash()
    }
}
