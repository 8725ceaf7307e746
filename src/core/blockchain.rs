//! The canonical chain
//!
//! An append-only run of accepted blocks with ids starting at zero. Wallet
//! state is never indexed; every query replays the whole chain, which keeps
//! the replay the single source of truth for balances and id monotonicity.

use crate::core::{
    addresses_used, calculate_target, Block, Target, BLOCK_REWARD, BLOCK_SAMPLE_SIZE,
};
use crate::error::{ChainError, Result};
use crate::utils::current_timestamp;
use crate::wallet::{Address, WalletStatus};

#[derive(Debug, Default)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    pub fn new() -> Blockchain {
        Blockchain { blocks: Vec::new() }
    }

    pub fn top(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn block(&self, id: u64) -> Option<&Block> {
        self.blocks.get(id as usize)
    }

    pub fn len(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append `block` if it extends the tip and passes validation.
    pub fn add(&mut self, block: Block) -> Result<()> {
        match self.top() {
            Some(top) => {
                if block.id != top.id + 1 {
                    return Err(ChainError::InvalidId);
                }
            }
            None => {
                if block.id != 0 {
                    return Err(ChainError::InvalidId);
                }
            }
        }

        self.validate_block(&block)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Check a block as a tentative append to the current chain.
    pub fn validate_block(&self, block: &Block) -> Result<()> {
        if block.id > 0 {
            let prev = self
                .blocks
                .get(block.id as usize - 1)
                .ok_or(ChainError::InvalidId)?;

            if block.timestamp < prev.timestamp {
                return Err(ChainError::InvalidTimestamp);
            }

            if block.prev_block != prev.hash() {
                return Err(ChainError::InvalidPrevBlockHash);
            }
        }

        // The target is not chosen by the block; it must match the value
        // this chain derives for the block's position
        if block.target != self.next_target() {
            return Err(ChainError::InvalidTarget);
        }

        if !block.target.is_met_by(&block.hash()) {
            return Err(ChainError::InvalidPow);
        }

        for transaction in &block.transactions {
            transaction.validate()?;
        }

        // Replay every involved wallet over the chain with this block at
        // the tip, catching overdrafts and transaction id reuse before
        // acceptance
        for address in addresses_used(&block.transactions) {
            self.replay(address, Some(block))?;
        }

        Ok(())
    }

    pub fn wallet_status(&self, address: Address) -> Result<WalletStatus> {
        self.replay(address, None)
    }

    fn replay(&self, address: Address, candidate: Option<&Block>) -> Result<WalletStatus> {
        let mut status = WalletStatus::default();

        for block in self.blocks.iter().chain(candidate) {
            if block.reward_to == address {
                status.balance += BLOCK_REWARD;
            }

            for transaction in &block.transactions {
                transaction.apply(&mut status, address, block.reward_to)?;
            }

            if status.balance < 0.0 {
                return Err(ChainError::NegativeBalance);
            }
        }

        Ok(status)
    }

    fn sample(&self) -> (Option<&Block>, Option<&Block>) {
        if self.len() <= BLOCK_SAMPLE_SIZE {
            return (None, None);
        }

        let len = self.blocks.len();
        let start = &self.blocks[len - BLOCK_SAMPLE_SIZE as usize - 1];
        let end = &self.blocks[len - 1];
        (Some(start), Some(end))
    }

    /// The target a block appended right now must carry.
    pub fn next_target(&self) -> Target {
        let (start, end) = self.sample();
        calculate_target(start, end)
    }

    /// Build an unmined candidate extending the tip, with an empty
    /// transaction list.
    pub fn new_block(&self, reward_to: Address) -> Result<Block> {
        let (id, prev_block) = match self.top() {
            Some(top) => (top.id + 1, top.hash()),
            None => (0, [0u8; 32]),
        };

        Ok(Block {
            id,
            prev_block,
            timestamp: current_timestamp()?,
            target: self.next_target(),
            reward_to,
            transactions: Vec::new(),
            pow: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mined_block(chain: &Blockchain) -> Block {
        let mut block = chain.new_block(Address::zero()).unwrap();
        block.mine();
        block
    }

    #[test]
    fn test_accepts_linked_blocks() {
        let mut chain = Blockchain::new();
        chain.add(mined_block(&chain)).unwrap();
        chain.add(mined_block(&chain)).unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.top().unwrap().id, 1);
        assert_eq!(chain.block(0).unwrap().id, 0);
        assert!(chain.block(2).is_none());
    }

    #[test]
    fn test_rejects_unmined_candidate() {
        let mut chain = Blockchain::new();
        let block = chain.new_block(Address::zero()).unwrap();
        assert_eq!(chain.add(block), Err(ChainError::InvalidPow));
    }

    #[test]
    fn test_rejects_foreign_target() {
        let mut chain = Blockchain::new();
        let mut block = chain.new_block(Address::zero()).unwrap();
        // A lenient target the schedule does not allow
        block.target = Target::new([0xFF, 0xFF, 0xFF, 0x21]);
        block.mine();
        assert_eq!(chain.add(block), Err(ChainError::InvalidTarget));
    }

    #[test]
    fn test_reward_accumulates() {
        let wallet = Address::new([9u8; 32]);
        let mut chain = Blockchain::new();

        for _ in 0..3 {
            let mut block = chain.new_block(wallet).unwrap();
            block.mine();
            chain.add(block).unwrap();
        }

        let status = chain.wallet_status(wallet).unwrap();
        assert_eq!(status.balance, 3.0 * BLOCK_REWARD);
        assert_eq!(status.last_id, 0);
    }

    #[test]
    fn test_unknown_wallet_is_empty() {
        let chain = Blockchain::new();
        let status = chain.wallet_status(Address::zero()).unwrap();
        assert_eq!(status, WalletStatus::default());
    }
}
