use crate::core::Transaction;

/// Pending transactions awaiting a block, in arrival order, deduplicated
/// by transaction hash. Owned exclusively by the node event loop.
#[derive(Debug, Default)]
pub struct Mempool {
    pending: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool {
            pending: Vec::new(),
        }
    }

    /// Queue a transaction unless an identical one is already pending.
    pub fn add(&mut self, transaction: Transaction) -> bool {
        let hash = transaction.hash();
        if self.pending.iter().any(|tx| tx.hash() == hash) {
            return false;
        }

        self.pending.push(transaction);
        true
    }

    /// Drop every pending transaction that appears in an accepted block.
    pub fn remove_committed(&mut self, committed: &[Transaction]) {
        let hashes: Vec<[u8; 32]> = committed.iter().map(|tx| tx.hash()).collect();
        self.pending.retain(|tx| !hashes.contains(&tx.hash()));
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Output, TransactionBuilder};
    use crate::wallet::{Address, Wallet};
    use once_cell::sync::Lazy;

    static WALLET: Lazy<Wallet> = Lazy::new(|| Wallet::new().unwrap());

    fn transfer(id: u64, amount: f32) -> Transaction {
        TransactionBuilder::new(id, 1.0)
            .input(&WALLET, amount + 1.0)
            .output(Output::Transfer {
                address: Address::zero(),
                amount,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_deduplicates_by_hash() {
        let mut mempool = Mempool::new();
        assert!(mempool.add(transfer(1, 5.0)));
        assert!(!mempool.add(transfer(1, 5.0)));
        assert!(mempool.add(transfer(2, 5.0)));
        assert_eq!(mempool.len(), 2);
    }

    #[test]
    fn test_remove_committed_keeps_order() {
        let mut mempool = Mempool::new();
        let first = transfer(1, 1.0);
        let second = transfer(2, 2.0);
        let third = transfer(3, 3.0);

        mempool.add(first.clone());
        mempool.add(second.clone());
        mempool.add(third.clone());

        mempool.remove_committed(&[second]);
        let ids: Vec<u64> = mempool.pending().iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
