//! Chain acceptance scenarios
//!
//! Each test drives the consensus rules end to end: candidates are built
//! from the chain, mutated into shape, mined, and offered to `add`.

use pagechain::core::{Block, Blockchain, BranchTree, Output, TransactionBuilder};
use pagechain::error::ChainError;
use pagechain::wallet::{Address, Wallet};
use pagechain::BLOCK_REWARD;
use once_cell::sync::Lazy;

static WALLET_A: Lazy<Wallet> = Lazy::new(|| Wallet::new().unwrap());
static WALLET_B: Lazy<Wallet> = Lazy::new(|| Wallet::new().unwrap());

/// Build a candidate, reshape it, mine it, and check what `add` says.
fn test_block(
    chain: &mut Blockchain,
    expect: Result<(), ChainError>,
    configure: impl FnOnce(&mut Block),
) -> Block {
    let mut block = chain.new_block(Address::zero()).unwrap();
    configure(&mut block);
    block.mine();

    assert_eq!(chain.add(block.clone()), expect);
    block
}

#[test]
fn test_first_block_id_gate() {
    let mut chain = Blockchain::new();

    test_block(&mut chain, Err(ChainError::InvalidId), |block| {
        block.id = 1;
    });
    test_block(&mut chain, Ok(()), |block| {
        block.id = 0;
    });
    test_block(&mut chain, Err(ChainError::InvalidId), |block| {
        block.id = 0;
    });
    test_block(&mut chain, Ok(()), |block| {
        block.id = 1;
    });
}

#[test]
fn test_timestamps_must_be_monotonic() {
    let mut chain = Blockchain::new();

    test_block(&mut chain, Ok(()), |block| {
        block.timestamp = 0;
    });
    test_block(&mut chain, Ok(()), |block| {
        block.timestamp = 10;
    });
    test_block(&mut chain, Err(ChainError::InvalidTimestamp), |block| {
        block.timestamp = 4;
    });
}

#[test]
fn test_prev_hash_gate() {
    let mut chain = Blockchain::new();

    let block_a = test_block(&mut chain, Ok(()), |_| {});
    test_block(&mut chain, Ok(()), |block| {
        block.prev_block = block_a.hash();
    });
    test_block(&mut chain, Err(ChainError::InvalidPrevBlockHash), |block| {
        block.prev_block = [0u8; 32];
    });
}

#[test]
fn test_pow_gate() {
    let mut chain = Blockchain::new();
    test_block(&mut chain, Ok(()), |_| {});

    // An unmined candidate must be turned away
    let block = chain.new_block(Address::zero()).unwrap();
    assert_eq!(chain.add(block), Err(ChainError::InvalidPow));
}

#[test]
fn test_transfer_and_page_end_to_end() {
    let mut chain = Blockchain::new();

    // One mined block gives A the block reward
    let mut block = chain.new_block(WALLET_A.address()).unwrap();
    block.mine();
    chain.add(block).unwrap();

    // (1000 bytes of content + "index.html") / 1e6
    let page_cost = 1010.0 / 1_000_000.0_f32;

    let transaction = TransactionBuilder::new(1, 1.0)
        .input(&WALLET_A, 11.0)
        .output(Output::Transfer {
            address: WALLET_B.address(),
            amount: 10.0 - page_cost,
        })
        .output(Output::NewPage {
            address: WALLET_B.address(),
            name: "index.html".to_string(),
            length: 1000,
            chunks: Vec::new(),
        })
        .build()
        .unwrap();

    let mut block = chain.new_block(WALLET_A.address()).unwrap();
    block.transactions.push(transaction);
    block.mine();
    chain.add(block).unwrap();

    let status_a = chain.wallet_status(WALLET_A.address()).unwrap();
    let status_b = chain.wallet_status(WALLET_B.address()).unwrap();

    // Two rewards, minus the 11-coin input, plus the fee A collects as the
    // miner of the second block
    assert_eq!(status_a.balance, 2.0 * BLOCK_REWARD - 11.0 + 1.0);
    assert_eq!(status_b.balance, 10.0 - page_cost);
    assert_eq!(status_a.last_id, 1);
    assert_eq!(status_b.last_id, 1);
}

#[test]
fn test_overdraft_is_rejected() {
    let mut chain = Blockchain::new();

    let mut block = chain.new_block(WALLET_A.address()).unwrap();
    block.mine();
    chain.add(block).unwrap();

    // A holds one reward; spending 150 would go negative
    let transaction = TransactionBuilder::new(1, 1.0)
        .input(&WALLET_A, 151.0)
        .output(Output::Transfer {
            address: WALLET_B.address(),
            amount: 150.0,
        })
        .build()
        .unwrap();

    let mut block = chain.new_block(Address::zero()).unwrap();
    block.transactions.push(transaction);
    block.mine();

    assert_eq!(chain.add(block), Err(ChainError::NegativeBalance));
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_transaction_id_reuse_is_rejected() {
    let mut chain = Blockchain::new();

    let mut block = chain.new_block(WALLET_A.address()).unwrap();
    block.mine();
    chain.add(block).unwrap();

    let spend = |amount: f32| {
        TransactionBuilder::new(1, 1.0)
            .input(&WALLET_A, amount + 1.0)
            .output(Output::Transfer {
                address: WALLET_B.address(),
                amount,
            })
            .build()
            .unwrap()
    };

    let mut block = chain.new_block(WALLET_A.address()).unwrap();
    block.transactions.push(spend(10.0));
    block.mine();
    chain.add(block).unwrap();

    // A fresh transaction that reuses id 1 can never apply to A again
    let mut block = chain.new_block(WALLET_A.address()).unwrap();
    block.transactions.push(spend(20.0));
    block.mine();

    assert_eq!(chain.add(block), Err(ChainError::InvalidTransactionId));
}

#[test]
fn test_accepted_chain_invariants() {
    let mut chain = Blockchain::new();
    for _ in 0..5 {
        let mut block = chain.new_block(WALLET_A.address()).unwrap();
        block.mine();
        chain.add(block).unwrap();
    }

    for id in 0..chain.len() {
        let block = chain.block(id).unwrap();
        assert!(block.target.is_met_by(&block.hash()));

        if id > 0 {
            assert!(block.is_next_to(chain.block(id - 1).unwrap()));
        }
    }

    assert!(chain.wallet_status(WALLET_A.address()).unwrap().balance >= 0.0);
}

#[test]
fn test_out_of_order_blocks_link_through_branches() {
    // Mine a private chain, then replay it to a fresh chain out of order
    let mut source = Blockchain::new();
    let mut blocks = Vec::new();
    for _ in 0..4 {
        let mut block = source.new_block(WALLET_A.address()).unwrap();
        block.mine();
        source.add(block.clone()).unwrap();
        blocks.push(block);
    }

    let mut chain = Blockchain::new();
    let mut tree = BranchTree::new();

    for late in [&blocks[2], &blocks[1], &blocks[3]] {
        assert!(chain.add((*late).clone()).is_err());
        tree.add(late);
    }
    assert!(!tree.can_merge_with_chain(&chain));

    chain.add(blocks[0].clone()).unwrap();
    let branch = tree.take_chain_extension(&chain).unwrap();
    for block in branch.into_blocks() {
        chain.add(block).unwrap();
    }

    assert_eq!(chain.len(), 4);
    assert_eq!(
        chain.wallet_status(WALLET_A.address()).unwrap().balance,
        4.0 * BLOCK_REWARD
    );
}
