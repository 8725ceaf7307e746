//! # Pagechain
//!
//! A minimal proof-of-work cryptocurrency node. It keeps a linear chain of
//! signed blocks, mines against an adaptive difficulty target, accepts coin
//! transfers and small data page publications, and gossips blocks over TCP.
//! Wallet operations reach a running node through a local control socket.
//!
//! ## Layout
//! - `core/`: blocks, transactions, targets, the canonical chain and the
//!   out-of-order block buffer
//! - `wallet/`: RSA key pairs, addresses, derived wallet state
//! - `node/`: event loop, miner, peer networking, control socket, mempool
//! - `config/`: environment-backed settings
//! - `cli/`: argument parsing for the binary

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod node;
pub mod utils;
pub mod wallet;

pub use config::Config;
pub use crate::core::{
    Block, Blockchain, Branch, BranchTree, Output, Target, Transaction, TransactionBuilder,
    BLOCK_REWARD,
};
pub use error::{ChainError, Result};
pub use node::{send_command, Command, Mempool, Node, Packet, Response, TRANSFER_FEE};
pub use wallet::{Address, Wallet, WalletStatus};
