//! The node
//!
//! A single-threaded event loop owns the chain, the mempool and the branch
//! buffer. Network readers, the control socket and the miner run as worker
//! threads and funnel everything through one bounded event channel, so
//! block acceptance is totally ordered and consensus state needs no locks.

pub mod ipc;
pub mod mempool;
pub mod miner;
pub mod network;
pub mod packet;

pub use ipc::{send_command, Command, CommandRequest, Response};
pub use mempool::Mempool;
pub use network::Network;
pub use packet::Packet;

use crate::config::Config;
use crate::core::{Block, Blockchain, BranchTree, Output, TransactionBuilder};
use crate::error::{ChainError, Result};
use crate::wallet::{Address, Wallet};
use data_encoding::HEXLOWER;
use log::{info, warn};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

const EVENT_QUEUE_DEPTH: usize = 64;

/// Flat fee attached to every wallet-built transaction
pub const TRANSFER_FEE: f32 = 1.0;

pub enum Event {
    Packet(Packet),
    Command(CommandRequest),
    Mined(Block),
}

pub struct Node {
    chain: Blockchain,
    mempool: Mempool,
    branches: BranchTree,
    reward_to: Address,
    network: Network,
    miner: SyncSender<Block>,
    events: Receiver<Event>,
}

impl Node {
    /// Bind every worker task and run the event loop. Does not return
    /// under normal operation.
    pub fn start(reward_to: Address, config: &Config) -> Result<()> {
        let (event_tx, events) = sync_channel(EVENT_QUEUE_DEPTH);

        let network = Network::start(config.port, event_tx.clone())?;
        ipc::listen(&config.socket_path, event_tx.clone())?;
        let miner = miner::start(event_tx);

        let mut node = Node {
            chain: Blockchain::new(),
            mempool: Mempool::new(),
            branches: BranchTree::new(),
            reward_to,
            network,
            miner,
            events,
        };

        info!(
            "Node started, rewarding {}, control socket {:?}",
            reward_to, config.socket_path
        );
        node.feed_miner();
        node.run();
        Ok(())
    }

    fn run(&mut self) {
        while let Ok(event) = self.events.recv() {
            match event {
                Event::Packet(packet) => self.handle_packet(packet),
                Event::Command(request) => {
                    let response = self
                        .handle_command(&request.command)
                        .unwrap_or_else(|err| Response::error(err.to_string()));
                    let _ = request.reply.send(response);
                }
                Event::Mined(block) => {
                    // A gossiped block may have beaten ours to the tip; the
                    // miner then just needs a new candidate
                    if !self.handle_block(block) {
                        self.feed_miner();
                    }
                }
            }
        }
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::HandShake => info!("Hand shake"),
            Packet::Ping => info!("Pong"),
            Packet::Block(block) => {
                self.handle_block(block);
            }
        }
    }

    /// Try to extend the chain. An accepted block clears its transactions
    /// from the mempool, goes out as gossip, drains any newly linkable
    /// branches and restarts the miner. Out-of-order blocks are buffered.
    fn handle_block(&mut self, block: Block) -> bool {
        match self.chain.add(block.clone()) {
            Ok(()) => {}
            Err(err @ (ChainError::InvalidId | ChainError::InvalidPrevBlockHash)) => {
                warn!("Invalid block '{err}'");
                self.buffer_block(block);
                return false;
            }
            Err(err) => {
                warn!("Invalid block '{err}'");
                return false;
            }
        }

        self.after_accept(&block);
        self.drain_branches();
        self.feed_miner();
        true
    }

    fn after_accept(&mut self, block: &Block) {
        info!(
            "Accepted block {} ({})",
            block.id,
            HEXLOWER.encode(&block.hash())
        );
        self.mempool.remove_committed(&block.transactions);
        self.network.broadcast(Packet::Block(block.clone()));
    }

    /// Keep blocks that ran ahead of the chain for later linking. Stale
    /// candidates for already-filled positions can never attach and are
    /// dropped.
    fn buffer_block(&mut self, block: Block) {
        if block.id <= self.chain.len() {
            return;
        }

        self.branches.add(&block);
    }

    fn drain_branches(&mut self) {
        while let Some(branch) = self.branches.take_chain_extension(&self.chain) {
            for block in branch.into_blocks() {
                match self.chain.add(block.clone()) {
                    Ok(()) => self.after_accept(&block),
                    Err(err) => {
                        warn!("Dropping buffered block {}: {err}", block.id);
                        break;
                    }
                }
            }
        }
    }

    /// Hand the miner a fresh candidate carrying the current mempool.
    fn feed_miner(&mut self) {
        let candidate = match self.candidate() {
            Ok(candidate) => candidate,
            Err(err) => {
                warn!("Failed to build mining candidate: {err}");
                return;
            }
        };

        if self.miner.send(candidate).is_err() {
            warn!("Miner is gone; no further blocks will be mined");
        }
    }

    fn candidate(&self) -> Result<Block> {
        let mut block = self.chain.new_block(self.reward_to)?;
        // TODO: Cap how many transactions fit in one block
        block.transactions = self.mempool.pending().to_vec();
        Ok(block)
    }

    fn handle_command(&mut self, command: &Command) -> Result<Response> {
        match command {
            Command::Ping => {
                info!("Ping");
                self.network.broadcast(Packet::Ping);
                Ok(Response::default())
            }
            Command::Connect { node_address } => {
                info!("Connecting to '{node_address}'");
                self.network.connect(node_address)?;
                Ok(Response::default())
            }
            Command::Balance { address } => {
                info!("Balance for '{address}'");
                let status = self.chain.wallet_status(*address)?;
                Ok(Response {
                    balance: status.balance,
                    ..Response::default()
                })
            }
            Command::Send {
                wallet,
                address,
                amount,
            } => self.send(wallet, *address, *amount),
            Command::Page {
                wallet,
                name,
                length,
                chunks,
            } => self.publish_page(wallet, name, *length, chunks),
            Command::Block { id } => {
                let block = self
                    .chain
                    .block(*id)
                    .cloned()
                    .ok_or(ChainError::UnknownBlock(*id))?;
                Ok(Response {
                    block: Some(block),
                    ..Response::default()
                })
            }
            Command::Stats => Ok(Response {
                block: Some(self.chain.top().cloned().unwrap_or_default()),
                ..Response::default()
            }),
        }
    }

    fn send(&mut self, wallet_der: &[u8], to: Address, amount: f32) -> Result<Response> {
        let wallet = Wallet::from_pkcs8_der(wallet_der)?;
        info!("Send {amount} from '{}' to '{to}'", wallet.address());

        let status = self.chain.wallet_status(wallet.address())?;
        if status.balance < amount + TRANSFER_FEE {
            return Err(ChainError::InsufficientInput);
        }

        let transaction = TransactionBuilder::new(status.last_id + 1, TRANSFER_FEE)
            .input(&wallet, amount + TRANSFER_FEE)
            .output(Output::Transfer {
                address: to,
                amount,
            })
            .build()?;

        self.mempool.add(transaction);
        Ok(Response::default())
    }

    fn publish_page(
        &mut self,
        wallet_der: &[u8],
        name: &str,
        length: u32,
        chunks: &[[u8; 32]],
    ) -> Result<Response> {
        let wallet = Wallet::from_pkcs8_der(wallet_der)?;
        info!("Publish page '{name}' for '{}'", wallet.address());

        let output = Output::NewPage {
            address: wallet.address(),
            name: name.to_string(),
            length,
            chunks: chunks.to_vec(),
        };
        let cost = output.cost();

        let status = self.chain.wallet_status(wallet.address())?;
        if status.balance < cost + TRANSFER_FEE {
            return Err(ChainError::InsufficientInput);
        }

        let transaction = TransactionBuilder::new(status.last_id + 1, TRANSFER_FEE)
            .input(&wallet, cost + TRANSFER_FEE)
            .output(output)
            .build()?;

        self.mempool.add(transaction);
        Ok(Response::default())
    }
}
