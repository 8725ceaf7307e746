use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pagechain",
    about = "A minimal proof-of-work cryptocurrency node"
)]
pub struct Opt {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Subcommand)]
pub enum NodeCommand {
    /// Run a node, mining rewards to the given wallet
    Start {
        /// Peer port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Wallet file whose address collects block rewards; created if
        /// missing
        #[arg(long)]
        wallet: Option<PathBuf>,
    },

    /// Generate a wallet file and print its address
    CreateWallet {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Look up the balance of an address
    Balance { address: String },

    /// Queue a coin transfer
    Send {
        /// Wallet file to spend from
        #[arg(long)]
        wallet: Option<PathBuf>,

        /// Base32 destination address
        to: String,

        amount: f32,
    },

    /// Queue a data page publication
    Page {
        /// Wallet file paying for the page
        #[arg(long)]
        wallet: Option<PathBuf>,

        name: String,

        /// Page content length in bytes
        length: u32,
    },

    /// Ping every connected peer
    Ping,

    /// Connect to a peer
    Connect { node_address: String },

    /// Fetch an accepted block by id
    Block { id: u64 },

    /// Show the chain tip
    Stats,
}
