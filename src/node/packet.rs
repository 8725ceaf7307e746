use crate::core::Block;
use serde::{Deserialize, Serialize};

/// Peer gossip envelope. One JSON packet per line on the peer wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Packet {
    HandShake,
    Ping,
    Block(Block),
}
