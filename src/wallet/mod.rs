//! Wallet identities and keys
//!
//! An address is the SHA-256 hash of an RSA public key's modulus bytes
//! concatenated with its little-endian 32-bit exponent. Wallets hold the
//! 2048-bit private key and sign transaction digests with PKCS#1 v1.5.

pub mod address;
pub mod wallet;

pub use address::{key_address, Address};
pub use wallet::Wallet;

use serde::{Deserialize, Serialize};

/// Derived per-address state, recomputed by full chain replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub balance: f32,
    /// Highest transaction id this address has been involved in
    pub last_id: u64,
}
