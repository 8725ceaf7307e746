//! Transactions
//!
//! A transaction spends key-authenticated inputs into outputs. Outputs are
//! a closed variant set: plain coin transfers and data page publications.
//! The digest every input signs covers the id, fee, inputs (without their
//! signatures) and each output's canonical byte feed.

use crate::error::{ChainError, Result};
use crate::wallet::{key_address, Address, Wallet, WalletStatus};
use rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Cost scale for page publication: one coin per million bytes
const PAGE_COST_SCALE: f32 = 1000.0 * 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Public modulus, big-endian without leading zeros
    pub key_modulus: Vec<u8>,
    pub key_exponent: u32,
    pub signature: Vec<u8>,
    pub amount: f32,
}

impl Input {
    /// The address this input spends from, derived from its key fields.
    pub fn address(&self) -> Address {
        key_address(&self.key_modulus, self.key_exponent)
    }

    fn feed(&self, hasher: &mut Sha256) {
        hasher.update(&self.key_modulus);
        hasher.update(self.key_exponent.to_le_bytes());
        hasher.update(self.amount.to_le_bytes());
    }

    fn verify(&self, digest: &[u8; 32]) -> Result<()> {
        let key = RsaPublicKey::new(
            BigUint::from_bytes_be(&self.key_modulus),
            BigUint::from(self.key_exponent),
        )?;
        key.verify(Pkcs1v15Sign::new::<Sha256>(), digest, &self.signature)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// Move `amount` coins to `address`
    Transfer { address: Address, amount: f32 },
    /// Record a data page owned by `address`
    NewPage {
        address: Address,
        name: String,
        length: u32,
        chunks: Vec<[u8; 32]>,
    },
}

impl Output {
    fn feed(&self, hasher: &mut Sha256) {
        match self {
            Output::Transfer { address, amount } => {
                hasher.update(address.as_bytes());
                hasher.update(amount.to_le_bytes());
            }
            Output::NewPage {
                address,
                name,
                length,
                chunks,
            } => {
                hasher.update(address.as_bytes());
                hasher.update(name.as_bytes());
                hasher.update(length.to_le_bytes());
                for chunk in chunks {
                    hasher.update(chunk);
                }
            }
        }
    }

    pub fn cost(&self) -> f32 {
        match self {
            Output::Transfer { amount, .. } => *amount,
            Output::NewPage { name, length, .. } => {
                (*length + name.len() as u32) as f32 / PAGE_COST_SCALE
            }
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        match self {
            Output::Transfer { address, .. } => vec![*address],
            Output::NewPage { address, .. } => vec![*address],
        }
    }

    /// Run this output against an observer address, returning whether the
    /// address was involved.
    fn apply(&self, status: &mut WalletStatus, observer: Address) -> bool {
        match self {
            Output::Transfer { address, amount } => {
                if *address == observer {
                    status.balance += amount;
                    true
                } else {
                    false
                }
            }
            Output::NewPage { address, .. } => *address == observer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub fee: f32,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Transaction {
    /// SHA-256 over the canonical feed: id, fee, each input (key fields and
    /// amount, never the signature), each output.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.id.to_le_bytes());
        hasher.update(self.fee.to_le_bytes());
        for input in &self.inputs {
            input.feed(&mut hasher);
        }
        for output in &self.outputs {
            output.feed(&mut hasher);
        }
        hasher.finalize().into()
    }

    pub fn validate(&self) -> Result<()> {
        let digest = self.hash();

        let mut input_total = 0f32;
        for input in &self.inputs {
            input_total += input.amount;
            input.verify(&digest)?;
        }

        let mut output_total = self.fee;
        for output in &self.outputs {
            output_total += output.cost();
        }

        // Exact comparison, with both sides summed in a fixed order
        if input_total != output_total {
            return Err(ChainError::InsufficientInput);
        }

        Ok(())
    }

    /// Apply this transaction to the status of one observed address.
    /// `reward_to` is the miner of the containing block, who collects the
    /// fee. Involved addresses must see strictly increasing transaction ids.
    pub fn apply(
        &self,
        status: &mut WalletStatus,
        observer: Address,
        reward_to: Address,
    ) -> Result<()> {
        let mut involved = false;

        for input in &self.inputs {
            if input.address() == observer {
                status.balance -= input.amount;
                involved = true;
            }
        }

        for output in &self.outputs {
            involved |= output.apply(status, observer);
        }

        if reward_to == observer {
            status.balance += self.fee;
            involved = true;
        }

        if involved {
            if self.id <= status.last_id {
                return Err(ChainError::InvalidTransactionId);
            }
            status.last_id = self.id;
        }

        Ok(())
    }
}

/// Order-preserving deduplicated list of every address the given
/// transactions touch, inputs before outputs per transaction.
pub fn addresses_used(transactions: &[Transaction]) -> Vec<Address> {
    let mut addresses = Vec::new();
    for transaction in transactions {
        for input in &transaction.inputs {
            let address = input.address();
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        for output in &transaction.outputs {
            for address in output.addresses() {
                if !addresses.contains(&address) {
                    addresses.push(address);
                }
            }
        }
    }

    addresses
}

/// Assembles a transaction, then signs every input over the finished digest.
pub struct TransactionBuilder<'a> {
    transaction: Transaction,
    signers: Vec<&'a Wallet>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(id: u64, fee: f32) -> TransactionBuilder<'a> {
        TransactionBuilder {
            transaction: Transaction {
                id,
                fee,
                inputs: Vec::new(),
                outputs: Vec::new(),
            },
            signers: Vec::new(),
        }
    }

    pub fn input(mut self, wallet: &'a Wallet, amount: f32) -> Self {
        self.transaction.inputs.push(Input {
            key_modulus: wallet.public_modulus(),
            key_exponent: wallet.public_exponent(),
            signature: Vec::new(),
            amount,
        });
        self.signers.push(wallet);
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.transaction.outputs.push(output);
        self
    }

    pub fn build(mut self) -> Result<Transaction> {
        // The digest excludes signatures, so it is stable while we fill
        // them in
        let digest = self.transaction.hash();
        for (input, wallet) in self.transaction.inputs.iter_mut().zip(&self.signers) {
            input.signature = wallet.sign(&digest)?;
        }

        Ok(self.transaction)
    }
}
