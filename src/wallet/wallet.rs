use crate::error::{ChainError, Result};
use crate::wallet::{key_address, Address};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey};
use sha2::Sha256;
use std::fs;
use std::path::Path;

const KEY_BITS: usize = 2048;

/// An RSA-2048 key pair. Derives exactly one address.
#[derive(Clone)]
pub struct Wallet {
    key: RsaPrivateKey,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let key = RsaPrivateKey::new(&mut OsRng, KEY_BITS)?;
        Ok(Wallet { key })
    }

    pub fn address(&self) -> Address {
        key_address(&self.public_modulus(), self.public_exponent())
    }

    /// Big-endian bytes of the public modulus, without leading zeros.
    pub fn public_modulus(&self) -> Vec<u8> {
        self.key.n().to_bytes_be()
    }

    pub fn public_exponent(&self) -> u32 {
        exponent_to_u32(self.key.e())
    }

    /// Sign a 32-byte transaction digest with PKCS#1 v1.5.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>> {
        let signature = self.key.sign(Pkcs1v15Sign::new::<Sha256>(), digest)?;
        Ok(signature)
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = self
            .key
            .to_pkcs8_der()
            .map_err(|e| ChainError::Crypto(format!("Failed to encode key: {e}")))?;
        Ok(document.as_bytes().to_vec())
    }

    pub fn from_pkcs8_der(bytes: &[u8]) -> Result<Wallet> {
        let key = RsaPrivateKey::from_pkcs8_der(bytes)
            .map_err(|e| ChainError::Crypto(format!("Failed to decode key: {e}")))?;
        Ok(Wallet { key })
    }

    /// Write the key to disk as PKCS#8 DER. Wallet files belong to the CLI
    /// process; the node never reads them.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_pkcs8_der()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Wallet> {
        let bytes = fs::read(path)?;
        Wallet::from_pkcs8_der(&bytes)
    }
}

/// The exponent is small (usually 65537); take its low four bytes.
pub(crate) fn exponent_to_u32(e: &BigUint) -> u32 {
    let bytes = e.to_bytes_le();
    let mut buffer = [0u8; 4];
    for (i, b) in bytes.iter().take(4).enumerate() {
        buffer[i] = *b;
    }
    u32::from_le_bytes(buffer)
}
