use crate::error::{ChainError, Result};
use crate::utils::sha256_digest;
use data_encoding::BASE32;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ADDRESS_LEN: usize = 32;

/// A 32-byte wallet identity, displayed in Base32.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Address {
        Address(bytes)
    }

    pub fn zero() -> Address {
        Address([0u8; ADDRESS_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parse the Base32 display form back into an address.
    pub fn decode(encoded: &str) -> Result<Address> {
        let bytes = BASE32
            .decode(encoded.as_bytes())
            .map_err(|e| ChainError::Serialization(format!("Invalid base32 address: {e}")))?;

        if bytes.len() != ADDRESS_LEN {
            return Err(ChainError::Serialization(format!(
                "Address must be {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&bytes);
        Ok(Address(address))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE32.encode(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Address of a raw public key: SHA-256 over the modulus bytes followed by
/// the exponent as 4 little-endian bytes.
pub fn key_address(modulus: &[u8], exponent: u32) -> Address {
    let mut data = Vec::with_capacity(modulus.len() + 4);
    data.extend_from_slice(modulus);
    data.extend_from_slice(&exponent.to_le_bytes());
    Address(sha256_digest(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base32_round_trip() {
        let mut bytes = [0u8; ADDRESS_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }

        let address = Address::new(bytes);
        let encoded = address.to_string();
        let decoded = Address::decode(&encoded).unwrap();
        assert_eq!(address, decoded);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let encoded = BASE32.encode(&[1u8; 16]);
        assert!(Address::decode(&encoded).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_alphabet() {
        assert!(Address::decode("not!base32@@").is_err());
    }

    #[test]
    fn test_key_address_depends_on_exponent() {
        let modulus = [7u8; 256];
        let a = key_address(&modulus, 65537);
        let b = key_address(&modulus, 3);
        assert_ne!(a, b);
    }
}
