//! Hashing primitives for the SAMM approval protocol.
//!
//! - `message`: canonical message body encoding and message hash
//! - `authorization`: EIP-712 owner authorization request
//! - `salt`: module deployment salt

use alloy_primitives::B256;
use sha3::{Digest, Keccak256};

pub mod authorization;
pub mod message;
pub mod salt;

/// Keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let digest: [u8; 32] = Keccak256::digest(data.as_ref()).into();
    B256::from(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_selector() {
        let hash = keccak256("transfer(address,uint256)");
        assert_eq!(&hash[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    }
}
