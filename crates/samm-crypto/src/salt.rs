//! CREATE2 salt for module proxies: keccak256(abi.encode(address safe, uint256 nonce)).

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolValue;
use rand::RngCore;

use crate::keccak256;

/// Salt for a module proxy deployed by `safe` with a caller-chosen nonce.
pub fn deploy_salt(safe: Address, salt_nonce: U256) -> B256 {
    keccak256((safe, salt_nonce).abi_encode_params())
}

/// Fresh 256-bit random salt nonce.
pub fn random_salt_nonce() -> U256 {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    U256::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use samm_types::hex_to_bytes;

    #[test]
    fn test_deploy_salt_vector() {
        let safe: Address = "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap();
        let salt = deploy_salt(safe, U256::from(123_456_789u64));
        assert_eq!(
            salt.to_vec(),
            hex_to_bytes("0x97e8c579f612f4a9a95d4ac5ef7194c7f4a3b5e0d4866df98e06405d62bfd2d8").unwrap()
        );
    }

    #[test]
    fn test_random_salt_nonce_varies() {
        assert_ne!(random_salt_nonce(), random_salt_nonce());
    }
}
