//! EIP-712 authorization request a Safe owner signs to obtain a backend token.
//!
//! Domain: { name: "SAMMAuthorizationRequest", version, chainId, verifyingContract: module }
//! Type:   SAMMAuthorizationRequest(address signer,address module,uint256 time)

use std::borrow::Cow;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use samm_types::{Result, SammError};

pub const AUTHORIZATION_DOMAIN_NAME: &str = "SAMMAuthorizationRequest";
pub const DEFAULT_AUTHORIZATION_VERSION: &str = "1";

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct SAMMAuthorizationRequest {
        address signer;
        address module;
        uint256 time;
    }
}

/// Signing domain for a module on `chain_id`.
pub fn authorization_domain(module: Address, chain_id: u64, version: &str) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(AUTHORIZATION_DOMAIN_NAME)),
        Some(Cow::Owned(version.to_string())),
        Some(U256::from(chain_id)),
        Some(module),
        None,
    )
}

/// EIP-712 signing hash of an authorization request.
pub fn authorization_request_hash(
    signer: Address,
    module: Address,
    time: u64,
    chain_id: u64,
    version: &str,
) -> B256 {
    let request = SAMMAuthorizationRequest {
        signer,
        module,
        time: U256::from(time),
    };
    request.eip712_signing_hash(&authorization_domain(module, chain_id, version))
}

/// Fail unless `signer` is one of the Safe owners (case-insensitive).
pub fn ensure_owner(owners: &[Address], signer: &Address) -> Result<()> {
    if owners.contains(signer) {
        Ok(())
    } else {
        Err(SammError::NotSafeOwner)
    }
}
