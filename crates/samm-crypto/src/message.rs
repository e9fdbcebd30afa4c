//! Canonical message hash for off-chain member approvals.
//!
//! msg_hash = keccak256(abi.encode(
//!     address to, uint256 value, bytes32 keccak256(data), uint8 operation,
//!     uint256 nonce, uint256 deadline, address module, uint256 chain_id
//! ))
//!
//! Must stay bit-exact with the module contract: the relayer replays the
//! approvals against this digest.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolValue;
use base64::{engine::general_purpose::STANDARD, Engine};
use samm_types::{validate_address, MessageBody, Operation, Result};

use crate::keccak256;

/// Approval window added to the latest block timestamp (7 days).
pub const EXPIRATION_PERIOD: u64 = 604_800;

/// ABI-encode the message tuple with standard fixed-width encoding.
#[allow(clippy::too_many_arguments)]
pub fn encode_message(
    to: Address,
    value: U256,
    calldata_hash: B256,
    operation: Operation,
    nonce: U256,
    deadline: U256,
    module: Address,
    chain_id: U256,
) -> Vec<u8> {
    // uint8 occupies a full right-aligned word
    let operation = U256::from(operation.as_u8());
    (to, value, calldata_hash, operation, nonce, deadline, module, chain_id).abi_encode_params()
}

/// Compute the message hash members sign off on.
///
/// `to` and `module` are validated first; a malformed address yields
/// `InvalidAddress` labelled `to (target)` or `SAMM`.
#[allow(clippy::too_many_arguments)]
pub fn message_hash(
    to: &str,
    value: U256,
    data: &[u8],
    operation: Operation,
    nonce: U256,
    deadline: u64,
    module: &str,
    chain_id: u64,
) -> Result<B256> {
    let to = validate_address(to, Some("to (target)"))?;
    let module = validate_address(module, Some("SAMM"))?;

    let encoded = encode_message(
        to,
        value,
        keccak256(data),
        operation,
        nonce,
        U256::from(deadline),
        module,
        U256::from(chain_id),
    );
    Ok(keccak256(encoded))
}

/// Hash an already-typed message body for `module` on `chain_id`.
pub fn message_body_hash(body: &MessageBody, module: Address, chain_id: u64) -> B256 {
    let encoded = encode_message(
        body.to,
        body.value,
        keccak256(&body.data),
        body.operation,
        body.nonce,
        U256::from(body.deadline),
        module,
        U256::from(chain_id),
    );
    keccak256(encoded)
}

/// Transport form of a message hash, as carried in approval emails.
///
/// The digest is read as a big-endian integer and written back as its minimal
/// byte array (leading zero bytes dropped), then base64 encoded.
pub fn encode_hash_for_transport(hash: &B256) -> String {
    let first = hash.iter().position(|b| *b != 0).unwrap_or(hash.len());
    STANDARD.encode(&hash[first..])
}
