//! Safe transaction builders and submission.
//!
//! - `SafeWallet` seam for the hosting wallet shell
//! - Optimistic pre-submit checks (`check`)
//! - Restriction, allowance and setting writes (`guards`)
//! - Module enable/disable/deploy payloads (`module`)

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use samm_types::{dec_u256, Result};

pub mod check;
pub mod guards;
pub mod memory;
pub mod module;

pub use check::{send_batch_with_check, send_with_check, OptimisticCheck};

/// Hash the wallet shell assigns to a proposed Safe transaction.
pub type SafeTxHash = B256;

/// Base transaction as understood by the wallet shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransaction {
    pub to: Address,
    #[serde(with = "dec_u256")]
    pub value: U256,
    pub data: Bytes,
}

impl SafeTransaction {
    /// Zero-value contract call.
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self { to, value: U256::ZERO, data: data.into() }
    }
}

/// Safe the shell is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeInfo {
    pub safe_address: Address,
    pub chain_id: u64,
    pub owners: Vec<Address>,
    pub threshold: u64,
    /// Enabled modules in the Safe's linked-list order.
    #[serde(default)]
    pub modules: Vec<Address>,
}

/// Wallet shell hosting the Safe. Signing and collecting owner
/// confirmations happen on its side.
#[async_trait]
pub trait SafeWallet: Send + Sync {
    async fn safe_info(&self) -> Result<SafeInfo>;

    /// Propose `txs` as one Safe batch.
    async fn send_transactions(&self, txs: &[SafeTransaction]) -> Result<SafeTxHash>;
}
