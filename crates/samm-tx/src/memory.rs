//! In-memory wallet shell for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use alloy_primitives::{Address, U256};
use samm_crypto::keccak256;
use samm_types::Result;

use crate::{SafeInfo, SafeTransaction, SafeTxHash, SafeWallet};

/// Records proposed batches instead of forwarding them to owners.
pub struct MemoryWallet {
    info: Mutex<SafeInfo>,
    sent: Mutex<Vec<Vec<SafeTransaction>>>,
}

impl MemoryWallet {
    pub fn new(safe_address: Address, chain_id: u64) -> Self {
        Self::with_info(SafeInfo {
            safe_address,
            chain_id,
            owners: Vec::new(),
            threshold: 1,
            modules: Vec::new(),
        })
    }

    pub fn with_info(info: SafeInfo) -> Self {
        Self {
            info: Mutex::new(info),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_modules(&self, modules: Vec<Address>) {
        self.info.lock().unwrap().modules = modules;
    }

    pub fn set_owners(&self, owners: Vec<Address>) {
        self.info.lock().unwrap().owners = owners;
    }

    /// Every batch proposed so far, oldest first.
    pub fn sent(&self) -> Vec<Vec<SafeTransaction>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SafeWallet for MemoryWallet {
    async fn safe_info(&self) -> Result<SafeInfo> {
        Ok(self.info.lock().unwrap().clone())
    }

    async fn send_transactions(&self, txs: &[SafeTransaction]) -> Result<SafeTxHash> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(txs.to_vec());
        let index = U256::from(sent.len());
        Ok(keccak256(index.to_be_bytes::<32>()))
    }
}
