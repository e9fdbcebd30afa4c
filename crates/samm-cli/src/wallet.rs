//! Read-only Safe wallet for the terminal.
//!
//! Safe state comes from the node. Proposed batches are printed as JSON for
//! import into a Safe transaction builder instead of being signed here.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use samm_chain::bindings::ISafe;
use samm_chain::{call_contract, ChainReader};
use samm_crypto::keccak256;
use samm_tx::module::SENTINEL_MODULES;
use samm_tx::{SafeInfo, SafeTransaction, SafeTxHash, SafeWallet};
use samm_types::{Result, SammError};

const MODULE_PAGE_SIZE: u64 = 50;

pub struct ChainWallet {
    reader: Arc<dyn ChainReader>,
    safe: Address,
    chain_id: u64,
}

impl ChainWallet {
    pub fn new(reader: Arc<dyn ChainReader>, safe: Address, chain_id: u64) -> Self {
        Self { reader, safe, chain_id }
    }

    async fn modules(&self) -> Result<Vec<Address>> {
        let mut modules = Vec::new();
        let mut start = SENTINEL_MODULES;
        loop {
            let page = call_contract(
                self.reader.as_ref(),
                self.safe,
                ISafe::getModulesPaginatedCall {
                    start,
                    pageSize: U256::from(MODULE_PAGE_SIZE),
                },
            )
            .await?;
            modules.extend(page.array);
            if page.next.is_zero() || page.next == SENTINEL_MODULES {
                return Ok(modules);
            }
            start = page.next;
        }
    }
}

#[async_trait]
impl SafeWallet for ChainWallet {
    async fn safe_info(&self) -> Result<SafeInfo> {
        let owners = call_contract(self.reader.as_ref(), self.safe, ISafe::getOwnersCall {})
            .await?
            .owners;
        let threshold = call_contract(self.reader.as_ref(), self.safe, ISafe::getThresholdCall {})
            .await?
            .threshold;
        Ok(SafeInfo {
            safe_address: self.safe,
            chain_id: self.chain_id,
            owners,
            threshold: threshold.saturating_to::<u64>(),
            modules: self.modules().await?,
        })
    }

    /// Print the batch; the returned hash identifies the printed batch only.
    async fn send_transactions(&self, txs: &[SafeTransaction]) -> Result<SafeTxHash> {
        let batch = serde_json::json!({
            "chainId": self.chain_id.to_string(),
            "safeAddress": self.safe,
            "transactions": txs,
        });
        let rendered = serde_json::to_string_pretty(&batch)
            .map_err(|e| SammError::Other(format!("failed to render batch: {e}")))?;
        println!("{rendered}");
        Ok(keccak256(rendered.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;
    use samm_chain::memory::MemoryChain;

    fn page(start: Address) -> ISafe::getModulesPaginatedCall {
        ISafe::getModulesPaginatedCall {
            start,
            pageSize: U256::from(MODULE_PAGE_SIZE),
        }
    }

    #[tokio::test]
    async fn test_safe_info_walks_module_pages() {
        let safe = Address::repeat_byte(0x5a);
        let owner = Address::repeat_byte(0x0a);
        let modules = [Address::repeat_byte(0x11), Address::repeat_byte(0x22), Address::repeat_byte(0x33)];

        let chain = Arc::new(MemoryChain::new(11155111));
        chain.respond::<ISafe::getOwnersCall>(safe, (vec![owner],).abi_encode_params());
        chain.respond::<ISafe::getThresholdCall>(safe, (U256::from(1u64),).abi_encode_params());
        chain.respond_call(
            safe,
            &page(SENTINEL_MODULES),
            (vec![modules[0], modules[1]], modules[1]).abi_encode_params(),
        );
        chain.respond_call(safe, &page(modules[1]), (vec![modules[2]], SENTINEL_MODULES).abi_encode_params());

        let wallet = ChainWallet::new(chain.clone(), safe, 11155111);
        let info = wallet.safe_info().await.unwrap();

        assert_eq!(info.safe_address, safe);
        assert_eq!(info.chain_id, 11155111);
        assert_eq!(info.owners, vec![owner]);
        assert_eq!(info.threshold, 1);
        assert_eq!(info.modules, modules.to_vec());
        // owners, threshold, two module pages
        assert_eq!(chain.call_count(), 4);
    }

    #[tokio::test]
    async fn test_safe_info_without_modules() {
        let safe = Address::repeat_byte(0x5a);
        let chain = Arc::new(MemoryChain::new(1));
        chain.respond::<ISafe::getOwnersCall>(safe, (vec![Address::repeat_byte(0x0a)],).abi_encode_params());
        chain.respond::<ISafe::getThresholdCall>(safe, (U256::from(1u64),).abi_encode_params());
        chain.respond_call(
            safe,
            &page(SENTINEL_MODULES),
            (Vec::<Address>::new(), SENTINEL_MODULES).abi_encode_params(),
        );

        let info = ChainWallet::new(chain, safe, 1).safe_info().await.unwrap();
        assert!(info.modules.is_empty());
    }

    #[tokio::test]
    async fn test_send_transactions_hash_depends_on_batch() {
        let chain = Arc::new(MemoryChain::new(1));
        let wallet = ChainWallet::new(chain, Address::repeat_byte(0x5a), 1);
        let a = SafeTransaction::call(Address::repeat_byte(0x01), vec![1u8]);
        let b = SafeTransaction::call(Address::repeat_byte(0x02), vec![2u8]);

        let first = wallet.send_transactions(&[a.clone()]).await.unwrap();
        assert_eq!(first, wallet.send_transactions(&[a]).await.unwrap());
        assert_ne!(first, wallet.send_transactions(&[b]).await.unwrap());
    }
}
