//! Chain reads for the SAMM module.
//!
//! - Nonce and deadline sourcing for approval messages
//! - Allow-list (restriction) and allowance reads
//! - Typed setting getters
//!
//! Every read is a single round trip; provider failures surface immediately.

pub mod bindings;
pub mod memory;
pub mod rpc_client;
pub mod settings;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use samm_crypto::message::EXPIRATION_PERIOD;
use samm_types::{bytes_to_hex, validate_address, Restriction, Result, SammError};

use bindings::ISAMM;
pub use settings::SammSetting;

/// Event log as found in a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Read-only access to chain state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn latest_block_timestamp(&self) -> Result<u64>;

    /// Logs of a mined transaction, `None` while it is pending.
    async fn transaction_logs(&self, tx_hash: B256) -> Result<Option<Vec<Log>>>;
}

/// Call a view function and decode its return values.
pub async fn call_contract<C: SolCall + Send>(
    reader: &dyn ChainReader,
    to: Address,
    call: C,
) -> Result<C::Return> {
    let output = reader.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&output, true)
        .map_err(|e| SammError::Abi(format!("failed to decode {} result: {e}", C::SIGNATURE)))
}

/// Read the module's current nonce.
///
/// Any failure, including a malformed module address, is reported as
/// `NonceFetch` carrying the underlying message.
pub async fn get_nonce_from_module(reader: &dyn ChainReader, module: &str) -> Result<U256> {
    let fetch = async {
        let module = validate_address(module, Some("SAMM"))?;
        let ret = call_contract(reader, module, ISAMM::getNonceCall {}).await?;
        Ok::<_, SammError>(ret.nonce)
    };
    let nonce = fetch.await.map_err(|e| SammError::NonceFetch(e.to_string()))?;
    tracing::debug!(module, %nonce, "read module nonce");
    Ok(nonce)
}

/// Latest block timestamp plus the approval window.
pub async fn message_deadline(reader: &dyn ChainReader) -> Result<u64> {
    let now = reader.latest_block_timestamp().await?;
    now.checked_add(EXPIRATION_PERIOD)
        .ok_or_else(|| SammError::Rpc(format!("block timestamp out of range: {now}")))
}

/// Current allow-list of the module.
pub async fn get_restrictions(reader: &dyn ChainReader, module: Address) -> Result<Vec<Restriction>> {
    let ret = call_contract(reader, module, ISAMM::getAllowedTxsCall {})
        .await
        .map_err(|e| SammError::Rpc(format!("Failed to fetch restrictions: {e}")))?;

    let restrictions: Vec<Restriction> = ret
        .txs
        .into_iter()
        .map(|tx| Restriction {
            to: tx.to,
            selector: bytes_to_hex(tx.selector.as_slice()),
            allowance: tx.amount,
        })
        .collect();
    tracing::debug!(%module, count = restrictions.len(), "read module restrictions");
    Ok(restrictions)
}

/// Ether allowance the module grants to `to`.
pub async fn get_allowance(reader: &dyn ChainReader, module: Address, to: Address) -> Result<U256> {
    let ret = call_contract(reader, module, ISAMM::allowanceCall { to }).await?;
    Ok(ret.amount)
}

/// Safe the module is attached to.
pub async fn get_safe(reader: &dyn ChainReader, module: Address) -> Result<Address> {
    let ret = call_contract(reader, module, ISAMM::getSafeCall {})
        .await
        .map_err(|e| SammError::Rpc(format!("Failed to get safe: {e}")))?;
    if ret.safe.is_zero() {
        return Err(SammError::Rpc("Invalid safe address returned".into()));
    }
    Ok(ret.safe)
}

/// Read a setting and render it as a string.
///
/// Addresses come back checksummed, numbers in decimal.
pub async fn get_samm_setting(
    reader: &dyn ChainReader,
    module: Address,
    setting: SammSetting,
) -> Result<String> {
    let value = match setting {
        SammSetting::Relayer => call_contract(reader, module, ISAMM::getRelayerCall {}).await?.relayer,
        SammSetting::Threshold => call_contract(reader, module, ISAMM::getThresholdCall {})
            .await?
            .threshold
            .to_string(),
        SammSetting::DkimRegistry => call_contract(reader, module, ISAMM::getDKIMRegistryCall {})
            .await?
            .dkimRegistry
            .to_checksum(None),
        SammSetting::MembersRoot => call_contract(reader, module, ISAMM::getMembersRootCall {})
            .await?
            .membersRoot
            .to_string(),
    };
    Ok(value)
}

/// Network name as used by common Ethereum tooling.
pub fn network_name(chain_id: u64) -> Option<&'static str> {
    let name = match chain_id {
        1 => "mainnet",
        10 => "optimism",
        56 => "bnb",
        100 => "xdai",
        137 => "matic",
        8453 => "base",
        17000 => "holesky",
        42161 => "arbitrum",
        11155111 => "sepolia",
        _ => return None,
    };
    Some(name)
}

/// Network name, or a placeholder naming the unknown chain id.
pub fn network_label(chain_id: u64) -> String {
    network_name(chain_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Network (chainId: {chain_id})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::TxAllowance;
    use crate::memory::MemoryChain;
    use alloy_sol_types::SolValue;

    const MODULE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    fn module() -> Address {
        MODULE.parse().unwrap()
    }

    #[tokio::test]
    async fn test_get_nonce_from_module() {
        let chain = MemoryChain::new(11155111);
        chain.respond::<ISAMM::getNonceCall>(module(), (U256::from(12u64),).abi_encode_params());

        let nonce = get_nonce_from_module(&chain, MODULE).await.unwrap();
        assert_eq!(nonce, U256::from(12u64));
    }

    #[tokio::test]
    async fn test_nonce_failure_is_wrapped() {
        let chain = MemoryChain::new(1);
        chain.fail::<ISAMM::getNonceCall>(module(), "connection refused");

        let err = get_nonce_from_module(&chain, MODULE).await.unwrap_err();
        assert!(matches!(err, SammError::NonceFetch(_)));
        assert!(err.to_string().starts_with("Failed to get nonce:"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_nonce_rejects_bad_module_address() {
        let chain = MemoryChain::new(1);
        let err = get_nonce_from_module(&chain, "0x1234").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get nonce: Invalid SAMM address");
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_message_deadline_adds_seven_days() {
        let chain = MemoryChain::new(1);
        chain.set_block_timestamp(1_700_000_000);
        assert_eq!(message_deadline(&chain).await.unwrap(), 1_700_604_800);
    }

    #[tokio::test]
    async fn test_message_deadline_rejects_overflowing_timestamp() {
        let chain = MemoryChain::new(1);
        chain.set_block_timestamp(u64::MAX - 10);
        let err = message_deadline(&chain).await.unwrap_err();
        assert!(matches!(err, SammError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_get_restrictions_decodes_entries() {
        let chain = MemoryChain::new(1);
        let entries = vec![
            TxAllowance {
                to: Address::repeat_byte(0xaa),
                selector: [0xa9, 0x05, 0x9c, 0xbb].into(),
                amount: U256::ZERO,
            },
            TxAllowance {
                to: Address::repeat_byte(0xbb),
                selector: [0, 0, 0, 0].into(),
                amount: U256::from(5u64),
            },
        ];
        chain.respond::<ISAMM::getAllowedTxsCall>(module(), (entries,).abi_encode_params());

        let restrictions = get_restrictions(&chain, module()).await.unwrap();
        assert_eq!(restrictions.len(), 2);
        assert_eq!(restrictions[0].selector, "0xa9059cbb");
        assert_eq!(restrictions[1].selector, "0x00000000");
        assert_eq!(restrictions[1].allowance, U256::from(5u64));
    }

    #[tokio::test]
    async fn test_get_samm_setting_renders_strings() {
        let chain = MemoryChain::new(1);
        chain.respond::<ISAMM::getThresholdCall>(module(), (3u64,).abi_encode_params());
        chain.respond::<ISAMM::getRelayerCall>(module(), ("relayer@example.com".to_string(),).abi_encode_params());

        assert_eq!(get_samm_setting(&chain, module(), SammSetting::Threshold).await.unwrap(), "3");
        assert_eq!(
            get_samm_setting(&chain, module(), SammSetting::Relayer).await.unwrap(),
            "relayer@example.com"
        );
    }

    #[tokio::test]
    async fn test_get_safe_rejects_zero_address() {
        let chain = MemoryChain::new(1);
        chain.respond::<ISAMM::getSafeCall>(module(), (Address::ZERO,).abi_encode_params());
        assert!(get_safe(&chain, module()).await.is_err());
    }

    #[test]
    fn test_network_names() {
        assert_eq!(network_name(1), Some("mainnet"));
        assert_eq!(network_label(11155111), "sepolia");
        assert_eq!(network_label(9999), "Unknown Network (chainId: 9999)");
    }
}
