//! In-memory chain reader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use samm_types::{Result, SammError};

use crate::{ChainReader, Log};

type CallKey = (Address, [u8; 4]);

/// Canned responses keyed by contract address and function selector.
///
/// Responses registered for exact calldata take precedence over the
/// per-selector ones.
pub struct MemoryChain {
    chain_id: u64,
    block_timestamp: Mutex<u64>,
    responses: Mutex<HashMap<CallKey, std::result::Result<Bytes, String>>>,
    exact: Mutex<HashMap<(Address, Bytes), Bytes>>,
    receipts: Mutex<HashMap<B256, Vec<Log>>>,
    calls: Mutex<Vec<(Address, Bytes)>>,
}

impl MemoryChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block_timestamp: Mutex::new(0),
            responses: Mutex::new(HashMap::new()),
            exact: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer calls of `C` on `to` with ABI-encoded return data.
    pub fn respond<C: SolCall>(&self, to: Address, output: impl Into<Bytes>) {
        self.responses
            .lock()
            .unwrap()
            .insert((to, C::SELECTOR), Ok(output.into()));
    }

    /// Answer exactly `call` on `to`, arguments included.
    pub fn respond_call<C: SolCall>(&self, to: Address, call: &C, output: impl Into<Bytes>) {
        self.exact
            .lock()
            .unwrap()
            .insert((to, call.abi_encode().into()), output.into());
    }

    /// Make calls of `C` on `to` fail with `message`.
    pub fn fail<C: SolCall>(&self, to: Address, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert((to, C::SELECTOR), Err(message.to_string()));
    }

    pub fn set_block_timestamp(&self, timestamp: u64) {
        *self.block_timestamp.lock().unwrap() = timestamp;
    }

    pub fn add_receipt(&self, tx_hash: B256, logs: Vec<Log>) {
        self.receipts.lock().unwrap().insert(tx_hash, logs);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainReader for MemoryChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.calls.lock().unwrap().push((to, data.clone()));
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| SammError::Rpc("calldata shorter than a selector".into()))?;

        if let Some(output) = self.exact.lock().unwrap().get(&(to, data.clone())) {
            return Ok(output.clone());
        }

        let responses = self.responses.lock().unwrap();
        match responses.get(&(to, selector)) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(SammError::Rpc(message.clone())),
            None => Err(SammError::Rpc("execution reverted".into())),
        }
    }

    async fn latest_block_timestamp(&self) -> Result<u64> {
        Ok(*self.block_timestamp.lock().unwrap())
    }

    async fn transaction_logs(&self, tx_hash: B256) -> Result<Option<Vec<Log>>> {
        Ok(self.receipts.lock().unwrap().get(&tx_hash).cloned())
    }
}
