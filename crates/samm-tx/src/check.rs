//! Pre-submit checks against a snapshot of chain state.
//!
//! A check reads state once and compares; the state can change before the
//! Safe transaction executes, so a passing check does not guarantee the
//! write is still meaningful. The contract has the final word.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use samm_chain::{get_allowance, get_restrictions, ChainReader};
use samm_types::{Result, SammError};

use crate::{SafeTransaction, SafeTxHash, SafeWallet};

/// Best-effort validation run right before submission.
#[async_trait]
pub trait OptimisticCheck: Send + Sync {
    async fn verify(&self) -> Result<()>;
}

/// Grant must not duplicate an entry; revoke must hit an existing one.
pub struct RestrictionCheck<'a> {
    pub reader: &'a dyn ChainReader,
    pub module: Address,
    pub to: Address,
    pub selector: String,
    pub is_allowed: bool,
}

#[async_trait]
impl OptimisticCheck for RestrictionCheck<'_> {
    async fn verify(&self) -> Result<()> {
        let current = get_restrictions(self.reader, self.module).await?;
        let exists = current.iter().any(|r| r.matches(&self.to, &self.selector));
        match (self.is_allowed, exists) {
            (true, true) => Err(SammError::DuplicateRestriction),
            (false, false) => Err(SammError::RestrictionNotFound),
            _ => Ok(()),
        }
    }
}

/// New allowance must differ from the one on chain.
pub struct AllowanceCheck<'a> {
    pub reader: &'a dyn ChainReader,
    pub module: Address,
    pub to: Address,
    pub amount: U256,
}

#[async_trait]
impl OptimisticCheck for AllowanceCheck<'_> {
    async fn verify(&self) -> Result<()> {
        let current = get_allowance(self.reader, self.module, self.to).await?;
        if current == self.amount {
            return Err(SammError::NoOpChange);
        }
        Ok(())
    }
}

/// New value must differ from the caller-supplied current value.
pub struct ValueChangeCheck<'a> {
    pub new_value: &'a str,
    pub current_value: &'a str,
}

#[async_trait]
impl OptimisticCheck for ValueChangeCheck<'_> {
    async fn verify(&self) -> Result<()> {
        if self.new_value == self.current_value {
            return Err(SammError::NoOpChange);
        }
        Ok(())
    }
}

/// Run `check` (if any), then propose `tx` as a single-transaction batch.
pub async fn send_with_check(
    wallet: &dyn SafeWallet,
    tx: SafeTransaction,
    check: Option<&dyn OptimisticCheck>,
) -> Result<SafeTxHash> {
    send_batch_with_check(wallet, &[tx], check).await
}

/// Run `check` (if any), then propose every transaction in one batch.
pub async fn send_batch_with_check(
    wallet: &dyn SafeWallet,
    txs: &[SafeTransaction],
    check: Option<&dyn OptimisticCheck>,
) -> Result<SafeTxHash> {
    if let Some(check) = check {
        check.verify().await?;
    }
    let hash = wallet.send_transactions(txs).await?;
    tracing::info!(count = txs.len(), safe_tx_hash = %hash, "proposed safe transaction");
    Ok(hash)
}
