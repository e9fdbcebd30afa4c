//! Module configuration writes, each guarded by an optimistic check.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use samm_chain::bindings::{TxAllowance, ISAMM};
use samm_chain::{ChainReader, SammSetting};
use samm_types::{bytes_to_hex, parse_selector, Result};

use crate::check::{AllowanceCheck, RestrictionCheck, ValueChangeCheck};
use crate::{send_with_check, SafeTransaction, SafeTxHash, SafeWallet};

/// Grant or revoke an allow-list entry.
///
/// Granting an entry that already exists fails with `DuplicateRestriction`;
/// revoking a missing one fails with `RestrictionNotFound`.
#[allow(clippy::too_many_arguments)]
pub async fn set_tx_allowed(
    wallet: &dyn SafeWallet,
    reader: &dyn ChainReader,
    module: Address,
    to: Address,
    selector: &str,
    amount: U256,
    is_allowed: bool,
) -> Result<SafeTxHash> {
    let selector = parse_selector(selector)?;
    let data = ISAMM::setTxAllowedCall {
        txAllowance: TxAllowance { to, selector, amount },
        isAllowed: is_allowed,
    }
    .abi_encode();

    let check = RestrictionCheck {
        reader,
        module,
        to,
        selector: bytes_to_hex(selector.as_slice()),
        is_allowed,
    };
    tracing::info!(%module, %to, %selector, is_allowed, "updating restriction");
    send_with_check(wallet, SafeTransaction::call(module, data), Some(&check)).await
}

/// Set the ether allowance for `to`. Fails with `NoOpChange` when unchanged.
pub async fn set_allowance(
    wallet: &dyn SafeWallet,
    reader: &dyn ChainReader,
    module: Address,
    to: Address,
    amount: U256,
) -> Result<SafeTxHash> {
    let data = ISAMM::setAllowanceCall { to, amount }.abi_encode();
    let check = AllowanceCheck { reader, module, to, amount };
    tracing::info!(%module, %to, %amount, "updating allowance");
    send_with_check(wallet, SafeTransaction::call(module, data), Some(&check)).await
}

/// Change a module setting.
///
/// `current_value` is the value the caller last saw, compared as a string.
pub async fn set_samm_settings(
    wallet: &dyn SafeWallet,
    module: Address,
    setting: SammSetting,
    new_value: &str,
    current_value: &str,
) -> Result<SafeTxHash> {
    let data = setting.setter_calldata(new_value)?;
    let check = ValueChangeCheck { new_value, current_value };
    tracing::info!(%module, %setting, new_value, "updating setting");
    send_with_check(wallet, SafeTransaction::call(module, data), Some(&check)).await
}
