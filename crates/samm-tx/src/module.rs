//! Module lifecycle on the Safe: deploy, enable, disable.

use alloy_primitives::{address, b256, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use samm_chain::bindings::{ISafe, ISafeProxyFactory, ISAMM};
use samm_chain::Log;
use samm_crypto::salt::{deploy_salt, random_salt_nonce};
use samm_types::{validate_address, Result, SammError};

use crate::{send_with_check, SafeTransaction, SafeTxHash, SafeWallet};

/// Head of the Safe's module linked list.
pub const SENTINEL_MODULES: Address = address!("0000000000000000000000000000000000000001");

/// Topic emitted by the module on setup, carrying its address in topic 1.
pub const DEPLOY_EVENT_TOPIC: B256 =
    b256!("4f51faf6c4561ff95f067657e43439f0f856d97c04d9ec9070a6199ad418e235");

/// Attach `module` to the connected Safe.
pub async fn enable_module(wallet: &dyn SafeWallet, module: Address) -> Result<SafeTxHash> {
    let info = wallet.safe_info().await?;
    let data = ISafe::enableModuleCall { module }.abi_encode();
    tracing::info!(safe = %info.safe_address, %module, "enabling module");
    send_with_check(wallet, SafeTransaction::call(info.safe_address, data), None).await
}

/// Detach `module` from the connected Safe.
pub async fn disable_module(wallet: &dyn SafeWallet, module: &str) -> Result<SafeTxHash> {
    let module = validate_address(module, Some("Module"))?;
    let info = wallet.safe_info().await?;
    let prev_module = previous_module(&info.modules, module)?;

    let data = ISafe::disableModuleCall { prevModule: prev_module, module }.abi_encode();
    tracing::info!(safe = %info.safe_address, %module, %prev_module, "disabling module");
    send_with_check(wallet, SafeTransaction::call(info.safe_address, data), None).await
}

/// Predecessor of `module` in the Safe's module list.
pub fn previous_module(modules: &[Address], module: Address) -> Result<Address> {
    if modules.is_empty() {
        return Err(SammError::NoModules);
    }
    let index = modules
        .iter()
        .position(|m| *m == module)
        .ok_or(SammError::ModuleNotEnabled)?;
    Ok(if index == 0 { SENTINEL_MODULES } else { modules[index - 1] })
}

/// Inputs for a new module proxy.
#[derive(Debug, Clone)]
pub struct ModuleDeploymentParams {
    pub safe: Address,
    pub proxy_factory: Address,
    pub singleton: Address,
    pub members_root: U256,
    pub threshold: u64,
    pub relayer: String,
    pub dkim_registry: Address,
    /// Random when unset.
    pub salt_nonce: Option<U256>,
}

/// Transaction creating the module proxy, sent by an owner account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDeployment {
    pub salt: B256,
    pub setup_data: Bytes,
    pub transaction: SafeTransaction,
}

/// Build the proxy factory call that deploys and sets up a module for `params.safe`.
pub fn prepare_module_deployment(params: &ModuleDeploymentParams) -> ModuleDeployment {
    let salt_nonce = params.salt_nonce.unwrap_or_else(random_salt_nonce);
    let salt = deploy_salt(params.safe, salt_nonce);

    let setup_data: Bytes = ISAMM::setupCall {
        safe: params.safe,
        membersRoot: params.members_root,
        threshold: params.threshold,
        relayer: params.relayer.clone(),
        dkimRegistry: params.dkim_registry,
        txAllowances: Vec::new(),
    }
    .abi_encode()
    .into();

    let factory_data = ISafeProxyFactory::createProxyWithNonceCall {
        _singleton: params.singleton,
        initializer: setup_data.clone(),
        saltNonce: U256::from_be_bytes(salt.0),
    }
    .abi_encode();

    ModuleDeployment {
        salt,
        setup_data,
        transaction: SafeTransaction::call(params.proxy_factory, factory_data),
    }
}

/// Address of the module deployed by the transaction that produced `logs`.
pub fn find_deployed_module(logs: &[Log]) -> Result<Address> {
    if logs.is_empty() {
        return Err(SammError::EmptyLogs);
    }
    let log = logs
        .iter()
        .find(|log| log.topics.first() == Some(&DEPLOY_EVENT_TOPIC))
        .ok_or(SammError::DeployLogNotFound)?;
    let topic = log.topics.get(1).ok_or(SammError::DeployLogNotFound)?;
    Ok(Address::from_word(*topic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWallet;

    fn safe() -> Address {
        Address::repeat_byte(0x5a)
    }

    #[test]
    fn test_previous_module() {
        let a = Address::repeat_byte(0x0a);
        let b = Address::repeat_byte(0x0b);
        assert_eq!(previous_module(&[a, b], a).unwrap(), SENTINEL_MODULES);
        assert_eq!(previous_module(&[a, b], b).unwrap(), a);
        assert!(matches!(previous_module(&[], a), Err(SammError::NoModules)));
        assert!(matches!(
            previous_module(&[a], b),
            Err(SammError::ModuleNotEnabled)
        ));
    }

    #[tokio::test]
    async fn test_disable_module_targets_safe() {
        let wallet = MemoryWallet::new(safe(), 1);
        let first = Address::repeat_byte(0x0a);
        let module: Address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap();
        wallet.set_modules(vec![first, module]);

        disable_module(&wallet, "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed")
            .await
            .unwrap();
        let sent = wallet.sent();
        assert_eq!(sent[0][0].to, safe());
        let call = ISafe::disableModuleCall::abi_decode(&sent[0][0].data, true).unwrap();
        assert_eq!(call.prevModule, first);
        assert_eq!(call.module, module);
    }

    #[tokio::test]
    async fn test_disable_module_without_modules() {
        let wallet = MemoryWallet::new(safe(), 1);
        let err = disable_module(&wallet, "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No modules found");

        let err = disable_module(&wallet, "not-an-address").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid Module address");
    }

    #[tokio::test]
    async fn test_enable_module() {
        let wallet = MemoryWallet::new(safe(), 1);
        let module = Address::repeat_byte(0x0c);
        enable_module(&wallet, module).await.unwrap();

        let sent = wallet.sent();
        assert_eq!(sent[0][0].to, safe());
        assert_eq!(sent[0][0].value, U256::ZERO);
        let call = ISafe::enableModuleCall::abi_decode(&sent[0][0].data, true).unwrap();
        assert_eq!(call.module, module);
    }

    #[test]
    fn test_prepare_module_deployment() {
        let params = ModuleDeploymentParams {
            safe: "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap(),
            proxy_factory: Address::repeat_byte(0xfa),
            singleton: Address::repeat_byte(0x5e),
            members_root: U256::from(42u64),
            threshold: 2,
            relayer: "relayer@example.com".into(),
            dkim_registry: Address::repeat_byte(0xd1),
            salt_nonce: Some(U256::from(123_456_789u64)),
        };
        let deployment = prepare_module_deployment(&params);

        assert_eq!(
            deployment.salt,
            b256!("97e8c579f612f4a9a95d4ac5ef7194c7f4a3b5e0d4866df98e06405d62bfd2d8")
        );
        assert_eq!(deployment.transaction.to, params.proxy_factory);

        let call =
            ISafeProxyFactory::createProxyWithNonceCall::abi_decode(&deployment.transaction.data, true)
                .unwrap();
        assert_eq!(call._singleton, params.singleton);
        assert_eq!(call.initializer, deployment.setup_data);
        assert_eq!(call.saltNonce, U256::from_be_bytes(deployment.salt.0));

        let setup = ISAMM::setupCall::abi_decode(&deployment.setup_data, true).unwrap();
        assert_eq!(setup.safe, params.safe);
        assert_eq!(setup.threshold, 2);
        assert!(setup.txAllowances.is_empty());
    }

    #[test]
    fn test_find_deployed_module() {
        let module = Address::repeat_byte(0xcd);
        let logs = vec![
            Log {
                address: Address::repeat_byte(0x01),
                topics: vec![B256::repeat_byte(0x77)],
                data: Bytes::new(),
            },
            Log {
                address: module,
                topics: vec![DEPLOY_EVENT_TOPIC, module.into_word()],
                data: Bytes::new(),
            },
        ];
        assert_eq!(find_deployed_module(&logs).unwrap(), module);
        assert!(matches!(find_deployed_module(&[]), Err(SammError::EmptyLogs)));
        assert!(matches!(
            find_deployed_module(&logs[..1]),
            Err(SammError::DeployLogNotFound)
        ));
    }
}
