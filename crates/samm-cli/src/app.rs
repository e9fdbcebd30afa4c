//! Shared clients and session for one CLI invocation.

use std::sync::Arc;

use anyhow::{bail, Context};
use alloy_primitives::Address;
use samm_api::ApiClient;
use samm_chain::rpc_client::RpcClient;
use samm_chain::{network_label, ChainReader};
use samm_ops::{detect_safe_app, SammOps, SAFE_APP_PROBE_TIMEOUT};
use samm_store::{AuthRedirect, FileStorage, Session};
use samm_types::{validate_address, SammError};

use crate::config::Settings;
use crate::wallet::ChainWallet;

pub struct App {
    pub settings: Settings,
    pub reader: Arc<dyn ChainReader>,
    pub chain_id: u64,
    pub session: Session,
}

impl App {
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        let reader: Arc<dyn ChainReader> =
            Arc::new(RpcClient::new(&settings.rpc_url, Some(settings.request_timeout_ms)));

        let chain_id = reader.chain_id().await.context("failed to reach the node")?;
        if let Some(expected) = settings.chain_id {
            if expected != chain_id {
                bail!(
                    "node is on {} but config expects chain id {expected}",
                    network_label(chain_id)
                );
            }
        }
        tracing::debug!(chain_id, network = %network_label(chain_id), "connected");

        let storage = Arc::new(FileStorage::new(settings.session_file()?));
        let session = Session::hydrate(storage).await?;

        Ok(Self { settings, reader, chain_id, session })
    }

    /// Backend client carrying the session token, if any.
    pub fn api(&self) -> ApiClient {
        let mut api = ApiClient::new(&self.settings.api_url, Some(self.settings.request_timeout_ms));
        api.set_token(self.session.access_token().map(str::to_string));
        api
    }

    /// Module from `--module`, then config, then the selected session module.
    pub fn ops(&self, module: Option<&str>) -> anyhow::Result<SammOps> {
        let module = module
            .map(str::to_string)
            .or_else(|| self.settings.module_address.clone())
            .or_else(|| self.session.current_samm().map(|s| s.samm_address.clone()))
            .context("no module selected: pass --module, set module_address or run `samm samms use`")?;
        Ok(SammOps::new(self.reader.clone(), &module, self.chain_id)?)
    }

    pub fn safe_address(&self) -> anyhow::Result<Address> {
        let safe = self
            .settings
            .safe_address
            .clone()
            .or_else(|| self.session.current_samm().map(|s| s.safe_address.clone()))
            .context("no safe selected: set safe_address or run `samm samms use`")?;
        Ok(validate_address(&safe, Some("Safe"))?)
    }

    pub async fn wallet(&mut self) -> anyhow::Result<ChainWallet> {
        let wallet = ChainWallet::new(self.reader.clone(), self.safe_address()?, self.chain_id);
        detect_safe_app(&wallet, &mut self.session, SAFE_APP_PROBE_TIMEOUT).await;
        Ok(wallet)
    }

    /// Pass backend results through, dropping a rejected token on the way.
    pub async fn checked<T>(&mut self, result: samm_types::Result<T>) -> anyhow::Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(redirect) = self.session.handle_api_error(&err).await {
                    let hint = match redirect {
                        AuthRedirect::Authorization => "run `samm login` to sign in again",
                        AuthRedirect::Home => "reopen the Safe app to sign in again",
                    };
                    return Err(anyhow::Error::new(err).context(format!("session expired, {hint}")));
                }
                Err(err.into())
            }
        }
    }

    pub fn current_samm_id(&self) -> anyhow::Result<u64> {
        self.session
            .current_samm()
            .map(|s| s.id)
            .ok_or_else(|| SammError::Other("No SAMM data".into()).into())
    }
}
