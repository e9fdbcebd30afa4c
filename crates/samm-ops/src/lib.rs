//! End-to-end operations for a selected SAMM module.
//!
//! Coordinates chain reads, message hashing, the wallet shell and the
//! backend to build approval messages and change module configuration.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use samm_api::{ApiClient, MembersBackend, OwnerTokenRequest};
use samm_chain::{get_nonce_from_module, get_samm_setting, message_deadline, ChainReader, SammSetting};
use samm_crypto::authorization::{authorization_request_hash, ensure_owner};
use samm_crypto::message::{encode_hash_for_transport, message_body_hash};
use samm_store::Session;
use samm_tx::guards::{set_samm_settings, set_tx_allowed};
use samm_tx::{SafeTxHash, SafeWallet};
use samm_types::{
    parse_u256, validate_address, Member, Message, MessageBody, Operation, Restriction, Result, SammData,
    SammError,
};

pub mod call;
pub mod members;
pub mod probe;

pub use call::{encode_call, parse_ether, restriction_request, EncodedCall, RestrictionForm, RestrictionRequest};
pub use members::{parse_member_emails, remove_member_email};
pub use probe::{detect_safe_app, SAFE_APP_PROBE_TIMEOUT};

/// Owner authorization ready to be signed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub signer: Address,
    pub module: Address,
    pub time: u64,
    pub chain_id: u64,
    pub hash: B256,
}

impl AuthorizationRequest {
    /// Token request carrying the wallet's signature over `hash`.
    pub fn token_request(&self, signature: &str, name: Option<String>) -> OwnerTokenRequest {
        OwnerTokenRequest {
            owner_address: self.signer.to_string().to_lowercase(),
            samm_address: self.module.to_string().to_lowercase(),
            chain_id: self.chain_id,
            timestamp: self.time,
            signature: signature.to_string(),
            name,
        }
    }
}

/// Result of a member list change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersUpdate {
    /// Emails now making up the members root.
    pub emails: Vec<String>,
    /// Active members as recorded by the backend.
    pub members: Vec<Member>,
    pub safe_tx_hash: SafeTxHash,
}

/// Operations engine bound to one module on one chain.
pub struct SammOps {
    reader: Arc<dyn ChainReader>,
    module: Address,
    chain_id: u64,
}

impl SammOps {
    pub fn new(reader: Arc<dyn ChainReader>, module: &str, chain_id: u64) -> Result<Self> {
        let module = validate_address(module, Some("SAMM"))?;
        Ok(Self { reader, module, chain_id })
    }

    /// Engine for the module selected in `session`.
    pub fn from_session(reader: Arc<dyn ChainReader>, session: &Session) -> Result<Self> {
        let samm: &SammData = session
            .current_samm()
            .ok_or_else(|| SammError::Other("No SAMM data".into()))?;
        Self::new(reader, &samm.samm_address, samm.chain_id)
    }

    pub fn module(&self) -> Address {
        self.module
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn reader(&self) -> &dyn ChainReader {
        self.reader.as_ref()
    }

    /// Build the approval message for a CALL to `to`.
    ///
    /// Reads the module nonce and the latest block; the deadline is the block
    /// timestamp plus the approval window.
    pub async fn generate_message(&self, to: &str, value: U256, data: &[u8]) -> Result<Message> {
        let target = validate_address(to, Some("to (target)"))?;
        let module = self.module.to_string();
        let nonce = get_nonce_from_module(self.reader(), &module).await?;
        let deadline = message_deadline(self.reader()).await?;

        let body = MessageBody {
            to: target,
            value,
            data: data.to_vec().into(),
            operation: Operation::Call,
            nonce,
            deadline,
        };
        let hash = message_body_hash(&body, self.module, self.chain_id);
        tracing::info!(%hash, %nonce, deadline, "generated approval message");

        Ok(Message {
            msg_hash: encode_hash_for_transport(&hash),
            calldata: body,
        })
    }

    pub async fn restrictions(&self) -> Result<Vec<Restriction>> {
        samm_chain::get_restrictions(self.reader(), self.module).await
    }

    pub async fn setting(&self, setting: SammSetting) -> Result<String> {
        get_samm_setting(self.reader(), self.module, setting).await
    }

    /// Propose a new allow-list entry built from `form`.
    pub async fn add_restriction(&self, wallet: &dyn SafeWallet, form: &RestrictionForm) -> Result<SafeTxHash> {
        let req = restriction_request(form)?;
        set_tx_allowed(wallet, self.reader(), self.module, req.to, &req.selector, req.amount, true).await
    }

    /// Propose removal of an existing allow-list entry.
    pub async fn remove_restriction(&self, wallet: &dyn SafeWallet, restriction: &Restriction) -> Result<SafeTxHash> {
        set_tx_allowed(
            wallet,
            self.reader(),
            self.module,
            restriction.to,
            &restriction.selector,
            restriction.allowance,
            false,
        )
        .await
    }

    /// Propose a setting change, compared against the value on chain.
    pub async fn update_setting(
        &self,
        wallet: &dyn SafeWallet,
        setting: SammSetting,
        new_value: &str,
    ) -> Result<SafeTxHash> {
        let current = self.setting(setting).await?;
        set_samm_settings(wallet, self.module, setting, new_value, &current).await
    }

    /// Recompute the members root for `emails` and propose it.
    pub async fn update_members_root(
        &self,
        wallet: &dyn SafeWallet,
        backend: &dyn MembersBackend,
        emails: &[String],
    ) -> Result<SafeTxHash> {
        let root = backend.members_root(emails).await?;
        self.apply_members_root(wallet, &root).await
    }

    /// Add the comma-separated emails in `input` to the `existing` members.
    ///
    /// The backend list is replaced first; the new root is proposed only once
    /// the backend accepted it.
    pub async fn add_members(
        &self,
        wallet: &dyn SafeWallet,
        backend: &dyn MembersBackend,
        samm_id: u64,
        existing: &[String],
        input: &str,
    ) -> Result<MembersUpdate> {
        let new_emails = parse_member_emails(input, existing)?;
        let emails: Vec<String> = existing.iter().cloned().chain(new_emails).collect();
        self.replace_members(wallet, backend, samm_id, emails).await
    }

    /// Drop `email` from the `existing` members, then propose the new root.
    pub async fn remove_member(
        &self,
        wallet: &dyn SafeWallet,
        backend: &dyn MembersBackend,
        samm_id: u64,
        existing: &[String],
        email: &str,
    ) -> Result<MembersUpdate> {
        let emails = remove_member_email(existing, email)?;
        self.replace_members(wallet, backend, samm_id, emails).await
    }

    async fn replace_members(
        &self,
        wallet: &dyn SafeWallet,
        backend: &dyn MembersBackend,
        samm_id: u64,
        emails: Vec<String>,
    ) -> Result<MembersUpdate> {
        let mut members = backend.update_members(samm_id, &emails).await?;
        members.retain(|m| m.is_active);
        tracing::info!(samm_id, count = emails.len(), "member list updated");

        let safe_tx_hash = self.update_members_root(wallet, backend, &emails).await?;
        Ok(MembersUpdate { emails, members, safe_tx_hash })
    }

    /// Propose `root`, given as decimal or hex, as the new members root.
    pub async fn apply_members_root(&self, wallet: &dyn SafeWallet, root: &str) -> Result<SafeTxHash> {
        let root = parse_u256(root).map_err(|_| SammError::InvalidSettingValue {
            setting: SammSetting::MembersRoot.label().to_string(),
            value: root.to_string(),
        })?;
        self.update_setting(wallet, SammSetting::MembersRoot, &root.to_string())
            .await
    }

    /// Record the new threshold with the backend, then propose it on chain.
    pub async fn update_threshold(
        &self,
        wallet: &dyn SafeWallet,
        api: &ApiClient,
        samm_id: u64,
        value: &str,
    ) -> Result<SafeTxHash> {
        let threshold = parse_threshold(value)?;
        api.update_samm(samm_id, threshold, true).await?;
        self.update_setting(wallet, SammSetting::Threshold, &threshold.to_string())
            .await
    }

    /// Relayer email, read once and cached in the session.
    pub async fn load_relayer(&self, session: &mut Session) -> Result<String> {
        if let Some(relayer) = session.relayer() {
            return Ok(relayer.to_string());
        }
        let relayer = self.setting(SammSetting::Relayer).await?;
        session.set_relayer(relayer.clone());
        Ok(relayer)
    }

    /// Typed data an owner signs to obtain a backend token.
    ///
    /// `signer` must be an owner of the connected Safe.
    pub async fn authorization_request(
        &self,
        wallet: &dyn SafeWallet,
        signer: Address,
        version: &str,
    ) -> Result<AuthorizationRequest> {
        let info = wallet.safe_info().await?;
        ensure_owner(&info.owners, &signer)?;
        let time = self.reader.latest_block_timestamp().await?;
        let hash = authorization_request_hash(signer, self.module, time, self.chain_id, version);
        Ok(AuthorizationRequest {
            signer,
            module: self.module,
            time,
            chain_id: self.chain_id,
            hash,
        })
    }
}

fn parse_threshold(value: &str) -> Result<u64> {
    let invalid = || SammError::InvalidSettingValue {
        setting: SammSetting::Threshold.label().to_string(),
        value: value.to_string(),
    };
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(threshold) => Ok(threshold),
    }
}
