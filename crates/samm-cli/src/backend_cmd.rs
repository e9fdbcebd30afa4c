use alloy_primitives::Address;
use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;
use samm_api::Page;
use samm_crypto::message::EXPIRATION_PERIOD;
use samm_types::{DbTransactionStatus, SendingSammData};

use crate::app::App;
use crate::print_json;

#[derive(Subcommand)]
pub enum LoginCmd {
    /// Member login with backend credentials
    Member {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SAMM_PASSWORD")]
        password: String,
    },
    /// Owner login with a signed authorization request (see `samm authorize`)
    Owner {
        /// Owner account that signed the request
        #[arg(long)]
        signer: Address,
        /// Block timestamp printed by `samm authorize`
        #[arg(long)]
        time: u64,
        /// EIP-712 signature over the request hash
        #[arg(long)]
        signature: String,
        /// Display name for the module
        #[arg(long)]
        name: Option<String>,
    },
}

impl LoginCmd {
    pub async fn run(self, app: &mut App, module: Option<&str>) -> anyhow::Result<()> {
        let token = match self {
            LoginCmd::Member { username, password } => {
                app.api().member_token(&username, &password).await?
            }
            LoginCmd::Owner { signer, time, signature, name } => {
                let ops = app.ops(module)?;
                let request = samm_api::OwnerTokenRequest {
                    owner_address: signer.to_string().to_lowercase(),
                    samm_address: ops.module().to_string().to_lowercase(),
                    chain_id: app.chain_id,
                    timestamp: time,
                    signature,
                    name,
                };
                app.api().owner_token(&request).await?
            }
        };
        app.session.login(&token.access_token).await?;

        let samms = app.checked(app.api().user_samms().await).await?;
        let (active, disabled): (Vec<_>, Vec<_>) = samms.into_iter().partition(|s| s.is_active);
        if app.session.current_samm().is_none() {
            app.session.set_current_samm(active.first().cloned()).await?;
        }
        println!("logged in, {} active and {} disabled modules", active.len(), disabled.len());
        app.session.set_user_samms(active).await?;
        app.session.set_disabled_samms(disabled).await?;
        Ok(())
    }
}

/// Print the typed-data hash an owner signs to log in.
pub async fn authorize(app: &mut App, module: Option<&str>, signer: Address) -> anyhow::Result<()> {
    let ops = app.ops(module)?;
    let version = app.settings.authorization_version.clone();
    let request = ops.authorization_request(&app.wallet().await?, signer, &version).await?;
    print_json(&json!({
        "signer": request.signer,
        "module": request.module,
        "time": request.time,
        "chainId": request.chain_id,
        "hash": request.hash,
    }))
}

#[derive(Subcommand)]
pub enum SammsCmd {
    /// Modules available to the logged-in user
    Mine,
    /// Modules registered for the configured Safe
    BySafe,
    /// Select the module later commands act on
    Use { id: u64 },
    /// Register a deployed module with the backend
    Register {
        module: String,
        #[arg(long)]
        threshold: u64,
        /// Members root returned by `samm module deploy`
        #[arg(long)]
        root: String,
    },
    /// Deactivate a module in the backend
    Deactivate { id: u64 },
}

impl SammsCmd {
    pub async fn run(self, app: &mut App) -> anyhow::Result<()> {
        match self {
            SammsCmd::Mine => {
                let samms = app.checked(app.api().user_samms().await).await?;
                print_json(&samms)
            }
            SammsCmd::BySafe => {
                let safe = app.safe_address()?.to_checksum(None);
                let samms = app.api().samms_by_safe(&safe, app.chain_id).await?;
                print_json(&samms)
            }
            SammsCmd::Use { id } => {
                let samm = app
                    .session
                    .user_samms()
                    .iter()
                    .find(|s| s.id == id)
                    .cloned()
                    .with_context(|| format!("module {id} is not among your active modules"))?;
                println!("using {} ({})", samm.samm_address, samm.name);
                app.session.set_current_samm(Some(samm)).await?;
                Ok(())
            }
            SammsCmd::Register { module, threshold, root } => {
                let module = samm_types::validate_address(&module, Some("SAMM"))?;
                let data = SendingSammData {
                    root,
                    chain_id: app.chain_id,
                    threshold,
                    samm_address: module.to_checksum(None),
                    safe_address: app.safe_address()?.to_checksum(None),
                    expiration_period: EXPIRATION_PERIOD,
                };
                let samm = app.api().create_samm(&data).await?;
                print_json(&samm)
            }
            SammsCmd::Deactivate { id } => {
                app.checked(app.api().delete_samm(id).await).await?;
                if app.session.current_samm().is_some_and(|s| s.id == id) {
                    app.session.set_current_samm(None).await?;
                }
                println!("module {id} deactivated");
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum MembersCmd {
    /// List active members of the selected module
    List,
    /// Add members and propose the new members root
    Add {
        /// Comma-separated email addresses
        emails: String,
    },
    /// Remove a member and propose the new members root
    Remove { email: String },
}

impl MembersCmd {
    pub async fn run(self, app: &mut App, module: Option<&str>) -> anyhow::Result<()> {
        let samm_id = app.current_samm_id()?;
        let members = app.checked(app.api().members(samm_id, Page::default()).await).await?;
        let existing: Vec<String> = members.iter().map(|m| m.email.clone()).collect();

        let update = match self {
            MembersCmd::List => return print_json(&members),
            MembersCmd::Add { emails } => {
                let ops = app.ops(module)?;
                let wallet = app.wallet().await?;
                app.checked(ops.add_members(&wallet, &app.api(), samm_id, &existing, &emails).await)
                    .await?
            }
            MembersCmd::Remove { email } => {
                let ops = app.ops(module)?;
                let wallet = app.wallet().await?;
                app.checked(ops.remove_member(&wallet, &app.api(), samm_id, &existing, &email).await)
                    .await?
            }
        };
        print_json(&json!({
            "members": update.emails,
            "safeTxHash": update.safe_tx_hash,
        }))
    }
}

/// Record a new threshold with the backend and propose it on chain.
pub async fn threshold(app: &mut App, module: Option<&str>, value: &str) -> anyhow::Result<()> {
    let samm_id = app.current_samm_id()?;
    let ops = app.ops(module)?;
    let wallet = app.wallet().await?;
    let hash = app
        .checked(ops.update_threshold(&wallet, &app.api(), samm_id, value).await)
        .await?;
    print_json(&json!({ "safeTxHash": hash }))
}

pub async fn transactions(
    app: &mut App,
    status: Option<DbTransactionStatus>,
    page: Page,
) -> anyhow::Result<()> {
    let samm_id = app.current_samm_id()?;
    let txs = app
        .checked(app.api().transactions(samm_id, status, page).await)
        .await?;
    print_json(&txs)
}

pub async fn approvals(app: &mut App, txn_id: u64, mine: bool, page: Page) -> anyhow::Result<()> {
    if mine {
        let approval = app.checked(app.api().my_approval(txn_id).await).await?;
        match approval {
            Some(approval) => print_json(&approval),
            None => bail!("no approval from you for transaction {txn_id}"),
        }
    } else {
        let approvals = app.checked(app.api().approvals(txn_id, page).await).await?;
        print_json(&approvals)
    }
}
