use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;
use samm_chain::{get_nonce_from_module, network_label, SammSetting};
use samm_ops::{encode_call, parse_ether, RestrictionForm};
use samm_tx::guards::set_allowance;
use samm_tx::module::{
    disable_module, enable_module, find_deployed_module, prepare_module_deployment, ModuleDeploymentParams,
};
use samm_types::{hex_to_bytes, parse_u256, validate_address, Restriction};

use crate::app::App;
use crate::print_json;

#[derive(Subcommand)]
pub enum RestrictionsCmd {
    /// List the module's allow-list
    List,
    /// Allow calls of one function on a contract
    AddCall {
        /// Contract address
        target: String,
        /// Function signature, e.g. "transfer(address,uint256)"
        signature: String,
        /// Ether allowance attached to the call
        #[arg(long)]
        ether: Option<String>,
    },
    /// Allow plain ether transfers to an address
    AddEther {
        /// Recipient address
        target: String,
        /// Ether amount, e.g. "0.5"
        amount: String,
    },
    /// Remove an allow-list entry
    Remove {
        /// Contract address
        target: String,
        /// Four-byte selector, 0x00000000 for ether transfers
        selector: String,
    },
}

impl RestrictionsCmd {
    pub async fn run(self, app: &mut App, module: Option<&str>) -> anyhow::Result<()> {
        let ops = app.ops(module)?;
        let hash = match self {
            RestrictionsCmd::List => return print_json(&ops.restrictions().await?),
            RestrictionsCmd::AddCall { target, signature, ether } => {
                let form = RestrictionForm::FunctionCall { target, signature, ether_value: ether };
                ops.add_restriction(&app.wallet().await?, &form).await?
            }
            RestrictionsCmd::AddEther { target, amount } => {
                let form = RestrictionForm::EtherTransfer { target, amount };
                ops.add_restriction(&app.wallet().await?, &form).await?
            }
            RestrictionsCmd::Remove { target, selector } => {
                let to = validate_address(&target, Some("Contract"))?;
                let current = ops
                    .restrictions()
                    .await?
                    .into_iter()
                    .find(|r| r.matches(&to, &selector))
                    .unwrap_or(Restriction { to, selector, allowance: U256::ZERO });
                ops.remove_restriction(&app.wallet().await?, &current).await?
            }
        };
        print_json(&json!({ "safeTxHash": hash }))
    }
}

#[derive(Subcommand)]
pub enum SettingCmd {
    /// Read a setting (relayer, threshold, dkim-registry, members-root)
    Get { name: SammSetting },
    /// Propose a new value for a setting
    Set { name: SammSetting, value: String },
}

impl SettingCmd {
    pub async fn run(self, app: &mut App, module: Option<&str>) -> anyhow::Result<()> {
        let ops = app.ops(module)?;
        match self {
            SettingCmd::Get { name } => {
                println!("{}", ops.setting(name).await?);
                Ok(())
            }
            SettingCmd::Set { name, value } => {
                let hash = ops.update_setting(&app.wallet().await?, name, &value).await?;
                print_json(&json!({ "safeTxHash": hash }))
            }
        }
    }
}

#[derive(Subcommand)]
pub enum ModuleCmd {
    /// Enable a module on the Safe
    Enable { module: String },
    /// Disable a module on the Safe
    Disable { module: String },
    /// Build the proxy factory call that deploys a new module
    Deploy {
        #[arg(long)]
        proxy_factory: String,
        #[arg(long)]
        singleton: String,
        #[arg(long)]
        dkim_registry: String,
        /// Relayer email address
        #[arg(long)]
        relayer: String,
        #[arg(long)]
        threshold: u64,
        /// Comma-separated member emails
        #[arg(long)]
        emails: String,
    },
    /// Extract the deployed module address from a transaction receipt
    FindDeployed { tx_hash: B256 },
}

impl ModuleCmd {
    pub async fn run(self, app: &mut App) -> anyhow::Result<()> {
        match self {
            ModuleCmd::Enable { module } => {
                let module = validate_address(&module, Some("Module"))?;
                let hash = enable_module(&app.wallet().await?, module).await?;
                print_json(&json!({ "safeTxHash": hash }))
            }
            ModuleCmd::Disable { module } => {
                let hash = disable_module(&app.wallet().await?, &module).await?;
                print_json(&json!({ "safeTxHash": hash }))
            }
            ModuleCmd::Deploy {
                proxy_factory,
                singleton,
                dkim_registry,
                relayer,
                threshold,
                emails,
            } => {
                let emails = samm_ops::parse_member_emails(&emails, &[])?;
                let root = app.api().members_root(&emails).await?;
                let params = ModuleDeploymentParams {
                    safe: app.safe_address()?,
                    proxy_factory: validate_address(&proxy_factory, Some("Proxy Factory"))?,
                    singleton: validate_address(&singleton, Some("Singleton"))?,
                    members_root: parse_u256(&root)?,
                    threshold,
                    relayer,
                    dkim_registry: validate_address(&dkim_registry, Some("DKIM registry"))?,
                    salt_nonce: None,
                };
                let deployment = prepare_module_deployment(&params);
                print_json(&json!({
                    "chainId": app.chain_id,
                    "salt": deployment.salt,
                    "membersRoot": params.members_root.to_string(),
                    "transaction": deployment.transaction,
                }))
            }
            ModuleCmd::FindDeployed { tx_hash } => {
                let logs = app
                    .reader
                    .transaction_logs(tx_hash)
                    .await?
                    .context("transaction is not mined yet")?;
                let module: Address = find_deployed_module(&logs)?;
                println!("{}", module.to_checksum(None));
                Ok(())
            }
        }
    }
}

/// Print module state: network, settings, nonce, allow-list.
pub async fn status(app: &App, module: Option<&str>) -> anyhow::Result<()> {
    let ops = app.ops(module)?;
    let module = ops.module().to_checksum(None);
    let nonce = get_nonce_from_module(ops.reader(), &module).await?;

    let mut settings = serde_json::Map::new();
    for setting in SammSetting::ALL {
        settings.insert(setting.label().to_string(), ops.setting(setting).await?.into());
    }

    print_json(&json!({
        "network": network_label(app.chain_id),
        "chainId": app.chain_id,
        "module": module,
        "nonce": nonce.to_string(),
        "settings": settings,
        "restrictions": ops.restrictions().await?,
    }))
}

/// Build the approval message for a call from the module's Safe.
pub async fn message(
    app: &App,
    module: Option<&str>,
    to: &str,
    value: &str,
    data: Option<&str>,
    signature: Option<&str>,
    args: &[String],
) -> anyhow::Result<()> {
    let calldata = match (data, signature) {
        (Some(_), Some(_)) => bail!("pass either --data or --signature, not both"),
        (Some(data), None) => hex_to_bytes(data)?,
        (None, Some(signature)) => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            encode_call(signature, &args)?.data.to_vec()
        }
        (None, None) => Vec::new(),
    };
    let value = parse_ether(value)?;

    let message = app.ops(module)?.generate_message(to, value, &calldata).await?;
    print_json(&message)
}

/// Set the ether allowance granted to an address.
pub async fn allowance(app: &mut App, module: Option<&str>, to: &str, amount: &str) -> anyhow::Result<()> {
    let ops = app.ops(module)?;
    let to = validate_address(to, None)?;
    let amount = parse_ether(amount)?;
    let hash = set_allowance(&app.wallet().await?, ops.reader(), ops.module(), to, amount).await?;
    print_json(&json!({ "safeTxHash": hash }))
}
