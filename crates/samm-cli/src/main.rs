use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use serde::Serialize;
use samm_api::{Page, DEFAULT_LIMIT, DEFAULT_OFFSET};
use samm_types::DbTransactionStatus;
use tracing_subscriber::EnvFilter;

mod app;
mod backend_cmd;
mod chain_cmd;
mod config;
mod wallet;

use crate::app::App;
use crate::backend_cmd::{LoginCmd, MembersCmd, SammsCmd};
use crate::chain_cmd::{ModuleCmd, RestrictionsCmd, SettingCmd};
use crate::config::Settings;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Config file [default: <data dir>/samm.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Module address, overriding config and the selected module
    #[arg(long, global = true)]
    module: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show network, settings, nonce and allow-list of the module
    Status,

    /// Build an approval message for a call from the Safe
    Message {
        /// Call target
        to: String,
        /// Ether sent with the call
        #[arg(long, default_value = "0")]
        value: String,
        /// Raw calldata in hex
        #[arg(long)]
        data: Option<String>,
        /// Function signature to encode `args` with
        #[arg(long)]
        signature: Option<String>,
        args: Vec<String>,
    },

    /// Encode a contract call from a signature and arguments
    Encode { signature: String, args: Vec<String> },

    /// Manage the allow-list
    #[command(subcommand)]
    Restrictions(RestrictionsCmd),

    /// Set the ether allowance for an address
    Allowance { to: String, amount: String },

    /// Read or change module settings
    #[command(subcommand)]
    Setting(SettingCmd),

    /// Change the approval threshold
    Threshold { value: String },

    /// Manage module members
    #[command(subcommand)]
    Members(MembersCmd),

    /// Enable, disable or deploy modules
    #[command(subcommand)]
    Module(ModuleCmd),

    /// Print the request an owner signs to log in
    Authorize {
        #[arg(long)]
        signer: Address,
    },

    /// Obtain a backend token
    #[command(subcommand)]
    Login(LoginCmd),

    /// Forget the stored session
    Logout,

    /// Backend module records
    #[command(subcommand)]
    Samms(SammsCmd),

    /// Transactions recorded for the selected module
    Transactions {
        #[arg(long)]
        status: Option<DbTransactionStatus>,
        #[arg(long, default_value_t = DEFAULT_OFFSET)]
        offset: u64,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u64,
    },

    /// Email approvals collected for a transaction
    Approvals {
        txn_id: u64,
        /// Only your own approval
        #[arg(long)]
        mine: bool,
        #[arg(long, default_value_t = DEFAULT_OFFSET)]
        offset: u64,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u64,
    },
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_file = match cli.config {
        Some(path) => path,
        None => config::default_config_file()?,
    };
    let settings = Settings::load(&config_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Command::Encode { signature, args } = &cli.command {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        return print_json(&samm_ops::encode_call(signature, &args)?);
    }

    let mut app = App::connect(settings).await?;
    let module = cli.module.as_deref();

    match cli.command {
        Command::Status => chain_cmd::status(&app, module).await,
        Command::Message { to, value, data, signature, args } => {
            chain_cmd::message(&app, module, &to, &value, data.as_deref(), signature.as_deref(), &args)
                .await
        }
        Command::Encode { .. } => unreachable!("handled before connecting"),
        Command::Restrictions(cmd) => cmd.run(&mut app, module).await,
        Command::Allowance { to, amount } => chain_cmd::allowance(&mut app, module, &to, &amount).await,
        Command::Setting(cmd) => cmd.run(&mut app, module).await,
        Command::Threshold { value } => backend_cmd::threshold(&mut app, module, &value).await,
        Command::Members(cmd) => cmd.run(&mut app, module).await,
        Command::Module(cmd) => cmd.run(&mut app).await,
        Command::Authorize { signer } => backend_cmd::authorize(&mut app, module, signer).await,
        Command::Login(cmd) => cmd.run(&mut app, module).await,
        Command::Logout => {
            app.session.logout().await?;
            println!("logged out");
            Ok(())
        }
        Command::Samms(cmd) => cmd.run(&mut app).await,
        Command::Transactions { status, offset, limit } => {
            backend_cmd::transactions(&mut app, status, Page { offset, limit }).await
        }
        Command::Approvals { txn_id, mine, offset, limit } => {
            backend_cmd::approvals(&mut app, txn_id, mine, Page { offset, limit }).await
        }
    }
}
