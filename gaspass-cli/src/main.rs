//! gaspass command-line host.
//!
//! Drives the smart account and the gasless transfer pipeline from a
//! terminal. Requests go through the same router peers reach over a paired
//! session, so `send` and `request` answer exactly what a peer would see.
//!
//! # Usage
//!
//! ```bash
//! gaspass address
//! gaspass balance
//! gaspass send --to 0x... --value 0 --data 0x...
//! gaspass request eth_blockNumber
//! gaspass chains --testnet
//! gaspass --config /path/to/gaspass.toml info
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `gaspass.toml`)
//! - `OWNER_PRIVATE_KEY` — Owner key, overrides the file
//! - `BUNDLER_URL` — Bundler URL template, overrides the file
//! - `RUST_LOG` — Log filter (default: `info`); logs go to stderr

mod config;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_signer_local::PrivateKeySigner;
use clap::{Parser, Subcommand};
use gaspass::chain::caip2;
use gaspass::config::BoundAccount;
use gaspass::session::SessionRequest;
use gaspass::{ConfigHandle, RequestRouter};
use gaspass_evm::networks;
use gaspass_evm::{ChainRpcClient, HttpConnector, OperationSubmitter, RpcEndpoint};
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, HostConfig};

type Router = RequestRouter<ChainRpcClient, OperationSubmitter<PrivateKeySigner>>;

/// Topic stamped on requests issued from the command line.
const CLI_TOPIC: &str = "cli";

#[derive(Debug, Parser)]
#[command(name = "gaspass", version, about = "Smart account wallet with USDC-sponsored gas")]
struct Cli {
    /// Configuration file.
    #[arg(long, env = "CONFIG", default_value = "gaspass.toml", global = true)]
    config: PathBuf,

    /// Chain id, overriding the file.
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Use the testnet tables.
    #[arg(long, global = true)]
    testnet: bool,

    /// Owner key (hex).
    #[arg(long, env = "OWNER_PRIVATE_KEY", hide_env_values = true, global = true)]
    owner_private_key: Option<String>,

    /// Bundler URL template; `{chain_id}` is substituted.
    #[arg(long, env = "BUNDLER_URL", global = true)]
    bundler_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the counterfactual smart account address.
    Address,
    /// Print the smart account's USDC balance.
    Balance,
    /// Send a sponsored call from the smart account.
    Send {
        /// Call target.
        #[arg(long)]
        to: Address,
        /// Native value in wei.
        #[arg(long, default_value = "0")]
        value: U256,
        /// Call data (hex).
        #[arg(long)]
        data: Option<Bytes>,
    },
    /// Send an arbitrary JSON-RPC request through the router.
    Request {
        /// Method name.
        method: String,
        /// Params as a JSON array.
        #[arg(default_value = "[]")]
        params: String,
    },
    /// List supported chains.
    Chains,
    /// Print the configuration status and paymaster details.
    Info,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("Fatal error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = HostConfig::load_from(&cli.config)?;
    if let Some(chain_id) = cli.chain_id {
        config.chain_id = chain_id;
    }
    if cli.testnet {
        config.testnet = true;
    }
    if cli.owner_private_key.is_some() {
        config.owner_private_key = cli.owner_private_key;
    }
    if cli.bundler_url.is_some() {
        config.bundler_url = cli.bundler_url;
    }

    let handle = ConfigHandle::new(config.account_config());
    tracing::debug!(chain_id = config.chain_id, testnet = config.testnet, "Configuration loaded");

    match cli.command {
        Command::Chains => print_json(&networks::supported_chains(config.testnet))?,
        Command::Info => print_json(&json!({
            "status": handle.status(),
            "chain": networks::try_chain(config.chain_id, config.testnet),
            "paymaster": networks::paymaster_info(config.testnet),
        }))?,
        Command::Address => {
            let submitter = submitter(&config, handle.clone())?;
            let address = submitter.smart_account_address().await?;
            handle.set_account(BoundAccount::Bound(address));
            print_json(&handle.status())?;
        }
        Command::Balance => {
            let submitter = submitter(&config, handle)?;
            print_json(&submitter.fee_token_balance().await?)?;
        }
        Command::Send { to, value, data } => {
            let params = json!([{
                "to": to,
                "value": value,
                "data": data.unwrap_or_default(),
            }]);
            let router = router(&config, handle)?;
            dispatch(&router, config.chain_id, "eth_sendTransaction", params).await?;
        }
        Command::Request { method, params } => {
            let params: Value = serde_json::from_str(&params)?;
            let router = router(&config, handle)?;
            dispatch(&router, config.chain_id, &method, params).await?;
        }
    }
    Ok(())
}

fn submitter(
    config: &HostConfig,
    handle: ConfigHandle,
) -> Result<OperationSubmitter<PrivateKeySigner>, ConfigError> {
    let signer = config.owner_signer()?;
    let mut connector = HttpConnector::new(config.bundler_url()?);
    if let Some(url) = config.rpc_url()? {
        connector = connector.with_rpc_url(url);
    }
    Ok(OperationSubmitter::new(handle, signer, Arc::new(connector))
        .with_settings(config.submitter_settings()))
}

fn router(config: &HostConfig, handle: ConfigHandle) -> Result<Router, ConfigError> {
    let endpoint = match config.rpc_url()? {
        Some(url) => RpcEndpoint::Fixed(url),
        None => RpcEndpoint::Configured(handle.clone()),
    };
    let submitter = submitter(config, handle)?;
    Ok(RequestRouter::new(ChainRpcClient::new(endpoint), submitter))
}

async fn dispatch(
    router: &Router,
    chain_id: u64,
    method: &str,
    params: Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = SessionRequest {
        id: 1,
        topic: CLI_TOPIC.to_owned(),
        chain_id: Some(caip2(chain_id)),
        method: method.to_owned(),
        params,
    };
    let response = router.dispatch(&request).await;
    print_json(&response)?;
    match response.error {
        Some(error) => Err(format!("{method} failed ({}): {}", error.code, error.message).into()),
        None => Ok(()),
    }
}

#[allow(clippy::print_stdout)]
fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
