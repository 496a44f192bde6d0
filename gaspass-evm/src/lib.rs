#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM side of the gaspass wallet.
//!
//! Peers send `eth_sendTransaction`; this crate executes it as an ERC-4337
//! v0.7 user operation from an owner-controlled smart account, with the gas
//! paid in USDC through the Circle paymaster and an EIP-2612 permit. It also
//! proxies read-only calls to the configured chain.
//!
//! # Features
//!
//! - **Smart Accounts**: Kernel v3.1 accounts derived from the owner, deployed on first use, ERC-1271 capable
//! - **Permits**: EIP-2612 permits signed by the account, EIP-6492 wrapped while undeployed
//! - **Sponsorship**: Circle paymaster data with fixed gas ceilings and fees
//! - **Bundler Client**: gas estimation, submission, and receipt polling
//!
//! # Architecture
//!
//! - [`networks`] - Supported chains, RPC endpoints, paymaster and USDC deployments
//! - [`account`] - Smart account provisioner and handle
//! - [`permit`] - Permit construction and paymaster data packing
//! - [`user_operation`] - v0.7 user operation and its hash
//! - [`bundler`] - Bundler JSON-RPC client
//! - [`submitter`] - The gasless pipeline ([`OperationSubmitter`])
//! - [`rpc`] - Read-only chain proxy ([`ChainRpcClient`])

pub mod account;
pub mod bundler;
pub mod contract;
pub mod networks;
pub mod permit;
pub mod reader;
pub mod rpc;
pub mod signature;
pub mod signer;
pub mod submitter;
pub mod user_operation;

#[cfg(test)]
mod testing;

pub use account::{AccountFactory, SmartAccountHandle, SmartAccountProvisioner};
pub use rpc::{ChainRpcClient, RpcEndpoint};
pub use signer::OwnerSigner;
pub use submitter::{HttpConnector, OperationSubmitter};
