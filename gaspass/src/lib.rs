#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core of the gaspass wallet: a pairing-session counterparty that answers
//! peer JSON-RPC requests and routes value transfers into a fee-sponsored
//! smart account pipeline.
//!
//! This crate is chain-agnostic at its seams. It owns the session state
//! machine and the request router, and defines the traits that the EVM crate
//! implements for chain queries and transfer execution.
//!
//! # Architecture
//!
//! - [`config`] - Account configuration replaced wholesale on change
//! - [`namespace`] - Capability sets and namespace negotiation
//! - [`session`] - Pairing transport boundary and its event types
//! - [`lifecycle`] - Proposal/session state machine ([`SessionManager`])
//! - [`hooks`] - Caller callbacks for proposals, approvals, and expiries
//! - [`retry`] - Bounded retry for transport races
//! - [`router`] - Inbound request classification and dispatch
//! - [`wallet`] - Event loop tying sessions to the router
//!
//! [`SessionManager`]: lifecycle::SessionManager

pub mod chain;
pub mod config;
pub mod error;
pub mod hooks;
pub mod jsonrpc;
pub mod lifecycle;
pub mod namespace;
pub mod retry;
pub mod router;
pub mod session;
pub mod timestamp;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use config::{AccountConfig, BoundAccount, ConfigHandle};
pub use error::SessionError;
pub use lifecycle::SessionManager;
pub use router::{RequestRouter, RouteOutcome};
pub use wallet::Wallet;
