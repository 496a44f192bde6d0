//! Account configuration shared by the session manager and the submitter.
//!
//! [`AccountConfig`] is an immutable value. [`ConfigHandle`] holds the current
//! value behind a [`watch`] channel; every setter builds a new value and
//! swaps it in, so readers always see a consistent snapshot.

use std::sync::Arc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::chain::ChainId;

/// Chain selected when the host has not chosen one.
pub const DEFAULT_CHAIN_ID: ChainId = 1;

/// The smart account address sessions are granted, if one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "address")]
pub enum BoundAccount {
    /// A provisioned smart account.
    Bound(Address),
    /// No account provisioned yet.
    Unbound,
}

impl BoundAccount {
    /// Address advertised in namespaces while no account is bound.
    pub const PLACEHOLDER: Address = Address::ZERO;

    /// The bound address, if any.
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        match self {
            Self::Bound(address) => Some(*address),
            Self::Unbound => None,
        }
    }

    /// The bound address, or [`Self::PLACEHOLDER`] when unbound.
    #[must_use]
    pub const fn address_or_placeholder(&self) -> Address {
        match self {
            Self::Bound(address) => *address,
            Self::Unbound => Self::PLACEHOLDER,
        }
    }

    /// Whether an account has been bound, including the zero address.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

impl From<Option<Address>> for BoundAccount {
    fn from(address: Option<Address>) -> Self {
        address.map_or(Self::Unbound, Self::Bound)
    }
}

/// Chain, network type, and bound account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    /// Selected chain.
    pub chain_id: ChainId,
    /// Whether `chain_id` is looked up in the testnet tables.
    pub is_testnet: bool,
    /// Smart account granted to peers.
    pub account: BoundAccount,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            is_testnet: false,
            account: BoundAccount::Unbound,
        }
    }
}

impl AccountConfig {
    /// Returns a copy with a different chain.
    #[must_use]
    pub const fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Returns a copy with a different network type.
    #[must_use]
    pub const fn with_testnet(mut self, is_testnet: bool) -> Self {
        self.is_testnet = is_testnet;
        self
    }

    /// Returns a copy bound to `account`.
    #[must_use]
    pub const fn with_account(mut self, account: BoundAccount) -> Self {
        self.account = account;
        self
    }

    /// True when a real, non-zero account is bound.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(self.account, BoundAccount::Bound(address) if !address.is_zero())
    }

    /// Summarizes this configuration for display.
    #[must_use]
    pub fn status(&self) -> ConfigurationStatus {
        ConfigurationStatus {
            is_configured: self.is_configured(),
            has_account: self.account.is_bound(),
            chain_id: self.chain_id,
            is_testnet: self.is_testnet,
            account: self.account.address(),
        }
    }
}

/// Snapshot answering "is this wallet ready to approve sessions".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStatus {
    /// A non-zero account is bound.
    pub is_configured: bool,
    /// Any account is bound.
    pub has_account: bool,
    /// Selected chain.
    pub chain_id: ChainId,
    /// Selected network type.
    pub is_testnet: bool,
    /// Bound address, if any.
    pub account: Option<Address>,
}

/// Shared handle to the current [`AccountConfig`].
///
/// Cloning the handle shares the same underlying value.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<AccountConfig>>>,
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(AccountConfig::default())
    }
}

impl ConfigHandle {
    /// Creates a handle holding `config`.
    #[must_use]
    pub fn new(config: AccountConfig) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn load(&self) -> Arc<AccountConfig> {
        Arc::clone(&self.tx.borrow())
    }

    /// Replaces the whole configuration.
    pub fn replace(&self, config: AccountConfig) {
        self.tx.send_replace(Arc::new(config));
        tracing::info!(
            chain_id = config.chain_id,
            testnet = config.is_testnet,
            account = ?config.account,
            "Account configuration replaced"
        );
    }

    /// Derives a new configuration from the current one and swaps it in.
    pub fn update(&self, f: impl FnOnce(&AccountConfig) -> AccountConfig) {
        self.tx.send_modify(|current| *current = Arc::new(f(current)));
        let config = self.load();
        tracing::info!(
            chain_id = config.chain_id,
            testnet = config.is_testnet,
            account = ?config.account,
            "Account configuration updated"
        );
    }

    /// Selects a different chain.
    pub fn set_chain_id(&self, chain_id: ChainId) {
        self.update(|c| c.with_chain_id(chain_id));
    }

    /// Switches between mainnet and testnet tables.
    pub fn set_network_type(&self, is_testnet: bool) {
        self.update(|c| c.with_testnet(is_testnet));
    }

    /// Binds (or unbinds) the smart account granted to peers.
    pub fn set_account(&self, account: BoundAccount) {
        self.update(|c| c.with_account(account));
    }

    /// Receives every subsequent replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<AccountConfig>> {
        self.tx.subscribe()
    }

    /// See [`AccountConfig::is_configured`].
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.load().is_configured()
    }

    /// See [`AccountConfig::status`].
    #[must_use]
    pub fn status(&self) -> ConfigurationStatus {
        self.load().status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_default_is_mainnet_ethereum_unbound() {
        let config = AccountConfig::default();
        assert_eq!(config.chain_id, 1);
        assert!(!config.is_testnet);
        assert_eq!(config.account, BoundAccount::Unbound);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_zero_address_is_bound_but_not_configured() {
        let config = AccountConfig::default().with_account(BoundAccount::Bound(Address::ZERO));
        let status = config.status();
        assert!(status.has_account);
        assert!(!status.is_configured);
        assert_eq!(status.account, Some(Address::ZERO));
    }

    #[test]
    fn test_placeholder_only_when_unbound() {
        let addr = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");
        assert_eq!(BoundAccount::Bound(addr).address_or_placeholder(), addr);
        assert_eq!(
            BoundAccount::Unbound.address_or_placeholder(),
            BoundAccount::PLACEHOLDER
        );
        assert_eq!(BoundAccount::from(None), BoundAccount::Unbound);
    }

    #[test]
    fn test_setters_swap_whole_value() {
        let handle = ConfigHandle::default();
        let before = handle.load();

        handle.set_chain_id(84532);
        handle.set_network_type(true);

        assert_eq!(before.chain_id, 1);
        let after = handle.load();
        assert_eq!(after.chain_id, 84532);
        assert!(after.is_testnet);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = ConfigHandle::default();
        let other = handle.clone();
        let addr = address!("1111111111111111111111111111111111111111");
        other.set_account(BoundAccount::Bound(addr));
        assert!(handle.is_configured());
        assert_eq!(handle.status().account, Some(addr));
    }

    #[tokio::test]
    async fn test_subscribers_observe_replacement() {
        let handle = ConfigHandle::default();
        let mut rx = handle.subscribe();
        handle.replace(AccountConfig::default().with_chain_id(8453));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().chain_id, 8453);
    }

    #[test]
    fn test_bound_account_serde_shape() {
        let json = serde_json::to_value(BoundAccount::Unbound).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "unbound" }));
    }
}
