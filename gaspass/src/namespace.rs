//! Capability namespaces and their negotiation.
//!
//! A peer proposes namespaces (chains, methods, events per chain family). On
//! approval the wallet answers with settled namespaces that additionally list
//! the accounts it grants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chain::{EIP155, caip2, caip10};
use crate::config::AccountConfig;

/// Methods granted in the `eip155` namespace when the peer does not list any.
pub const EVM_METHODS: &[&str] = &[
    "eth_sendTransaction",
    "eth_sign",
    "personal_sign",
    "eth_signTypedData",
    "eth_signTypedData_v4",
    "eth_chainId",
    "eth_getBalance",
    "eth_getCode",
    "eth_getTransactionCount",
    "eth_getTransactionReceipt",
    "eth_estimateGas",
    "eth_call",
    "eth_getLogs",
    "eth_getBlockByNumber",
    "eth_getBlockByHash",
    "eth_getTransactionByHash",
    "eth_getTransactionByBlockHashAndIndex",
    "eth_getTransactionByBlockNumberAndIndex",
    "eth_getUncleByBlockHashAndIndex",
    "eth_getUncleByBlockNumberAndIndex",
    "eth_getUncleCountByBlockHash",
    "eth_getUncleCountByBlockNumber",
    "eth_getStorageAt",
    "eth_protocolVersion",
    "eth_syncing",
    "eth_coinbase",
    "eth_mining",
    "eth_hashrate",
    "eth_gasPrice",
    "eth_accounts",
    "eth_blockNumber",
    "eth_getBlockTransactionCountByHash",
    "eth_getBlockTransactionCountByNumber",
    "eth_newFilter",
    "eth_newBlockFilter",
    "eth_newPendingTransactionFilter",
    "eth_uninstallFilter",
    "eth_getFilterChanges",
    "eth_getFilterLogs",
    "eth_subscribe",
    "eth_unsubscribe",
];

/// Events granted in the `eip155` namespace when the peer does not list any.
pub const EVM_EVENTS: &[&str] = &[
    "accountsChanged",
    "chainChanged",
    "connect",
    "disconnect",
    "message",
];

/// A namespace as requested by a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedNamespace {
    /// CAIP-2 chain identifiers.
    #[serde(default)]
    pub chains: Vec<String>,
    /// Requested methods.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Requested events.
    #[serde(default)]
    pub events: Vec<String>,
}

/// Requested namespaces keyed by namespace name.
pub type ProposedNamespaces = BTreeMap<String, ProposedNamespace>;

/// A namespace as granted by the wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledNamespace {
    /// CAIP-10 account identifiers.
    pub accounts: Vec<String>,
    /// Granted methods.
    pub methods: Vec<String>,
    /// Granted events.
    pub events: Vec<String>,
    /// CAIP-2 chain identifiers.
    pub chains: Vec<String>,
}

/// Granted namespaces keyed by namespace name.
pub type SettledNamespaces = BTreeMap<String, SettledNamespace>;

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

fn or_default(requested: &[String], fallback: &[&str]) -> Vec<String> {
    if requested.is_empty() {
        owned(fallback)
    } else {
        requested.to_vec()
    }
}

/// Computes the namespaces granted for a proposal.
///
/// With no required namespaces a single `eip155` namespace is synthesized
/// for the configured chain. Otherwise each `eip155` request keeps the
/// peer's lists, falling back to [`EVM_METHODS`], [`EVM_EVENTS`], and the
/// configured chain where a list is empty, and grants one account per chain.
/// Other namespaces are echoed back without accounts.
///
/// An unbound configuration grants [`BoundAccount::PLACEHOLDER`].
///
/// [`BoundAccount::PLACEHOLDER`]: crate::config::BoundAccount::PLACEHOLDER
#[must_use]
pub fn negotiate(required: &ProposedNamespaces, config: &AccountConfig) -> SettledNamespaces {
    if !config.account.is_bound() {
        tracing::warn!(
            chain_id = config.chain_id,
            "No smart account bound, granting placeholder account"
        );
    }
    let address = config.account.address_or_placeholder();
    let default_chain = caip2(config.chain_id);

    if required.is_empty() {
        let namespace = SettledNamespace {
            accounts: vec![caip10(&default_chain, address)],
            methods: owned(EVM_METHODS),
            events: owned(EVM_EVENTS),
            chains: vec![default_chain],
        };
        return BTreeMap::from([(EIP155.to_owned(), namespace)]);
    }

    required
        .iter()
        .map(|(key, proposed)| {
            let settled = if key == EIP155 {
                let chains = if proposed.chains.is_empty() {
                    vec![default_chain.clone()]
                } else {
                    proposed.chains.clone()
                };
                SettledNamespace {
                    accounts: chains.iter().map(|c| caip10(c, address)).collect(),
                    methods: or_default(&proposed.methods, EVM_METHODS),
                    events: or_default(&proposed.events, EVM_EVENTS),
                    chains,
                }
            } else {
                tracing::debug!(namespace = %key, "Echoing non-EVM namespace without accounts");
                SettledNamespace {
                    accounts: Vec::new(),
                    methods: proposed.methods.clone(),
                    events: proposed.events.clone(),
                    chains: proposed.chains.clone(),
                }
            };
            (key.clone(), settled)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundAccount;
    use alloy_primitives::{Address, address};

    const BOUND: Address = address!("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");

    fn config(chain_id: u64, account: BoundAccount) -> AccountConfig {
        AccountConfig::default()
            .with_chain_id(chain_id)
            .with_testnet(true)
            .with_account(account)
    }

    #[test]
    fn test_method_list_sizes() {
        assert_eq!(EVM_METHODS.len(), 41);
        assert_eq!(EVM_EVENTS.len(), 5);
    }

    #[test]
    fn test_empty_proposal_synthesizes_single_eip155_namespace() {
        let settled = negotiate(&BTreeMap::new(), &config(84532, BoundAccount::Bound(BOUND)));
        assert_eq!(settled.len(), 1);
        let ns = &settled["eip155"];
        assert_eq!(ns.accounts, vec![format!("eip155:84532:{BOUND}")]);
        assert_eq!(ns.chains, vec!["eip155:84532".to_owned()]);
        assert_eq!(ns.methods.len(), EVM_METHODS.len());
        assert_eq!(ns.events.len(), EVM_EVENTS.len());
    }

    #[test]
    fn test_unbound_uses_zero_address_sentinel() {
        let settled = negotiate(&BTreeMap::new(), &config(84532, BoundAccount::Unbound));
        assert_eq!(
            settled["eip155"].accounts,
            vec!["eip155:84532:0x0000000000000000000000000000000000000000".to_owned()]
        );
    }

    #[test]
    fn test_peer_lists_kept_and_empty_lists_defaulted() {
        let required = BTreeMap::from([(
            "eip155".to_owned(),
            ProposedNamespace {
                chains: vec!["eip155:1".to_owned(), "eip155:8453".to_owned()],
                methods: vec!["eth_sendTransaction".to_owned()],
                events: Vec::new(),
            },
        )]);
        let settled = negotiate(&required, &config(84532, BoundAccount::Bound(BOUND)));
        let ns = &settled["eip155"];
        assert_eq!(
            ns.accounts,
            vec![format!("eip155:1:{BOUND}"), format!("eip155:8453:{BOUND}")]
        );
        assert_eq!(ns.methods, vec!["eth_sendTransaction".to_owned()]);
        assert_eq!(ns.events.len(), EVM_EVENTS.len());
    }

    #[test]
    fn test_eip155_without_chains_uses_configured_chain() {
        let required = BTreeMap::from([("eip155".to_owned(), ProposedNamespace::default())]);
        let settled = negotiate(&required, &config(137, BoundAccount::Bound(BOUND)));
        assert_eq!(settled["eip155"].chains, vec!["eip155:137".to_owned()]);
        assert_eq!(settled["eip155"].accounts, vec![format!("eip155:137:{BOUND}")]);
    }

    #[test]
    fn test_other_namespaces_get_no_accounts() {
        let required = BTreeMap::from([(
            "solana".to_owned(),
            ProposedNamespace {
                chains: vec!["solana:mainnet".to_owned()],
                methods: vec!["solana_signMessage".to_owned()],
                events: Vec::new(),
            },
        )]);
        let settled = negotiate(&required, &config(1, BoundAccount::Bound(BOUND)));
        assert!(settled["solana"].accounts.is_empty());
        assert_eq!(settled["solana"].chains, vec!["solana:mainnet".to_owned()]);
    }
}
