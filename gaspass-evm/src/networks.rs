//! Supported chains, their public RPC endpoints, and the Circle paymaster
//! and USDC deployments used for gas sponsorship.
//!
//! Mainnet and testnet tables are disjoint. Lookups of an unknown chain fall
//! back to Ethereum mainnet and log a warning; use the `try_` variants to
//! detect the miss.

use alloy_primitives::{Address, address};
use gaspass::chain::ChainId;
use serde::Serialize;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: ChainId = 1;

/// Optimism Mainnet chain ID.
pub const OPTIMISM_MAINNET: ChainId = 10;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// Unichain Mainnet chain ID.
pub const UNICHAIN_MAINNET: ChainId = 130;

/// Base Mainnet chain ID.
pub const BASE_MAINNET: ChainId = 8453;

/// Arbitrum One chain ID.
pub const ARBITRUM_MAINNET: ChainId = 42161;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: ChainId = 43114;

/// Sepolia chain ID.
pub const SEPOLIA: ChainId = 11_155_111;

/// Polygon Mumbai (testnet) chain ID.
pub const POLYGON_MUMBAI: ChainId = 80001;

/// Optimism Sepolia chain ID.
pub const OPTIMISM_SEPOLIA: ChainId = 11_155_420;

/// Arbitrum Sepolia chain ID.
pub const ARBITRUM_SEPOLIA: ChainId = 421_614;

/// Base Sepolia chain ID.
pub const BASE_SEPOLIA: ChainId = 84532;

/// Avalanche Fuji (testnet) chain ID.
pub const AVALANCHE_FUJI: ChainId = 43113;

/// Chain used when a lookup misses.
pub const DEFAULT_CHAIN: ChainId = ETHEREUM_MAINNET;

/// ERC-4337 v0.7 `EntryPoint`, deployed at the same address on every chain.
pub const ENTRY_POINT_V07: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

/// Circle Paymaster.
pub const CIRCLE_PAYMASTER: Address = address!("31BE08D380A21fc740883c0BC434FcFc88740b58");

/// USDC contract address on Ethereum Mainnet.
pub const USDC_ETHEREUM: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// USDC contract address on Optimism.
pub const USDC_OPTIMISM: Address = address!("0b2C639c533813f4Aa9D7837CAf62653d097Ff85");

/// USDC contract address on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// USDC contract address on Unichain.
pub const USDC_UNICHAIN: Address = address!("078D782b760474a361dDA0AF3839290b0EF57AD6");

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Arbitrum One.
pub const USDC_ARBITRUM: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

/// USDC contract address on Avalanche C-Chain.
pub const USDC_AVALANCHE: Address = address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E");

/// USDC contract address on Sepolia.
pub const USDC_SEPOLIA: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");

/// USDC contract address on Polygon Mumbai.
pub const USDC_POLYGON_MUMBAI: Address = address!("9999f7Fea5938fD3b1E26A12c3f2fb024e194f97");

/// USDC contract address on Optimism Sepolia.
pub const USDC_OPTIMISM_SEPOLIA: Address = address!("5fd84259d66Cd46123540766Be93DFE6D43130D7");

/// USDC contract address on Arbitrum Sepolia.
pub const USDC_ARBITRUM_SEPOLIA: Address = address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// USDC contract address on Avalanche Fuji.
pub const USDC_AVALANCHE_FUJI: Address = address!("5425890298aed601595a70AB815c96711a31Bc65");

/// Default token decimals for USDC.
pub const USDC_DECIMALS: u8 = 6;

/// RPC endpoint used when a lookup misses.
pub const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";

/// Circle paymaster documentation.
pub const PAYMASTER_DOCS_URL: &str = "https://developers.circle.com/stablecoins/paymaster-overview";

/// A chain the wallet can sponsor operations on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    /// EIP-155 chain ID.
    pub chain_id: ChainId,
    /// Display name.
    pub name: &'static str,
    /// Public JSON-RPC endpoint.
    pub rpc_url: &'static str,
    /// Paymaster accepting USDC for gas.
    pub paymaster: Address,
    /// USDC token contract.
    pub usdc: Address,
    /// Whether this is a test network.
    pub testnet: bool,
}

const fn mainnet(chain_id: ChainId, name: &'static str, rpc_url: &'static str, usdc: Address) -> ChainInfo {
    ChainInfo {
        chain_id,
        name,
        rpc_url,
        paymaster: CIRCLE_PAYMASTER,
        usdc,
        testnet: false,
    }
}

const fn testnet(chain_id: ChainId, name: &'static str, rpc_url: &'static str, usdc: Address) -> ChainInfo {
    ChainInfo {
        chain_id,
        name,
        rpc_url,
        paymaster: CIRCLE_PAYMASTER,
        usdc,
        testnet: true,
    }
}

/// Supported mainnet chains.
pub const MAINNET_CHAINS: &[ChainInfo] = &[
    mainnet(ARBITRUM_MAINNET, "Arbitrum", "https://arb1.arbitrum.io/rpc", USDC_ARBITRUM),
    mainnet(BASE_MAINNET, "Base", "https://mainnet.base.org", USDC_BASE),
    mainnet(ETHEREUM_MAINNET, "Ethereum", DEFAULT_RPC_URL, USDC_ETHEREUM),
    mainnet(POLYGON_MAINNET, "Polygon", "https://polygon-rpc.com", USDC_POLYGON),
    mainnet(OPTIMISM_MAINNET, "Optimism", "https://mainnet.optimism.io", USDC_OPTIMISM),
    mainnet(
        AVALANCHE_MAINNET,
        "Avalanche",
        "https://api.avax.network/ext/bc/C/rpc",
        USDC_AVALANCHE,
    ),
    mainnet(UNICHAIN_MAINNET, "Unichain", "https://mainnet.unichain.org", USDC_UNICHAIN),
];

/// Supported testnet chains.
pub const TESTNET_CHAINS: &[ChainInfo] = &[
    testnet(SEPOLIA, "Sepolia", "https://rpc.sepolia.org", USDC_SEPOLIA),
    testnet(
        POLYGON_MUMBAI,
        "Mumbai",
        "https://rpc-mumbai.maticvigil.com",
        USDC_POLYGON_MUMBAI,
    ),
    testnet(
        OPTIMISM_SEPOLIA,
        "Optimism Sepolia",
        "https://sepolia.optimism.io",
        USDC_OPTIMISM_SEPOLIA,
    ),
    testnet(
        ARBITRUM_SEPOLIA,
        "Arbitrum Sepolia",
        "https://sepolia-rollup.arbitrum.io/rpc",
        USDC_ARBITRUM_SEPOLIA,
    ),
    testnet(BASE_SEPOLIA, "Base Sepolia", "https://sepolia.base.org", USDC_BASE_SEPOLIA),
    testnet(
        AVALANCHE_FUJI,
        "Fuji",
        "https://api.avax-test.network/ext/bc/C/rpc",
        USDC_AVALANCHE_FUJI,
    ),
];

/// Chains for one network type.
#[must_use]
pub const fn supported_chains(is_testnet: bool) -> &'static [ChainInfo] {
    if is_testnet { TESTNET_CHAINS } else { MAINNET_CHAINS }
}

/// Whether `chain_id` is in the table for the given network type.
#[must_use]
pub fn is_supported(chain_id: ChainId, is_testnet: bool) -> bool {
    try_chain(chain_id, is_testnet).is_some()
}

/// Every supported chain, mainnets first.
pub fn all_chains() -> impl Iterator<Item = &'static ChainInfo> {
    MAINNET_CHAINS.iter().chain(TESTNET_CHAINS)
}

/// Looks up a chain in the table for the given network type.
#[must_use]
pub fn try_chain(chain_id: ChainId, is_testnet: bool) -> Option<&'static ChainInfo> {
    supported_chains(is_testnet)
        .iter()
        .find(|c| c.chain_id == chain_id)
}

/// Looks up a chain in either table.
#[must_use]
pub fn chain_info(chain_id: ChainId) -> Option<&'static ChainInfo> {
    all_chains().find(|c| c.chain_id == chain_id)
}

fn default_chain() -> &'static ChainInfo {
    &MAINNET_CHAINS[2]
}

/// Paymaster and fee token for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SponsorDeployment {
    /// Paymaster contract.
    pub paymaster: Address,
    /// Token the paymaster charges gas in.
    pub fee_token: Address,
}

/// Resolves the sponsor pair without falling back.
#[must_use]
pub fn try_sponsor_deployment(chain_id: ChainId, is_testnet: bool) -> Option<SponsorDeployment> {
    try_chain(chain_id, is_testnet).map(|c| SponsorDeployment {
        paymaster: c.paymaster,
        fee_token: c.usdc,
    })
}

/// Resolves the sponsor pair, falling back to [`DEFAULT_CHAIN`] mainnet
/// when the chain is not in the selected table.
#[must_use]
pub fn sponsor_deployment(chain_id: ChainId, is_testnet: bool) -> SponsorDeployment {
    try_sponsor_deployment(chain_id, is_testnet).unwrap_or_else(|| {
        tracing::warn!(
            chain_id,
            testnet = is_testnet,
            fallback = DEFAULT_CHAIN,
            "Unknown chain, using default sponsor deployment"
        );
        let fallback = default_chain();
        SponsorDeployment {
            paymaster: fallback.paymaster,
            fee_token: fallback.usdc,
        }
    })
}

/// Public RPC endpoint for a chain in either table, falling back to
/// [`DEFAULT_RPC_URL`].
#[must_use]
pub fn rpc_url(chain_id: ChainId) -> &'static str {
    chain_info(chain_id).map_or_else(
        || {
            tracing::warn!(chain_id, fallback = DEFAULT_RPC_URL, "Unknown chain, using default RPC endpoint");
            DEFAULT_RPC_URL
        },
        |c| c.rpc_url,
    )
}

/// Fills a bundler URL template's `{chain_id}` placeholder.
#[must_use]
pub fn bundler_url(template: &str, chain_id: ChainId) -> String {
    template.replace("{chain_id}", &chain_id.to_string())
}

/// Description of the sponsorship offered on a network type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterInfo {
    /// One-line description.
    pub description: &'static str,
    /// `"Mainnet"` or `"Testnet"`.
    pub network_type: &'static str,
    /// Chains sponsored on this network type.
    pub supported_chains: Vec<ChainId>,
    /// Pricing note.
    pub pricing: &'static str,
    /// Accepted fee token.
    pub token: &'static str,
    /// Account-abstraction standard.
    pub standard: &'static str,
    /// Documentation link.
    pub documentation: &'static str,
}

/// Describes sponsorship for a network type.
#[must_use]
pub fn paymaster_info(is_testnet: bool) -> PaymasterInfo {
    PaymasterInfo {
        description: "Circle Paymaster allows users to pay gas fees in USDC",
        network_type: if is_testnet { "Testnet" } else { "Mainnet" },
        supported_chains: supported_chains(is_testnet)
            .iter()
            .map(|c| c.chain_id)
            .collect(),
        pricing: if is_testnet {
            "Free on testnets"
        } else {
            "10% surcharge on gas fees"
        },
        token: "USDC only",
        standard: "ERC-4337 v0.7",
        documentation: PAYMASTER_DOCS_URL,
    }
}
