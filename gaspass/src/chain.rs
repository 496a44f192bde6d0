//! Chain identifiers in the `eip155` namespace.
//!
//! Sessions describe chains as CAIP-2 strings (`eip155:8453`) and accounts as
//! CAIP-10 strings (`eip155:8453:0x...`).

use alloy_primitives::Address;

/// An EIP-155 chain ID (e.g., 8453 for Base, 137 for Polygon).
pub type ChainId = u64;

/// The EVM account namespace key.
pub const EIP155: &str = "eip155";

/// Formats a chain ID as a CAIP-2 identifier.
///
/// Example: `caip2(8453)` returns `"eip155:8453"`.
#[must_use]
pub fn caip2(chain_id: ChainId) -> String {
    format!("{EIP155}:{chain_id}")
}

/// Parses a CAIP-2 identifier into an EIP-155 chain ID.
///
/// Returns `None` if the input is not a valid `eip155:` prefixed string.
#[must_use]
pub fn parse_caip2(caip: &str) -> Option<ChainId> {
    caip.strip_prefix("eip155:").and_then(|s| s.parse().ok())
}

/// Joins a CAIP-2 chain identifier with an address into a CAIP-10 account.
#[must_use]
pub fn caip10(chain: &str, address: Address) -> String {
    format!("{chain}:{address}")
}
