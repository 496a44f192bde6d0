//! ERC-4337 v0.7 user operations.
//!
//! Bundlers take the unpacked JSON form; the entry point hashes the packed
//! form, where gas limits and fees are squeezed pairwise into 32-byte words
//! and `initCode` / `paymasterAndData` are concatenated byte strings.

use alloy_primitives::{Address, B256, Bytes, U256, hex, keccak256};
use alloy_sol_types::SolValue;
use gaspass::chain::ChainId;
use serde::{Deserialize, Serialize};

/// Placeholder owner signature accepted by gas estimation. It has the
/// length and shape of a real ECDSA signature but recovers to no owner.
pub const DUMMY_SIGNATURE: [u8; 65] = hex!(
    "fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c"
);

/// An unpacked v0.7 user operation.
///
/// Gas limits and fees are plain quantities; see [`UserOperation::hash`] for
/// how they are packed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct UserOperation {
    /// Smart account the operation executes on.
    pub sender: Address,
    /// Entry point nonce of the sender.
    pub nonce: U256,
    /// Deploying factory, when the account has no code yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    /// Factory call data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    /// Call the account executes.
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    /// Sponsor paying the gas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    /// Sponsor-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    /// Account signature over the operation hash.
    pub signature: Bytes,
}

/// Two 128-bit values in one word, `high` first.
fn pack_u128_pair(high: U256, low: U256) -> B256 {
    let mut word = [0u8; 32];
    word[..16].copy_from_slice(&high.to_be_bytes::<32>()[16..]);
    word[16..].copy_from_slice(&low.to_be_bytes::<32>()[16..]);
    B256::from(word)
}

impl UserOperation {
    /// `factory ‖ factoryData`, or empty when the account is deployed.
    #[must_use]
    pub fn init_code(&self) -> Bytes {
        self.factory.map_or_else(Bytes::new, |factory| {
            let data = self.factory_data.as_ref().map_or(&[][..], |b| &b[..]);
            [factory.as_slice(), data].concat().into()
        })
    }

    /// `paymaster ‖ uint128 verificationGas ‖ uint128 postOpGas ‖ data`, or
    /// empty when the operation is not sponsored.
    #[must_use]
    pub fn paymaster_and_data(&self) -> Bytes {
        self.paymaster.map_or_else(Bytes::new, |paymaster| {
            let limits = pack_u128_pair(
                self.paymaster_verification_gas_limit.unwrap_or_default(),
                self.paymaster_post_op_gas_limit.unwrap_or_default(),
            );
            let data = self.paymaster_data.as_ref().map_or(&[][..], |b| &b[..]);
            [paymaster.as_slice(), limits.as_slice(), data].concat().into()
        })
    }

    /// `verificationGasLimit ‖ callGasLimit`.
    #[must_use]
    pub fn account_gas_limits(&self) -> B256 {
        pack_u128_pair(self.verification_gas_limit, self.call_gas_limit)
    }

    /// `maxPriorityFeePerGas ‖ maxFeePerGas`.
    #[must_use]
    pub fn gas_fees(&self) -> B256 {
        pack_u128_pair(self.max_priority_fee_per_gas, self.max_fee_per_gas)
    }

    /// The hash the account signs and the entry point reports, as computed
    /// by `EntryPoint.getUserOpHash` in v0.7.
    #[must_use]
    pub fn hash(&self, entry_point: Address, chain_id: ChainId) -> B256 {
        let packed = (
            self.sender,
            self.nonce,
            keccak256(self.init_code()),
            keccak256(&self.call_data),
            self.account_gas_limits(),
            self.pre_verification_gas,
            self.gas_fees(),
            keccak256(self.paymaster_and_data()),
        )
            .abi_encode();
        keccak256((keccak256(packed), entry_point, U256::from(chain_id)).abi_encode())
    }

    /// Copies the account gas limits from a bundler estimate. Paymaster
    /// limits are left alone.
    pub const fn apply_estimate(&mut self, estimate: &GasEstimate) {
        self.call_gas_limit = estimate.call_gas_limit;
        self.verification_gas_limit = estimate.verification_gas_limit;
        self.pre_verification_gas = estimate.pre_verification_gas;
    }
}

/// Result of `eth_estimateUserOperationGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<U256>,
}

/// The bundle transaction that included an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionReceipt {
    /// Bundle transaction hash.
    pub transaction_hash: B256,
}

/// Result of `eth_getUserOperationReceipt` once the operation is mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    /// Operation hash.
    pub user_op_hash: B256,
    /// Whether the call succeeded.
    pub success: bool,
    /// Revert reason, if any.
    #[serde(default)]
    pub reason: Option<String>,
    /// Inclusion details.
    pub receipt: InclusionReceipt,
}
