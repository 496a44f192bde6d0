//! EIP-2612 permits for the Circle paymaster.
//!
//! The paymaster pulls its gas fee in USDC using a permit signed by the
//! smart account. `paymasterData` is
//! `encodePacked(uint8 mode, address token, uint256 amount, bytes signature)`
//! with mode `0`.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Eip712Domain, eip712_domain};
use gaspass::chain::ChainId;
use serde_json::json;

use crate::contract::Permit;
use crate::reader::{ChainReader, ReadError};
use crate::signature::{SignatureFormatError, unwrap_signature};
use crate::signer::TypedData;
use crate::user_operation::UserOperation;

/// `paymasterData` mode byte for permit-based payment.
pub const PERMIT_MODE: u8 = 0;

/// Gas reserved for the paymaster's validation.
pub const PAYMASTER_VERIFICATION_GAS: u64 = 200_000;

/// Gas reserved for the paymaster's post-operation fee transfer.
pub const PAYMASTER_POST_OP_GAS: u64 = 15_000;

/// Fee-token amount authorized per operation: 10 USDC.
pub const DEFAULT_PERMIT_AMOUNT: U256 = U256::from_limbs([10_000_000, 0, 0, 0]);

/// A permit for one operation, read fresh from the token.
#[derive(Debug, Clone)]
pub struct PermitMessage {
    /// Domain built from the token's `name()` / `version()`.
    pub domain: Eip712Domain,
    /// The signed struct. `deadline` is unbounded.
    pub permit: Permit,
}

impl PermitMessage {
    /// Reads the token's domain fields and `owner`'s current permit nonce.
    ///
    /// # Errors
    ///
    /// The reader's error.
    pub async fn build(
        reader: &dyn ChainReader,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<Self, ReadError> {
        let (token_domain, nonce) = tokio::try_join!(
            reader.token_domain(token),
            reader.permit_nonce(token, owner)
        )?;
        let domain = eip712_domain! {
            name: token_domain.name,
            version: token_domain.version,
            chain_id: chain_id,
            verifying_contract: token,
        };
        Ok(Self {
            domain,
            permit: Permit {
                owner,
                spender,
                value,
                nonce,
                deadline: U256::MAX,
            },
        })
    }

    /// The payload handed to the signer.
    #[must_use]
    pub fn typed_data(&self) -> TypedData {
        let message = json!({
            "owner": self.permit.owner,
            "spender": self.permit.spender,
            "value": self.permit.value.to_string(),
            "nonce": self.permit.nonce.to_string(),
            "deadline": self.permit.deadline.to_string(),
        });
        TypedData::new(&self.permit, self.domain.clone(), message)
    }
}

/// Packs `paymasterData`, stripping any EIP-6492 envelope from `signature`.
///
/// # Errors
///
/// [`SignatureFormatError`] when the signature carries a malformed
/// envelope.
pub fn pack_paymaster_data(
    token: Address,
    amount: U256,
    signature: Bytes,
) -> Result<Bytes, SignatureFormatError> {
    let raw = unwrap_signature(signature)?;
    Ok([
        &[PERMIT_MODE][..],
        token.as_slice(),
        &amount.to_be_bytes::<32>()[..],
        &raw[..],
    ]
    .concat()
    .into())
}

/// Sponsor fields of a user operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymasterFields {
    /// Paymaster contract.
    pub paymaster: Address,
    /// Packed permit payload.
    pub data: Bytes,
}

impl PaymasterFields {
    /// Writes the sponsor fields, with the fixed gas ceilings, into `op`.
    pub fn apply(self, op: &mut UserOperation) {
        op.paymaster = Some(self.paymaster);
        op.paymaster_verification_gas_limit = Some(U256::from(PAYMASTER_VERIFICATION_GAS));
        op.paymaster_post_op_gas_limit = Some(U256::from(PAYMASTER_POST_OP_GAS));
        op.paymaster_data = Some(self.data);
    }
}
