//! EIP-6492 signature envelopes.
//!
//! A smart account that is not deployed yet cannot answer ERC-1271 checks,
//! so its signatures are wrapped as
//! `abi.encode(factory, factoryCalldata, innerSig) ‖ magicSuffix`. The
//! paymaster validates the permit after deployment, so the packer always
//! strips the envelope again.
//!
//! Reference: <https://eips.ethereum.org/EIPS/eip-6492>

use alloy_primitives::{Address, Bytes, hex};
use alloy_sol_types::SolType;

use crate::contract::Sig6492;

/// The fixed 32-byte magic suffix defined by EIP-6492.
pub const EIP6492_MAGIC_SUFFIX: [u8; 32] =
    hex!("6492649264926492649264926492649264926492649264926492649264926492");

/// Errors from reading a signature envelope.
#[derive(Debug, thiserror::Error)]
pub enum SignatureFormatError {
    /// The EIP-6492 wrapper could not be decoded.
    #[error("invalid EIP-6492 signature: {0}")]
    InvalidEip6492(#[source] alloy_sol_types::Error),
}

/// Whether `signature` ends with the EIP-6492 magic suffix.
#[must_use]
pub fn is_erc6492(signature: &[u8]) -> bool {
    signature.len() >= 32 && signature[signature.len() - 32..] == EIP6492_MAGIC_SUFFIX
}

/// Wraps `inner` so it verifies against an undeployed account.
#[must_use]
pub fn wrap_erc6492(factory: Address, factory_calldata: Bytes, inner: Bytes) -> Bytes {
    let body = Sig6492::abi_encode_params(&Sig6492 {
        factory,
        factoryCalldata: factory_calldata,
        innerSig: inner,
    });
    let mut out = Vec::with_capacity(body.len() + 32);
    out.extend_from_slice(&body);
    out.extend_from_slice(&EIP6492_MAGIC_SUFFIX);
    out.into()
}

/// Returns the inner signature of an EIP-6492 envelope, or `signature`
/// unchanged when it carries none.
///
/// # Errors
///
/// [`SignatureFormatError::InvalidEip6492`] when the suffix is present but
/// the body does not decode.
pub fn unwrap_signature(signature: Bytes) -> Result<Bytes, SignatureFormatError> {
    if !is_erc6492(&signature) {
        return Ok(signature);
    }
    let body = &signature[..signature.len() - 32];
    let decoded =
        Sig6492::abi_decode_params(body).map_err(SignatureFormatError::InvalidEip6492)?;
    Ok(decoded.innerSig)
}
