//! The owner signer capability.
//!
//! [`OwnerSigner`] is the only key-holding seam of the crate: it discloses
//! the owner address and signs either a plain message (EIP-191) or an
//! EIP-712 payload. Both signing operations return raw 65-byte signatures.

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use serde_json::Value;

/// A signing operation was refused or failed.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SignerError {
    message: String,
}

impl SignerError {
    /// Creates an error with a human-readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<alloy_signer::Error> for SignerError {
    fn from(e: alloy_signer::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// An EIP-712 payload ready to sign.
///
/// Carries the JSON message alongside the precomputed signing hash so that
/// signers which display or forward the payload do not have to re-derive it.
#[derive(Debug, Clone)]
pub struct TypedData {
    /// Domain separator fields.
    pub domain: Eip712Domain,
    /// Name of the primary struct type.
    pub primary_type: &'static str,
    /// Message fields as JSON.
    pub message: Value,
    /// `keccak256("\x19\x01" ‖ domainSeparator ‖ structHash)`.
    pub signing_hash: B256,
}

impl TypedData {
    /// Builds the payload for a Solidity struct.
    #[must_use]
    pub fn new<T: SolStruct>(value: &T, domain: Eip712Domain, message: Value) -> Self {
        Self {
            signing_hash: value.eip712_signing_hash(&domain),
            domain,
            primary_type: T::NAME,
            message,
        }
    }
}

/// Signs on behalf of the smart account owner.
pub trait OwnerSigner: Send + Sync {
    /// Owner address.
    ///
    /// # Errors
    ///
    /// When the signer refuses to disclose it.
    fn address(&self) -> impl Future<Output = Result<Address, SignerError>> + Send;

    /// Signs `message` with the EIP-191 personal-message prefix.
    fn sign_message(&self, message: &[u8]) -> impl Future<Output = Result<Bytes, SignerError>> + Send;

    /// Signs an EIP-712 payload.
    fn sign_typed_data(
        &self,
        typed_data: &TypedData,
    ) -> impl Future<Output = Result<Bytes, SignerError>> + Send;
}

impl OwnerSigner for PrivateKeySigner {
    async fn address(&self) -> Result<Address, SignerError> {
        Ok(Self::address(self))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, SignerError> {
        let signature = alloy_signer::Signer::sign_message(self, message).await?;
        Ok(signature.as_bytes().into())
    }

    async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Bytes, SignerError> {
        let signature = alloy_signer::Signer::sign_hash(self, &typed_data.signing_hash).await?;
        Ok(signature.as_bytes().into())
    }
}

impl<T: OwnerSigner> OwnerSigner for Arc<T> {
    async fn address(&self) -> Result<Address, SignerError> {
        (**self).address().await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, SignerError> {
        (**self).sign_message(message).await
    }

    async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Bytes, SignerError> {
        (**self).sign_typed_data(typed_data).await
    }
}
