//! Smart account provisioning.
//!
//! The smart account is a Kernel v3.1 account whose root validator is the
//! ECDSA validator owned by the signer. Its CREATE2 address depends only
//! on the initializer calldata and a salt, so it is known before
//! deployment; the first user operation carries the factory call that
//! deploys it.
//!
//! Kernel answers ERC-1271 checks, which the USDC permit relies on since
//! the permit owner is the account itself. It expects the owner to sign the
//! original hash inside a `Kernel(bytes32 hash)` EIP-712 envelope bound to
//! the account, prefixed with the validation mode byte.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256, address};
use alloy_sol_types::{Eip712Domain, SolCall, eip712_domain};
use gaspass::chain::ChainId;
use serde_json::json;

use crate::contract::{IFactoryStaker, IKernel, Kernel};
use crate::networks::{self, ENTRY_POINT_V07};
use crate::reader::{ChainReader, ReadError};
use crate::signature::wrap_erc6492;
use crate::signer::{OwnerSigner, SignerError, TypedData};
use crate::user_operation::UserOperation;

/// Validation type byte selecting the account's root validator.
pub const VALIDATION_MODE_ROOT: u8 = 0x00;

/// Validation type byte of a module validator in a validation id.
pub const VALIDATION_TYPE_VALIDATOR: u8 = 0x01;

/// Execution mode of a single call with default settings.
pub const EXEC_MODE_SINGLE: B256 = B256::ZERO;

/// EIP-712 domain name of Kernel's ERC-1271 envelope.
pub const KERNEL_DOMAIN_NAME: &str = "Kernel";

/// EIP-712 domain version of Kernel v3.1.
pub const KERNEL_DOMAIN_VERSION: &str = "0.3.1";

/// The contracts and salt that determine account addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFactory {
    /// Staked factory front named in user operations and EIP-6492
    /// envelopes.
    pub deployer: Address,
    /// Kernel factory deriving the CREATE2 address.
    pub address: Address,
    /// ECDSA validator installed as root validator.
    pub validator: Address,
    /// CREATE2 salt.
    pub salt: B256,
}

impl AccountFactory {
    /// Kernel v3.1 with the ECDSA validator, salt zero.
    pub const KERNEL_V3_1: Self = Self {
        deployer: address!("d703aaE79538628d27099B8c4f621bE4CCd142d5"),
        address: address!("aac5D4240AF87249B3f71BC8E4A2cae074A3E419"),
        validator: address!("845ADb2C711129d4f3966735eD98a9F09fC4cE57"),
        salt: B256::ZERO,
    };

    /// Root validation id: type byte followed by the validator address.
    #[must_use]
    pub fn root_validator(&self) -> FixedBytes<21> {
        let mut id = [0u8; 21];
        id[0] = VALIDATION_TYPE_VALIDATOR;
        id[1..].copy_from_slice(self.validator.as_slice());
        FixedBytes(id)
    }

    /// `initialize` calldata installing `owner` on the root validator.
    #[must_use]
    pub fn initializer(&self, owner: Address) -> Bytes {
        IKernel::initializeCall {
            rootValidator: self.root_validator(),
            hook: Address::ZERO,
            validatorData: Bytes::copy_from_slice(owner.as_slice()),
            hookData: Bytes::new(),
            initConfig: Vec::new(),
        }
        .abi_encode()
        .into()
    }

    /// Calldata for [`Self::deployer`] deploying the account for `owner`.
    #[must_use]
    pub fn factory_data(&self, owner: Address) -> Bytes {
        IFactoryStaker::deployWithFactoryCall {
            factory: self.address,
            createData: self.initializer(owner),
            salt: self.salt,
        }
        .abi_encode()
        .into()
    }
}

impl Default for AccountFactory {
    fn default() -> Self {
        Self::KERNEL_V3_1
    }
}

/// A smart account could not be provisioned.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The chain is not in the table for the requested network type.
    #[error("chain {chain_id} is not supported (testnet: {testnet})")]
    UnsupportedChain {
        /// Requested chain.
        chain_id: ChainId,
        /// Requested network type.
        testnet: bool,
    },
    /// The signer refused to disclose its address.
    #[error("owner signer unavailable: {0}")]
    Signer(#[from] SignerError),
    /// The chain endpoint did not answer the address derivation call.
    #[error("chain {chain_id} unreachable: {source}")]
    Unreachable {
        /// Requested chain.
        chain_id: ChainId,
        /// Underlying error.
        #[source]
        source: ReadError,
    },
}

/// Derives [`SmartAccountHandle`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartAccountProvisioner {
    factory: AccountFactory,
}

impl SmartAccountProvisioner {
    /// Creates a provisioner for `factory`.
    #[must_use]
    pub const fn new(factory: AccountFactory) -> Self {
        Self { factory }
    }

    /// The factory in use.
    #[must_use]
    pub const fn factory(&self) -> AccountFactory {
        self.factory
    }

    /// Derives the handle for `signer` on `chain_id`.
    ///
    /// Makes exactly one read-only call, asking the factory for the
    /// counterfactual address; repeated calls with the same inputs return
    /// the same address.
    ///
    /// # Errors
    ///
    /// [`ProvisioningError`] when the chain is unknown, the signer withholds
    /// its address, or the chain endpoint fails.
    #[tracing::instrument(skip_all, err, fields(chain_id = chain_id, testnet = is_testnet))]
    pub async fn provision<S: OwnerSigner>(
        &self,
        signer: S,
        reader: &dyn ChainReader,
        chain_id: ChainId,
        is_testnet: bool,
    ) -> Result<SmartAccountHandle<S>, ProvisioningError> {
        if !networks::is_supported(chain_id, is_testnet) {
            return Err(ProvisioningError::UnsupportedChain {
                chain_id,
                testnet: is_testnet,
            });
        }
        let owner = signer.address().await?;
        let init_data = self.factory.initializer(owner);
        let address = reader
            .counterfactual_address(self.factory.address, init_data, self.factory.salt)
            .await
            .map_err(|source| ProvisioningError::Unreachable { chain_id, source })?;
        tracing::debug!(%owner, account = %address, "Smart account derived");
        Ok(SmartAccountHandle {
            signer,
            owner,
            address,
            chain_id,
            is_testnet,
            factory: self.factory,
        })
    }
}

/// A smart account on one chain, with the owner signer that controls it.
///
/// Fields are fixed at provisioning; switching chain or network type means
/// provisioning a new handle.
#[derive(Debug)]
pub struct SmartAccountHandle<S> {
    signer: S,
    owner: Address,
    address: Address,
    chain_id: ChainId,
    is_testnet: bool,
    factory: AccountFactory,
}

impl<S: OwnerSigner> SmartAccountHandle<S> {
    /// Account address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Owner address.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Chain the handle is bound to.
    #[must_use]
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Whether the chain is a testnet.
    #[must_use]
    pub const fn is_testnet(&self) -> bool {
        self.is_testnet
    }

    /// Whether the account has code on chain.
    ///
    /// # Errors
    ///
    /// The reader's error.
    pub async fn is_deployed(&self, reader: &dyn ChainReader) -> Result<bool, ReadError> {
        Ok(!reader.code(self.address).await?.is_empty())
    }

    /// Factory and calldata to put in a user operation that deploys the
    /// account.
    #[must_use]
    pub fn deployment(&self) -> (Address, Bytes) {
        (self.factory.deployer, self.factory.factory_data(self.owner))
    }

    /// Account calldata executing a single call.
    #[must_use]
    pub fn encode_execute(&self, to: Address, value: U256, data: Bytes) -> Bytes {
        let execution = [to.as_slice(), &value.to_be_bytes::<32>()[..], &data[..]].concat();
        IKernel::executeCall {
            execMode: EXEC_MODE_SINGLE,
            executionCalldata: execution.into(),
        }
        .abi_encode()
        .into()
    }

    /// The account's own EIP-712 domain.
    #[must_use]
    pub fn domain(&self) -> Eip712Domain {
        eip712_domain! {
            name: KERNEL_DOMAIN_NAME,
            version: KERNEL_DOMAIN_VERSION,
            chain_id: self.chain_id,
            verifying_contract: self.address,
        }
    }

    /// `typed_data` rebound to this account, as its ERC-1271 check
    /// recomputes it.
    #[must_use]
    pub fn replay_safe(&self, typed_data: &TypedData) -> TypedData {
        let hash = typed_data.signing_hash;
        TypedData::new(&Kernel { hash }, self.domain(), json!({ "hash": hash }))
    }

    /// Signs typed data as the account: the owner signs the replay-safe
    /// envelope and the result carries the root validation mode byte.
    /// Signatures of an undeployed account come EIP-6492 wrapped.
    ///
    /// # Errors
    ///
    /// The signer's error.
    pub async fn sign_typed_data(
        &self,
        typed_data: &TypedData,
        deployed: bool,
    ) -> Result<Bytes, SignerError> {
        let owner_signature = self
            .signer
            .sign_typed_data(&self.replay_safe(typed_data))
            .await?;
        let signature: Bytes = [&[VALIDATION_MODE_ROOT][..], &owner_signature[..]]
            .concat()
            .into();
        if deployed {
            return Ok(signature);
        }
        let (factory, factory_data) = self.deployment();
        Ok(wrap_erc6492(factory, factory_data, signature))
    }

    /// Signs `op` for the v0.7 entry point on this handle's chain. Nonce
    /// key zero routes validation to the root validator, which takes the
    /// owner's personal signature as is.
    ///
    /// # Errors
    ///
    /// The signer's error.
    pub async fn sign_user_operation(&self, op: &UserOperation) -> Result<Bytes, SignerError> {
        let hash = op.hash(ENTRY_POINT_V07, self.chain_id);
        self.signer.sign_message(hash.as_slice()).await
    }
}
