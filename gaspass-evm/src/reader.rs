//! Read-only chain access used by the provisioner and the submitter.
//!
//! Nothing read here is cached: permit nonces and deployment status can
//! change between two operations, so every call goes to the chain.

use alloy_primitives::{Address, B256, Bytes, U256, aliases::U192};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use url::Url;

use crate::contract::{IERC20Permit, IEntryPoint, IKernelFactory};
use crate::networks::ENTRY_POINT_V07;

/// A chain read failed.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// A contract call reverted or could not be decoded.
    #[error("{context}: {source}")]
    Contract {
        /// Which read failed.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: alloy_contract::Error,
    },
    /// The endpoint could not be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ReadError {
    fn contract(context: &'static str) -> impl FnOnce(alloy_contract::Error) -> Self {
        move |source| Self::Contract { context, source }
    }
}

/// EIP-2612 domain fields read from a token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDomain {
    /// `name()`.
    pub name: String,
    /// `version()`.
    pub version: String,
}

/// Chain reads needed by the gasless pipeline.
#[cfg_attr(target_family = "wasm", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_family = "wasm"), async_trait::async_trait)]
pub trait ChainReader: Send + Sync + std::fmt::Debug {
    /// Deployed bytecode at `address`; empty when nothing is deployed.
    async fn code(&self, address: Address) -> Result<Bytes, ReadError>;

    /// Address the factory deploys an account initialized with `init_data`
    /// and `salt` to.
    async fn counterfactual_address(
        &self,
        factory: Address,
        init_data: Bytes,
        salt: B256,
    ) -> Result<Address, ReadError>;

    /// Next user operation nonce of `sender` at the v0.7 entry point.
    async fn account_nonce(&self, sender: Address) -> Result<U256, ReadError>;

    /// The token's EIP-712 domain name and version.
    async fn token_domain(&self, token: Address) -> Result<TokenDomain, ReadError>;

    /// The token's current EIP-2612 nonce for `owner`.
    async fn permit_nonce(&self, token: Address, owner: Address) -> Result<U256, ReadError>;

    /// Token balance of `owner`.
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ReadError>;
}

/// [`ChainReader`] over an HTTP JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct AlloyChainReader {
    provider: RootProvider,
}

impl AlloyChainReader {
    /// Connects to `url`. No request is sent until the first read.
    #[must_use]
    pub fn new(url: Url) -> Self {
        let client = RpcClient::new(Http::new(url), false);
        Self {
            provider: ProviderBuilder::default().connect_client(client),
        }
    }

    /// Underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &RootProvider {
        &self.provider
    }
}

#[cfg_attr(target_family = "wasm", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_family = "wasm"), async_trait::async_trait)]
impl ChainReader for AlloyChainReader {
    async fn code(&self, address: Address) -> Result<Bytes, ReadError> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn counterfactual_address(
        &self,
        factory: Address,
        init_data: Bytes,
        salt: B256,
    ) -> Result<Address, ReadError> {
        IKernelFactory::new(factory, &self.provider)
            .getAddress(init_data, salt)
            .call()
            .await
            .map_err(ReadError::contract("factory getAddress"))
    }

    async fn account_nonce(&self, sender: Address) -> Result<U256, ReadError> {
        IEntryPoint::new(ENTRY_POINT_V07, &self.provider)
            .getNonce(sender, U192::ZERO)
            .call()
            .await
            .map_err(ReadError::contract("entry point getNonce"))
    }

    async fn token_domain(&self, token: Address) -> Result<TokenDomain, ReadError> {
        let contract = IERC20Permit::new(token, &self.provider);
        let name_call = contract.name();
        let version_call = contract.version();
        let (name, version) = tokio::try_join!(
            async { name_call.call().await.map_err(ReadError::contract("token name")) },
            async {
                version_call
                    .call()
                    .await
                    .map_err(ReadError::contract("token version"))
            },
        )?;
        Ok(TokenDomain { name, version })
    }

    async fn permit_nonce(&self, token: Address, owner: Address) -> Result<U256, ReadError> {
        IERC20Permit::new(token, &self.provider)
            .nonces(owner)
            .call()
            .await
            .map_err(ReadError::contract("token nonces"))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ReadError> {
        IERC20Permit::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(ReadError::contract("token balanceOf"))
    }
}
