//! ERC-4337 bundler client.
//!
//! Speaks the standard `eth_*UserOperation*` JSON-RPC methods against the
//! v0.7 entry point. [`wait_for_receipt`] polls until the operation is
//! mined or a fixed number of attempts is exhausted.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use alloy_rpc_client::RpcClient;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use url::Url;

use crate::networks::ENTRY_POINT_V07;
use crate::user_operation::{GasEstimate, UserOperation, UserOperationReceipt};

const ESTIMATE_GAS: &str = "eth_estimateUserOperationGas";
const SEND: &str = "eth_sendUserOperation";
const GET_RECEIPT: &str = "eth_getUserOperationReceipt";

/// A bundler call failed.
#[derive(Debug, thiserror::Error)]
pub enum BundlerError {
    /// The bundler answered with a JSON-RPC error.
    #[error("{method} rejected with code {code}: {message}")]
    Rpc {
        /// Bundler method.
        method: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// Bundler-provided reason.
        message: String,
    },
    /// The bundler could not be reached or answered garbage.
    #[error("{method} failed: {source}")]
    Transport {
        /// Bundler method.
        method: &'static str,
        /// Underlying error.
        #[source]
        source: TransportError,
    },
    /// The operation was not mined within the polling budget.
    #[error("no receipt for user operation {hash} after {attempts} attempts")]
    ReceiptTimeout {
        /// Operation hash.
        hash: B256,
        /// Polls made.
        attempts: u32,
    },
}

impl BundlerError {
    fn from_transport(method: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| match source.as_error_resp() {
            Some(payload) => Self::Rpc {
                method,
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => Self::Transport { method, source },
        }
    }
}

/// An ERC-4337 bundler bound to one chain.
#[cfg_attr(target_family = "wasm", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_family = "wasm"), async_trait::async_trait)]
pub trait Bundler: Send + Sync + std::fmt::Debug {
    /// Gas limits for `op`, which must carry a signature of realistic shape.
    async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
    ) -> Result<GasEstimate, BundlerError>;

    /// Submits a signed operation and returns its hash.
    async fn send_user_operation(&self, op: &UserOperation) -> Result<B256, BundlerError>;

    /// Receipt of a mined operation; `None` while it is pending.
    async fn user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, BundlerError>;
}

/// [`Bundler`] over HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct HttpBundler {
    client: RpcClient,
    entry_point: Address,
}

impl HttpBundler {
    /// Creates a client for the v0.7 entry point.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            client: RpcClient::new(Http::new(url), false),
            entry_point: ENTRY_POINT_V07,
        }
    }
}

#[cfg_attr(target_family = "wasm", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_family = "wasm"), async_trait::async_trait)]
impl Bundler for HttpBundler {
    async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
    ) -> Result<GasEstimate, BundlerError> {
        self.client
            .request(ESTIMATE_GAS, (op.clone(), self.entry_point))
            .await
            .map_err(BundlerError::from_transport(ESTIMATE_GAS))
    }

    async fn send_user_operation(&self, op: &UserOperation) -> Result<B256, BundlerError> {
        self.client
            .request(SEND, (op.clone(), self.entry_point))
            .await
            .map_err(BundlerError::from_transport(SEND))
    }

    async fn user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, BundlerError> {
        self.client
            .request(GET_RECEIPT, (hash,))
            .await
            .map_err(BundlerError::from_transport(GET_RECEIPT))
    }
}

/// How long to wait for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    /// Delay between polls.
    pub interval: Duration,
    /// Polls before giving up.
    pub attempts: u32,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            attempts: 60,
        }
    }
}

/// Polls the bundler until `hash` is mined.
///
/// # Errors
///
/// [`BundlerError::ReceiptTimeout`] when no receipt arrives within
/// `polling.attempts` polls, or the first bundler error.
#[tracing::instrument(skip_all, fields(user_op_hash = %hash))]
pub async fn wait_for_receipt(
    bundler: &dyn Bundler,
    hash: B256,
    polling: ReceiptPolling,
) -> Result<UserOperationReceipt, BundlerError> {
    for attempt in 1..=polling.attempts {
        if let Some(receipt) = bundler.user_operation_receipt(hash).await? {
            tracing::debug!(attempt, "User operation mined");
            return Ok(receipt);
        }
        if attempt < polling.attempts {
            tokio::time::sleep(polling.interval).await;
        }
    }
    Err(BundlerError::ReceiptTimeout {
        hash,
        attempts: polling.attempts,
    })
}
