//! Inbound peer request routing.
//!
//! Each request that arrives on an active session is classified by method
//! name into exactly one [`MethodClass`] and answered exactly once:
//!
//! - **Read-only** methods are proxied verbatim through a [`ChainQuery`].
//! - **`eth_sendTransaction`** goes to a [`TransferExecutor`]; the peer gets
//!   the transaction hash.
//! - **Signing** and unknown methods get an explicit `-32601` error.
//!
//! Requests for a topic that is not an active session are dropped without a
//! response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::LazyLock;

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jsonrpc::{JsonRpcError, JsonRpcResponse};
use crate::namespace::EVM_METHODS;
use crate::session::{Session, SessionRequest};

/// The value-transfer method.
pub const SEND_TRANSACTION: &str = "eth_sendTransaction";

const MESSAGE_SIGNING_METHODS: &[&str] = &["eth_sign", "personal_sign"];
const TYPED_DATA_SIGNING_METHODS: &[&str] = &["eth_signTypedData", "eth_signTypedData_v4"];

/// Why a method is answered with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unsupported {
    /// `eth_sign`, `personal_sign`.
    MessageSigning,
    /// `eth_signTypedData`, `eth_signTypedData_v4`.
    TypedDataSigning,
    /// Anything not in the table.
    UnknownMethod,
}

impl Unsupported {
    /// The error message sent to the peer.
    #[must_use]
    pub fn message(self, method: &str) -> String {
        match self {
            Self::MessageSigning => "Method not implemented: Signing not yet supported".to_owned(),
            Self::TypedDataSigning => {
                "Method not implemented: EIP-712 signing not yet supported".to_owned()
            }
            Self::UnknownMethod => format!("Method not found: {method}"),
        }
    }
}

/// Dispatch bucket for a method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodClass {
    /// Proxied to the chain RPC endpoint.
    ReadOnly,
    /// Executed through the gasless pipeline.
    ValueTransfer,
    /// Answered with an error.
    Unsupported(Unsupported),
}

static METHOD_TABLE: LazyLock<HashMap<&'static str, MethodClass>> = LazyLock::new(|| {
    let mut table: HashMap<&'static str, MethodClass> = EVM_METHODS
        .iter()
        .map(|m| (*m, MethodClass::ReadOnly))
        .collect();
    table.insert(SEND_TRANSACTION, MethodClass::ValueTransfer);
    for &m in MESSAGE_SIGNING_METHODS {
        table.insert(m, MethodClass::Unsupported(Unsupported::MessageSigning));
    }
    for &m in TYPED_DATA_SIGNING_METHODS {
        table.insert(m, MethodClass::Unsupported(Unsupported::TypedDataSigning));
    }
    table
});

/// Classifies a method name.
#[must_use]
pub fn classify(method: &str) -> MethodClass {
    METHOD_TABLE
        .get(method)
        .copied()
        .unwrap_or(MethodClass::Unsupported(Unsupported::UnknownMethod))
}

/// Read-only access to a chain's JSON-RPC endpoint.
pub trait ChainQuery: Send + Sync + 'static {
    /// Error type for failed calls.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issues `method` with `params` and returns the raw `result`.
    fn call(
        &self,
        method: &str,
        params: &Value,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;
}

/// Executes a single value transfer on the peer's behalf.
pub trait TransferExecutor: Send + Sync + 'static {
    /// Error type for failed transfers.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submits the transfer and waits until it is mined.
    fn execute(
        &self,
        transfer: TransferRequest,
    ) -> impl Future<Output = Result<TransactionResult, Self::Error>> + Send;
}

/// A single call requested through `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Call target.
    pub to: Address,
    /// Native value, in wei.
    pub value: U256,
    /// Call data.
    pub data: Bytes,
}

#[derive(Deserialize)]
struct RawTransaction {
    to: Address,
    #[serde(default)]
    value: Option<U256>,
    #[serde(default)]
    data: Option<Bytes>,
    #[serde(default)]
    input: Option<Bytes>,
}

/// The `eth_sendTransaction` parameters could not be read.
#[derive(Debug, thiserror::Error)]
pub enum InvalidTransferParams {
    /// `params` is not a non-empty array.
    #[error("expected a transaction object as the first parameter")]
    MissingTransaction,
    /// The transaction object is malformed.
    #[error(transparent)]
    Malformed(#[from] serde_json::Error),
}

impl TransferRequest {
    /// Reads the transaction object in `params[0]`. `to` is required;
    /// `value` defaults to zero and `data` (or `input`) to empty.
    ///
    /// # Errors
    ///
    /// [`InvalidTransferParams`] when the object is missing or malformed.
    pub fn from_params(params: &Value) -> Result<Self, InvalidTransferParams> {
        let tx = params
            .as_array()
            .and_then(|p| p.first())
            .ok_or(InvalidTransferParams::MissingTransaction)?;
        let raw = RawTransaction::deserialize(tx)?;
        Ok(Self {
            to: raw.to,
            value: raw.value.unwrap_or_default(),
            data: raw.data.or(raw.input).unwrap_or_default(),
        })
    }
}

/// Hashes identifying a mined sponsored operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    /// Hash of the user operation.
    pub user_operation_hash: B256,
    /// Hash of the bundle transaction that included it.
    pub transaction_hash: B256,
}

/// What the router decided for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The topic is not an active session; send nothing.
    Dropped,
    /// Send this response.
    Respond(JsonRpcResponse),
}

/// Dispatches peer requests to a [`ChainQuery`] or a [`TransferExecutor`].
#[derive(Debug)]
pub struct RequestRouter<Q, X> {
    query: Q,
    executor: X,
}

impl<Q: ChainQuery, X: TransferExecutor> RequestRouter<Q, X> {
    /// Creates a router.
    #[must_use]
    pub const fn new(query: Q, executor: X) -> Self {
        Self { query, executor }
    }

    /// The chain query backend.
    #[must_use]
    pub const fn query(&self) -> &Q {
        &self.query
    }

    /// The transfer backend.
    #[must_use]
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// Routes `request` if its topic is among `active`.
    pub async fn route(&self, request: &SessionRequest, active: &[Session]) -> RouteOutcome {
        if !active.iter().any(|s| s.topic == request.topic) {
            tracing::warn!(
                topic = %request.topic,
                method = %request.method,
                request_id = request.id,
                "Dropping request for inactive session"
            );
            return RouteOutcome::Dropped;
        }
        RouteOutcome::Respond(self.dispatch(request).await)
    }

    /// Answers a request that already passed the session check.
    #[tracing::instrument(skip_all, fields(method = %request.method, request_id = request.id))]
    pub async fn dispatch(&self, request: &SessionRequest) -> JsonRpcResponse {
        let id = request.id;
        match classify(&request.method) {
            MethodClass::ReadOnly => match self.query.call(&request.method, &request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => {
                    tracing::error!(error = %e, "Chain query failed");
                    JsonRpcResponse::failure(id, JsonRpcError::internal(format!("Internal error: {e}")))
                }
            },
            MethodClass::ValueTransfer => {
                let transfer = match TransferRequest::from_params(&request.params) {
                    Ok(transfer) => transfer,
                    Err(e) => {
                        tracing::warn!(error = %e, "Rejecting malformed transaction");
                        return JsonRpcResponse::failure(
                            id,
                            JsonRpcError::invalid_params(format!("Invalid params: {e}")),
                        );
                    }
                };
                tracing::info!(to = %transfer.to, value = %transfer.value, "Executing sponsored transfer");
                match self.executor.execute(transfer).await {
                    Ok(result) => {
                        tracing::info!(
                            user_op_hash = %result.user_operation_hash,
                            tx_hash = %result.transaction_hash,
                            "Transfer mined"
                        );
                        JsonRpcResponse::success(id, Value::String(result.transaction_hash.to_string()))
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Transfer failed");
                        JsonRpcResponse::failure(
                            id,
                            JsonRpcError::internal(format!("Transaction failed: {e}")),
                        )
                    }
                }
            }
            MethodClass::Unsupported(kind) => {
                tracing::debug!(?kind, "Unsupported method");
                JsonRpcResponse::failure(id, JsonRpcError::method_not_found(kind.message(&request.method)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExecutor, FakeQuery, session};
    use alloy_primitives::address;
    use serde_json::json;

    fn request(topic: &str, method: &str, params: Value) -> SessionRequest {
        SessionRequest {
            id: 42,
            topic: topic.to_owned(),
            chain_id: Some("eip155:84532".to_owned()),
            method: method.to_owned(),
            params,
        }
    }

    fn router(result: Option<Value>, failure: Option<&str>) -> RequestRouter<FakeQuery, FakeExecutor> {
        RequestRouter::new(
            FakeQuery {
                result,
                ..FakeQuery::default()
            },
            FakeExecutor {
                failure: failure.map(str::to_owned),
                ..FakeExecutor::default()
            },
        )
    }

    #[test]
    fn test_classification_table() {
        let read_only = EVM_METHODS
            .iter()
            .filter(|m| classify(m) == MethodClass::ReadOnly)
            .count();
        assert_eq!(read_only, 36);
        assert_eq!(classify("eth_sendTransaction"), MethodClass::ValueTransfer);
        assert_eq!(
            classify("personal_sign"),
            MethodClass::Unsupported(Unsupported::MessageSigning)
        );
        assert_eq!(
            classify("eth_signTypedData_v4"),
            MethodClass::Unsupported(Unsupported::TypedDataSigning)
        );
        assert_eq!(
            classify("wallet_switchEthereumChain"),
            MethodClass::Unsupported(Unsupported::UnknownMethod)
        );
    }

    #[tokio::test]
    async fn test_inactive_topic_is_dropped() {
        let router = router(Some(json!("0x1")), None);
        let outcome = router
            .route(&request("gone", "eth_chainId", json!([])), &[session("live", u64::MAX)])
            .await;
        assert_eq!(outcome, RouteOutcome::Dropped);
        assert!(router.query().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_is_proxied_verbatim() {
        let router = router(Some(json!({ "number": "0x10" })), None);
        let params = json!(["0x10", false]);
        let outcome = router
            .route(
                &request("live", "eth_getBlockByNumber", params.clone()),
                &[session("live", u64::MAX)],
            )
            .await;

        let RouteOutcome::Respond(response) = outcome else {
            panic!("expected a response");
        };
        assert_eq!(response.id, 42);
        assert_eq!(response.result, Some(json!({ "number": "0x10" })));
        assert_eq!(
            *router.query().calls.lock().unwrap(),
            vec![("eth_getBlockByNumber".to_owned(), params)]
        );
    }

    #[tokio::test]
    async fn test_read_only_failure_is_internal_error() {
        let router = router(None, None);
        let response = router.dispatch(&request("t", "eth_blockNumber", json!([]))).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INTERNAL_ERROR);
        assert_eq!(error.message, "Internal error: upstream unavailable");
    }

    #[tokio::test]
    async fn test_transfer_success_returns_bare_hash() {
        let router = router(None, None);
        let to = address!("1111111111111111111111111111111111111111");
        let params = json!([{ "from": "0x0000000000000000000000000000000000000000", "to": to, "value": "0x2386f26fc10000" }]);
        let response = router.dispatch(&request("t", "eth_sendTransaction", params)).await;

        assert_eq!(
            response.result,
            Some(Value::String(FakeExecutor::TX_HASH.to_string()))
        );
        let calls = router.executor().calls.lock().unwrap();
        assert_eq!(calls[0].to, to);
        assert_eq!(calls[0].value, U256::from(10_000_000_000_000_000_u64));
        assert!(calls[0].data.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_failure_embeds_reason() {
        let router = router(None, Some("paymaster rejected operation"));
        let params = json!([{ "to": "0x1111111111111111111111111111111111111111" }]);
        let response = router.dispatch(&request("t", "eth_sendTransaction", params)).await;

        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INTERNAL_ERROR);
        assert!(error.message.contains("paymaster rejected operation"));
        assert!(response.result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_transfer_is_invalid_params() {
        let router = router(None, None);
        let response = router
            .dispatch(&request("t", "eth_sendTransaction", json!([{ "value": "0x1" }])))
            .await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
        assert!(router.executor().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_methods_get_explicit_errors() {
        let router = router(None, None);

        let sign = router.dispatch(&request("t", "personal_sign", json!([]))).await;
        assert_eq!(
            sign.error.unwrap(),
            JsonRpcError::method_not_found("Method not implemented: Signing not yet supported")
        );

        let typed = router.dispatch(&request("t", "eth_signTypedData", json!([]))).await;
        assert_eq!(
            typed.error.unwrap().message,
            "Method not implemented: EIP-712 signing not yet supported"
        );

        let unknown = router.dispatch(&request("t", "wallet_addEthereumChain", json!([]))).await;
        assert_eq!(
            unknown.error.unwrap().message,
            "Method not found: wallet_addEthereumChain"
        );
    }
}
